//! Prometheus recorder installation.

use crate::{PrometheusConfig, catalogue};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use metrics_util::layers::{PrefixLayer, Stack};
use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::debug;

/// Global prometheus recorder
static PROMETHEUS_RECORDER: OnceLock<PrometheusRecorder> = OnceLock::new();

/// Buckets for request durations, in seconds.
const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Buckets for token usage per request.
const USAGE_BUCKETS: &[f64] = &[10.0, 50.0, 100.0, 200.0, 500.0, 1000.0];

/// Install the prometheus recorder as the global metrics recorder.
///
/// Subsequent calls return the recorder installed by the first one.
pub fn install_prometheus_recorder(config: &PrometheusConfig) -> eyre::Result<PrometheusRecorder> {
    if let Some(recorder) = PROMETHEUS_RECORDER.get() {
        return Ok(recorder.clone());
    }

    let recorder = PrometheusRecorder::install(config)?;
    Ok(PROMETHEUS_RECORDER.get_or_init(|| recorder).clone())
}

/// Handle to the prometheus metrics recorder
#[derive(Clone)]
pub struct PrometheusRecorder {
    /// The handle to the prometheus recorder
    handle: PrometheusHandle,
    /// Whether upkeep has been started
    upkeep_started: Arc<AtomicBool>,
}

impl fmt::Debug for PrometheusRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusRecorder")
            .field("upkeep_started", &self.upkeep_started.load(Ordering::Relaxed))
            .finish()
    }
}

impl PrometheusRecorder {
    fn install(config: &PrometheusConfig) -> eyre::Result<Self> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                DURATION_BUCKETS,
            )?
            .set_buckets_for_metric(Matcher::Suffix("token_usage".to_string()), USAGE_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        Stack::new(recorder)
            .push(PrefixLayer::new(config.prefix.clone()))
            .install()
            .map_err(|err| eyre::eyre!("failed to install prometheus recorder: {err}"))?;

        catalogue::describe();
        debug!(prefix = %config.prefix, "prometheus recorder installed");

        Ok(Self { handle, upkeep_started: Arc::new(AtomicBool::new(false)) })
    }

    /// Get the prometheus handle
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Start the upkeep task for the prometheus recorder.
    ///
    /// Only the first call spawns a task. Must be called from within a tokio runtime.
    pub fn spawn_upkeep(&self, interval_secs: u64) {
        if self
            .upkeep_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let handle = self.handle.clone();
        let interval = Duration::from_secs(interval_secs.max(1));
        debug!(?interval, "spawning prometheus upkeep task");
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                handle.run_upkeep();
            }
        });
    }
}
