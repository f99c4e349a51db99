//! Exactly-once observation of an admitted request.

use crate::UsageReporter;
use std::{fmt, sync::Arc};
use tokio::time::Instant;
use tollgate_metrics::catalogue;
use tollgate_pricing::Pricer;
use tracing::debug;

/// Records the observation of an admitted request when finished or dropped.
///
/// Travels with the request from admission into the response body, so the
/// observation happens on whichever comes first: the body ending, the body
/// failing, a deadline, a handler error, a panic unwinding through it, or the
/// client going away.
pub(crate) struct ObservationGuard {
    pending: Option<Pending>,
}

struct Pending {
    pricer: Arc<dyn Pricer>,
    resource: Arc<str>,
    started: Instant,
    usage: UsageReporter,
    header_usage: Option<u64>,
}

impl ObservationGuard {
    pub(crate) fn new(pricer: Arc<dyn Pricer>, resource: Arc<str>, usage: UsageReporter) -> Self {
        Self {
            pending: Some(Pending {
                pricer,
                resource,
                started: Instant::now(),
                usage,
                header_usage: None,
            }),
        }
    }

    /// Usage taken from the response header, used if the reporter stays silent.
    pub(crate) fn set_header_usage(&mut self, usage: u64) {
        if let Some(pending) = &mut self.pending {
            pending.header_usage = Some(usage);
        }
    }

    /// Record now. Later calls and the eventual drop do nothing.
    pub(crate) fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.record();
        }
    }
}

impl Pending {
    fn record(self) {
        let elapsed = self.started.elapsed();
        let usage = self.usage.get().or(self.header_usage).unwrap_or(0);

        self.pricer.record(&self.resource, elapsed, usage);

        catalogue::admission::observe_duration(&self.resource, elapsed.as_secs_f64());
        if usage > 0 {
            catalogue::admission::observe_usage(&self.resource, usage);
        }
        debug!(
            resource = %self.resource,
            elapsed_ms = elapsed.as_millis() as u64,
            usage,
            "request observed"
        );
    }
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for ObservationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservationGuard")
            .field("resource", &self.pending.as_ref().map(|p| &p.resource))
            .field("finished", &self.pending.is_none())
            .finish()
    }
}
