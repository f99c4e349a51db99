//! Background refill of a wallet.

use crate::Wallet;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use std::{sync::Arc, time::Duration};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, trace, warn};

/// Shortest wait between two credits.
const MIN_DELAY: Duration = Duration::from_millis(1);

/// How tokens arrive in a wallet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefillDistribution {
    /// `step` tokens every `period`.
    Fixed { step: u64, period: Duration },
    /// Uniform amount in `[0, 2 * step]` every `period`. Same mean as `Fixed`.
    Uniform { step: u64, period: Duration },
    /// `step` tokens at exponentially distributed intervals with mean `mean_interval`.
    Poisson { step: u64, mean_interval: Duration },
}

/// One scheduled credit: wait `delay`, then add `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub amount: u64,
    pub delay: Duration,
}

impl RefillDistribution {
    /// Draw the next credit.
    pub fn next_credit(&self, rng: &mut dyn RngCore) -> Credit {
        match *self {
            Self::Fixed { step, period } => Credit { amount: step, delay: period.max(MIN_DELAY) },
            Self::Uniform { step, period } => Credit {
                amount: rng.random_range(0..=step.saturating_mul(2)),
                delay: period.max(MIN_DELAY),
            },
            Self::Poisson { step, mean_interval } => {
                // Inverse transform sampling of Exp(1 / mean); U is kept away from 0.
                let u: f64 = rng.random_range(f64::MIN_POSITIVE..1.0);
                let mean_ms = mean_interval.as_secs_f64() * 1_000.0;
                let interval_ms = -u.ln() * mean_ms;
                let delay =
                    Duration::try_from_secs_f64(interval_ms / 1_000.0).unwrap_or(Duration::MAX);
                Credit { amount: step, delay: delay.max(MIN_DELAY) }
            }
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Uniform { .. } => "uniform",
            Self::Poisson { .. } => "poisson",
        }
    }
}

/// Spawns refill tasks.
#[derive(Debug, Clone, Copy)]
pub struct TokenGenerator;

impl TokenGenerator {
    /// Start crediting `wallet` according to `distribution`.
    ///
    /// Must be called from within a tokio runtime. The task stops when the
    /// returned handle is shut down or dropped.
    pub fn spawn(wallet: Arc<Wallet>, distribution: RefillDistribution) -> GeneratorHandle {
        Self::spawn_with_rng(wallet, distribution, StdRng::from_os_rng())
    }

    /// [`spawn`](Self::spawn) with a seeded random source.
    pub fn spawn_with_rng(
        wallet: Arc<Wallet>,
        distribution: RefillDistribution,
        mut rng: StdRng,
    ) -> GeneratorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            debug!(distribution = distribution.name(), "token generator started");
            loop {
                let credit = distribution.next_credit(&mut rng);
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = tokio::time::sleep(credit.delay) => {
                        let balance = wallet.add(credit.amount);
                        trace!(amount = credit.amount, balance, "wallet refilled");
                    }
                }
            }
            debug!("token generator stopped");
        });

        GeneratorHandle { shutdown: shutdown_tx, task }
    }
}

/// Controls a running generator. Dropping it stops the generator.
#[derive(Debug)]
pub struct GeneratorHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl GeneratorHandle {
    /// Stop the generator and wait for its task to finish.
    ///
    /// Returns `false` if the task panicked.
    pub async fn shutdown(self) -> bool {
        let Self { shutdown, task } = self;
        let _ = shutdown.send(());
        match task.await {
            Err(err) if err.is_panic() => {
                warn!(%err, "token generator panicked");
                false
            }
            _ => true,
        }
    }

    /// Whether the generator task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
