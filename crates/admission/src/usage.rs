//! Side channel for reporting usage after a response has started.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Handle a handler uses to report how much work a request consumed.
///
/// Inserted into the request extensions of every admitted request. Clones share
/// the same value, so a streaming body can keep a clone and report once it knows
/// the final count. Only the value present when the response body completes is
/// used.
#[derive(Debug, Clone, Default)]
pub struct UsageReporter {
    inner: Arc<UsageCell>,
}

#[derive(Debug, Default)]
struct UsageCell {
    value: AtomicU64,
    reported: AtomicBool,
}

impl UsageReporter {
    /// Create a reporter with nothing reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total usage, replacing anything reported before.
    pub fn report(&self, total: u64) {
        self.inner.value.store(total, Ordering::Relaxed);
        self.inner.reported.store(true, Ordering::Release);
    }

    /// Add to the usage reported so far.
    pub fn add(&self, delta: u64) {
        self.inner.value.fetch_add(delta, Ordering::Relaxed);
        self.inner.reported.store(true, Ordering::Release);
    }

    /// The reported usage, or `None` if the handler never reported.
    pub fn get(&self) -> Option<u64> {
        if self.inner.reported.load(Ordering::Acquire) {
            Some(self.inner.value.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}
