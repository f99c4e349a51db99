//! The pricing seam used by admission control.

use crate::constants::MIN_PRICE;
use std::time::Duration;

/// Something that quotes a price per resource and learns from completed requests.
#[auto_impl::auto_impl(&, Arc)]
pub trait Pricer: Send + Sync {
    /// Current price of a resource.
    fn price(&self, resource: &str) -> u64;

    /// Feed back the latency and usage of one admitted request.
    fn record(&self, resource: &str, latency: Duration, cost_units: u64);
}

/// Constant price that ignores observations. Disables dynamic pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPricer {
    price: u64,
}

impl FixedPricer {
    /// Create a pricer quoting `price` for every resource (at least 1).
    pub fn new(price: u64) -> Self {
        Self { price: price.max(MIN_PRICE) }
    }
}

impl Pricer for FixedPricer {
    fn price(&self, _resource: &str) -> u64 {
        self.price
    }

    fn record(&self, _resource: &str, _latency: Duration, _cost_units: u64) {}
}
