//! The price controller.

use crate::{
    ConfigError, PriceDirection, PriceSnapshot, PriceUpdate, Pricer, PricingConfig,
    state::PriceState,
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tollgate_metrics::catalogue;
use tracing::{debug, info, trace};

/// Owns the price of every resource key seen so far.
///
/// Keys are created lazily at the initial price and live for the lifetime of
/// the controller. Observations for one key are serialized by that key's lock;
/// different keys never contend beyond the brief map lookup.
#[derive(Debug)]
pub struct PriceController {
    config: PricingConfig,
    resources: RwLock<HashMap<String, Arc<RwLock<PriceState>>>>,
}

impl PriceController {
    /// Create a controller, validating the configuration.
    pub fn new(config: PricingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, resources: RwLock::new(HashMap::new()) })
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Get or create the state of a resource.
    fn get_or_create(&self, resource: &str) -> Arc<RwLock<PriceState>> {
        // Fast path: read lock
        {
            let resources = self.resources.read();
            if let Some(state) = resources.get(resource) {
                return Arc::clone(state);
            }
        }

        // Slow path: write lock with double-check
        let mut resources = self.resources.write();
        if let Some(state) = resources.get(resource) {
            return Arc::clone(state);
        }

        debug!(resource, price = self.config.initial_price, "tracking new resource");
        let state = Arc::new(RwLock::new(PriceState::new(self.config.initial_price)));
        resources.insert(resource.to_owned(), Arc::clone(&state));
        state
    }

    /// Current price of a resource. Unseen resources start at the initial price.
    pub fn price(&self, resource: &str) -> u64 {
        self.get_or_create(resource).read().price()
    }

    /// Record one completed request and adjust the price.
    pub fn record(&self, resource: &str, latency: Duration, cost_units: u64) -> PriceUpdate {
        let latency_ms = latency.as_nanos() as f64 / 1_000_000.0;
        let state = self.get_or_create(resource);
        let update = state.write().apply(&self.config, latency_ms, cost_units as f64);

        catalogue::pricing::set_price(resource, update.current);
        catalogue::pricing::set_composite_cost(resource, update.composite_cost);

        match update.direction() {
            PriceDirection::Raised => info!(
                resource,
                from = update.previous,
                to = update.current,
                composite = update.composite_cost,
                "price raised"
            ),
            PriceDirection::Lowered => debug!(
                resource,
                from = update.previous,
                to = update.current,
                composite = update.composite_cost,
                "price lowered"
            ),
            PriceDirection::Unchanged => trace!(
                resource,
                price = update.current,
                composite = update.composite_cost,
                latency_ms,
                cost_units,
                "price unchanged"
            ),
        }

        update
    }

    /// State of a resource, if it has been seen.
    pub fn snapshot(&self, resource: &str) -> Option<PriceSnapshot> {
        let state = self.resources.read().get(resource).cloned()?;
        let snapshot = state.read().snapshot();
        Some(snapshot)
    }

    /// State of every known resource, sorted by key.
    pub fn snapshots(&self) -> Vec<(String, PriceSnapshot)> {
        let resources: Vec<_> = self
            .resources
            .read()
            .iter()
            .map(|(key, state)| (key.clone(), Arc::clone(state)))
            .collect();

        let mut snapshots: Vec<_> =
            resources.into_iter().map(|(key, state)| (key, state.read().snapshot())).collect();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    /// Known resource keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.resources.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Refresh the price gauges of every resource.
    ///
    /// Intended as a scrape hook so gauges exist for resources that were priced
    /// but never observed.
    pub fn publish_metrics(&self) {
        for (resource, snapshot) in self.snapshots() {
            catalogue::pricing::set_price(&resource, snapshot.price);
            catalogue::pricing::set_composite_cost(&resource, snapshot.composite_cost);
        }
    }
}

impl Default for PriceController {
    fn default() -> Self {
        Self { config: PricingConfig::default(), resources: RwLock::new(HashMap::new()) }
    }
}

impl Pricer for PriceController {
    fn price(&self, resource: &str) -> u64 {
        PriceController::price(self, resource)
    }

    fn record(&self, resource: &str, latency: Duration, cost_units: u64) {
        PriceController::record(self, resource, latency, cost_units);
    }
}
