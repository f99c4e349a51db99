//! Per-resource price state and the update rule.

use crate::{PricingConfig, constants::MIN_PRICE};

/// Mutable pricing state of one resource key.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PriceState {
    price: u64,
    ewma_latency_ms: f64,
    ewma_cost: f64,
    composite_cost: f64,
    observations: u64,
}

impl PriceState {
    pub(crate) fn new(initial_price: u64) -> Self {
        Self {
            price: initial_price.max(MIN_PRICE),
            ewma_latency_ms: 0.0,
            ewma_cost: 0.0,
            composite_cost: 0.0,
            observations: 0,
        }
    }

    pub(crate) fn price(&self) -> u64 {
        self.price
    }

    /// Fold one observation into the estimates and adjust the price.
    pub(crate) fn apply(
        &mut self,
        config: &PricingConfig,
        latency_ms: f64,
        cost: f64,
    ) -> PriceUpdate {
        if self.observations == 0 {
            self.ewma_latency_ms = latency_ms;
            self.ewma_cost = cost;
        } else {
            self.ewma_latency_ms = ewma(config.alpha, latency_ms, self.ewma_latency_ms);
            self.ewma_cost = ewma(config.alpha, cost, self.ewma_cost);
        }
        self.observations += 1;

        let composite = config.composite(self.ewma_latency_ms, self.ewma_cost);
        self.composite_cost = composite;

        let previous = self.price;
        if composite > config.base_threshold {
            let steps = ((composite - config.base_threshold) / config.step_unit).floor();
            // `as` saturates, so huge overshoots still clamp to max_step.
            let step = (steps as u64).clamp(1, config.max_step);
            self.price = self.price.saturating_add(step);
        } else if composite < config.base_threshold / 2.0 && self.price > MIN_PRICE {
            self.price -= 1;
        }

        PriceUpdate { previous, current: self.price, composite_cost: composite }
    }

    pub(crate) fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            price: self.price,
            ewma_latency_ms: self.ewma_latency_ms,
            ewma_cost: self.ewma_cost,
            composite_cost: self.composite_cost,
            observations: self.observations,
        }
    }
}

fn ewma(alpha: f64, sample: f64, old: f64) -> f64 {
    alpha * sample + (1.0 - alpha) * old
}

/// Copy of a resource's pricing state at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    /// Current price in tokens.
    pub price: u64,
    /// Smoothed latency in milliseconds.
    pub ewma_latency_ms: f64,
    /// Smoothed work units.
    pub ewma_cost: f64,
    /// Composite cost computed by the last observation.
    pub composite_cost: f64,
    /// Number of observations applied.
    pub observations: u64,
}

/// Which way an observation moved the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PriceDirection {
    /// Composite cost above the threshold.
    Raised,
    /// Composite cost below half the threshold.
    Lowered,
    /// Inside the dead zone, or already at the floor.
    Unchanged,
}

/// Result of recording one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceUpdate {
    /// Price before the observation.
    pub previous: u64,
    /// Price after the observation.
    pub current: u64,
    /// Composite cost the decision was based on.
    pub composite_cost: f64,
}

impl PriceUpdate {
    /// Direction of the change.
    pub fn direction(&self) -> PriceDirection {
        match self.current.cmp(&self.previous) {
            std::cmp::Ordering::Greater => PriceDirection::Raised,
            std::cmp::Ordering::Less => PriceDirection::Lowered,
            std::cmp::Ordering::Equal => PriceDirection::Unchanged,
        }
    }

    /// Size of the change in tokens.
    pub fn delta(&self) -> i64 {
        self.current as i64 - self.previous as i64
    }
}
