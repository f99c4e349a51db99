//! Price controller configuration.

use crate::{ConfigError, constants::*};
use serde::{Deserialize, Serialize};

/// Tuning parameters of the price controller.
///
/// Fixed once the controller is built. [`validate`](Self::validate) is run by
/// [`PriceController::new`](crate::PriceController::new).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// EWMA smoothing factor in `(0, 1]`. Higher reacts faster.
    pub alpha: f64,
    /// Weight applied to the latency estimate in milliseconds.
    pub latency_weight: f64,
    /// Weight applied to the usage estimate in work units.
    pub cost_weight: f64,
    /// Composite cost above which the price rises.
    pub base_threshold: f64,
    /// Composite cost above the threshold that is worth one price step.
    pub step_unit: f64,
    /// Largest single price increase.
    pub max_step: u64,
    /// Price of a resource before any observation.
    pub initial_price: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            latency_weight: DEFAULT_LATENCY_WEIGHT,
            cost_weight: DEFAULT_COST_WEIGHT,
            base_threshold: DEFAULT_BASE_THRESHOLD,
            step_unit: DEFAULT_STEP_UNIT,
            max_step: DEFAULT_MAX_STEP,
            initial_price: DEFAULT_INITIAL_PRICE,
        }
    }
}

impl PricingConfig {
    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        for (name, value) in
            [("latency weight", self.latency_weight), ("cost weight", self.cost_weight)]
        {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if !self.base_threshold.is_finite() || self.base_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.base_threshold));
        }
        if !self.step_unit.is_finite() || self.step_unit <= 0.0 {
            return Err(ConfigError::InvalidStepUnit(self.step_unit));
        }
        if self.max_step == 0 {
            return Err(ConfigError::ZeroMaxStep);
        }
        if self.initial_price < MIN_PRICE {
            return Err(ConfigError::ZeroInitialPrice);
        }
        Ok(())
    }

    /// Composite cost for the given estimates.
    pub fn composite(&self, ewma_latency_ms: f64, ewma_cost: f64) -> f64 {
        self.latency_weight * ewma_latency_ms + self.cost_weight * ewma_cost
    }
}
