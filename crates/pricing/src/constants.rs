//! Default constants for the price controller.

/// Default EWMA smoothing factor.
pub(crate) const DEFAULT_ALPHA: f64 = 0.2;

/// Default weight of the latency estimate (per millisecond).
pub(crate) const DEFAULT_LATENCY_WEIGHT: f64 = 0.5;

/// Default weight of the usage estimate (per work unit).
pub(crate) const DEFAULT_COST_WEIGHT: f64 = 0.5;

/// Default composite cost above which the price rises.
pub(crate) const DEFAULT_BASE_THRESHOLD: f64 = 200.0;

/// Default composite cost above the threshold worth one price step.
pub(crate) const DEFAULT_STEP_UNIT: f64 = 50.0;

/// Default cap on a single price increase.
pub(crate) const DEFAULT_MAX_STEP: u64 = 10;

/// Default price of a resource that has not been observed yet.
pub(crate) const DEFAULT_INITIAL_PRICE: u64 = 5;

/// Lowest price a resource can have.
pub(crate) const MIN_PRICE: u64 = 1;
