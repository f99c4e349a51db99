//! Configuration errors.

/// Invalid price controller configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Smoothing factor outside `(0, 1]`.
    #[error("alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),

    /// A weight is negative or not finite.
    #[error("{name} must be a finite non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    /// Threshold is not a positive finite number.
    #[error("base threshold must be positive, got {0}")]
    InvalidThreshold(f64),

    /// Step unit is not a positive finite number.
    #[error("step unit must be positive, got {0}")]
    InvalidStepUnit(f64),

    /// Maximum step of zero would never raise the price.
    #[error("max step must be at least 1")]
    ZeroMaxStep,

    /// Prices start at 1 or more.
    #[error("initial price must be at least 1")]
    ZeroInitialPrice,
}
