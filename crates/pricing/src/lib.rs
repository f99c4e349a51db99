//! Dynamic per-resource pricing.
//!
//! The [`PriceController`] keeps, for every resource key, an exponentially
//! weighted estimate of latency and reported work. After each observation the
//! weighted sum (the composite cost) is compared with a threshold:
//!
//! ```text
//! composite > threshold       price += clamp(floor((composite - threshold) / step_unit), 1, max_step)
//! composite < threshold / 2   price -= 1   (never below 1)
//! otherwise                   unchanged
//! ```
//!
//! Prices rise in proportion to overload and fall one token at a time.

mod args;
mod config;
mod constants;
mod controller;
mod error;
mod pricer;
mod state;

pub use args::PricingArgs;
pub use config::PricingConfig;
pub use controller::PriceController;
pub use error::ConfigError;
pub use pricer::{FixedPricer, Pricer};
pub use state::{PriceDirection, PriceSnapshot, PriceUpdate};
