//! CLI arguments for the price controller.

use crate::PricingConfig;
use clap::Args;
use serde::{Deserialize, Serialize};

/// Price controller CLI overrides.
///
/// Only flags given on the command line are set; everything else keeps the
/// value from the configuration file or environment.
#[derive(Debug, Args, Clone, Default, PartialEq, Serialize, Deserialize)]
#[command(next_help_heading = "Pricing")]
#[serde(default)]
pub struct PricingArgs {
    /// EWMA smoothing factor in (0, 1] [default: 0.2]
    #[arg(long = "pricing.alpha", value_name = "ALPHA")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,

    /// Weight of the latency estimate, per millisecond [default: 0.5]
    #[arg(long = "pricing.latency-weight", value_name = "WEIGHT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_weight: Option<f64>,

    /// Weight of the usage estimate, per work unit [default: 0.5]
    #[arg(long = "pricing.cost-weight", value_name = "WEIGHT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_weight: Option<f64>,

    /// Composite cost above which the price rises [default: 200]
    #[arg(long = "pricing.threshold", value_name = "COST")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_threshold: Option<f64>,

    /// Composite cost above the threshold worth one price step [default: 50]
    #[arg(long = "pricing.step-unit", value_name = "COST")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_unit: Option<f64>,

    /// Largest single price increase [default: 10]
    #[arg(long = "pricing.max-step", value_name = "TOKENS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_step: Option<u64>,

    /// Price of a resource before any observation [default: 5]
    #[arg(long = "pricing.initial-price", value_name = "TOKENS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_price: Option<u64>,
}

impl PricingArgs {
    /// Overwrite the fields that were given on the command line.
    pub fn apply(&self, config: &mut PricingConfig) {
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(weight) = self.latency_weight {
            config.latency_weight = weight;
        }
        if let Some(weight) = self.cost_weight {
            config.cost_weight = weight;
        }
        if let Some(threshold) = self.base_threshold {
            config.base_threshold = threshold;
        }
        if let Some(unit) = self.step_unit {
            config.step_unit = unit;
        }
        if let Some(max_step) = self.max_step {
            config.max_step = max_step;
        }
        if let Some(price) = self.initial_price {
            config.initial_price = price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        pricing: PricingArgs,
    }

    #[test]
    fn test_only_given_flags_apply() {
        let cli =
            Cli::parse_from(["tollgate", "--pricing.alpha", "0.5", "--pricing.max-step", "3"]);
        let mut config = PricingConfig { base_threshold: 400.0, ..Default::default() };
        cli.pricing.apply(&mut config);

        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.max_step, 3);
        assert_eq!(config.base_threshold, 400.0);
        assert_eq!(config.initial_price, 5);
    }

    #[test]
    fn test_no_flags_is_identity() {
        let cli = Cli::parse_from(["tollgate"]);
        let mut config = PricingConfig::default();
        cli.pricing.apply(&mut config);
        assert_eq!(config, PricingConfig::default());
    }
}
