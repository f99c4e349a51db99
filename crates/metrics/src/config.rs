//! Configuration for the prometheus exporter.

use serde::{Deserialize, Serialize};

/// Configuration for prometheus metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Whether `/metrics` is served.
    pub enabled: bool,

    /// Prefix for all metric names.
    pub prefix: String,

    /// How often to run recorder upkeep in seconds.
    pub upkeep_interval_secs: u64,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true, prefix: "tollgate".to_string(), upkeep_interval_secs: 10 }
    }
}
