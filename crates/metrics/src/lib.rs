//! Metrics for Tollgate.
//!
//! Instrumented crates call the helpers in [`catalogue`]; binaries install a
//! [`PrometheusRecorder`] and mount [`metrics_router`] next to their own routes.
//! Tests install a [`CaptureRecorder`] locally and inspect what was recorded.

mod config;
mod hooks;
mod prometheus;
mod recorder;
mod server;

pub mod catalogue;

pub use config::PrometheusConfig;
pub use hooks::{Hook, Hooks, HooksBuilder};
pub use prometheus::{PrometheusRecorder, install_prometheus_recorder};
pub use recorder::{CaptureRecorder, MetricSnapshot, MetricValue};
pub use server::metrics_router;

/// Re-export metrics crate for convenience
pub use metrics;
