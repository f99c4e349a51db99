//! Logging for Tollgate binaries.
//!
//! [`LogArgs`] is flattened into every binary's CLI and [`init_logging`] turns it
//! into a global `tracing` subscriber.

mod args;
mod logging;

pub use args::LogArgs;
pub use logging::{build_filter, init_logging};
