//! Tollgate gateway assembly.
//!
//! Wires the price controller and admission layer in front of a round-robin
//! proxy, and hosts the mock model backend used for demos and tests.

mod args;
mod config;
mod error;
pub mod handlers;
mod proxy;
mod router;

pub use args::{AdmissionArgs, ServerArgs};
pub use config::{
    AdmissionSettings, BACKEND_HOSTS_ENV, DEFAULT_BACKEND, GatewayConfig, ServerConfig,
};
pub use error::GatewayError;
pub use handlers::ChatScript;
pub use proxy::{FORWARDED_BY_HEADER, RoundRobin};
pub use router::{GatewayState, backend_router, bind, router, serve, shutdown_signal};
