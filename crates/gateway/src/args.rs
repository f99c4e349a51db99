//! Command line arguments for the gateway server and admission settings.

use crate::config::{AdmissionSettings, ServerConfig};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Listener and upstream arguments.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
#[command(next_help_heading = "Server")]
#[serde(default)]
pub struct ServerArgs {
    /// Address the gateway listens on.
    #[arg(long = "server.listen", value_name = "ADDR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<SocketAddr>,

    /// Backend base URLs, comma separated. Requests are spread round-robin.
    #[arg(long = "server.backends", value_name = "URLS", value_delimiter = ',')]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<String>,
}

impl ServerArgs {
    /// Override the values that were given on the command line.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.clone();
        }
    }
}

/// Admission arguments.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
#[command(next_help_heading = "Admission")]
#[serde(default)]
pub struct AdmissionArgs {
    /// Cancel admitted requests still running after this many milliseconds.
    #[arg(long = "admission.deadline-ms", value_name = "MS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,

    /// Quote this price for every resource instead of running the controller.
    #[arg(long = "admission.fixed-price", value_name = "PRICE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<u64>,
}

impl AdmissionArgs {
    /// Override the values that were given on the command line.
    pub fn apply(&self, settings: &mut AdmissionSettings) {
        if self.deadline_ms.is_some() {
            settings.deadline_ms = self.deadline_ms;
        }
        if self.fixed_price.is_some() {
            settings.fixed_price = self.fixed_price;
        }
    }
}
