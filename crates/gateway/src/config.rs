//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`TOLLGATE_` prefix, `__` separates sections)
//! 4. Defaults
//!
//! When no backend is configured anywhere, `BACKEND_HOSTS` (comma separated)
//! is consulted, then `http://localhost:9001`.

use crate::{AdmissionArgs, GatewayError, ServerArgs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};
use tollgate_metrics::PrometheusConfig;
use tollgate_pricing::{PricingArgs, PricingConfig};
use url::Url;

/// Legacy variable listing backends when none are configured.
pub const BACKEND_HOSTS_ENV: &str = "BACKEND_HOSTS";

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND: &str = "http://localhost:9001";

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener and upstreams.
    pub server: ServerConfig,
    /// Price controller parameters.
    pub pricing: PricingConfig,
    /// Admission behaviour.
    pub admission: AdmissionSettings,
    /// Prometheus exporter.
    pub metrics: PrometheusConfig,
}

/// Listener and upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the gateway listens on.
    pub listen: SocketAddr,
    /// Backend base URLs.
    pub backends: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: SocketAddr::from(([0, 0, 0, 0], 8080)), backends: Vec::new() }
    }
}

/// Admission behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionSettings {
    /// Per-request deadline in milliseconds. Unset means no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    /// Quote a constant price instead of running the controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<u64>,
}

impl AdmissionSettings {
    /// The deadline as a duration.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

impl GatewayConfig {
    /// The layered providers, without the backend fallback.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(GatewayConfig::default()))
            .merge(Env::prefixed("TOLLGATE_").split("__"));

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment
    }

    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately with [`Self::apply_args`].
    pub fn load(config_path: Option<&Path>) -> Result<Self, GatewayError> {
        let mut config: Self = Self::figment(config_path).extract().map_err(Box::new)?;

        if config.server.backends.is_empty() {
            config.server.backends = backends_from_env();
        }

        Ok(config)
    }

    /// Apply command line overrides.
    pub fn apply_args(
        &mut self,
        server: &ServerArgs,
        pricing: &PricingArgs,
        admission: &AdmissionArgs,
    ) {
        server.apply(&mut self.server);
        pricing.apply(&mut self.pricing);
        admission.apply(&mut self.admission);
    }

    /// Parse the configured backends.
    pub fn backend_urls(&self) -> Result<Vec<Url>, GatewayError> {
        self.server
            .backends
            .iter()
            .map(|raw| {
                Url::parse(raw.trim())
                    .map_err(|source| GatewayError::InvalidBackend { url: raw.clone(), source })
            })
            .collect()
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, GatewayError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn backends_from_env() -> Vec<String> {
    let hosts = std::env::var(BACKEND_HOSTS_ENV).unwrap_or_default();
    let backends: Vec<String> = hosts
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .collect();

    if backends.is_empty() { vec![DEFAULT_BACKEND.to_owned()] } else { backends }
}
