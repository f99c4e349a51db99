//! Gateway errors.

use std::{io, net::SocketAddr};
use tollgate_pricing::ConfigError;

/// Errors raised while configuring or running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A backend address could not be parsed as a URL.
    #[error("invalid backend url {url:?}: {source}")]
    InvalidBackend {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Pricing parameters were rejected.
    #[error(transparent)]
    Pricing(#[from] ConfigError),

    /// Layered configuration could not be extracted.
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Effective configuration could not be rendered.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    /// The upstream HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
