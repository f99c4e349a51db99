//! Route assembly and serving.

use crate::{AdmissionSettings, ChatScript, GatewayConfig, GatewayError, RoundRobin, handlers};
use axum::{
    Router,
    extract::{Request, State},
    response::Response,
    routing::{any, get},
};
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tollgate_admission::AdmissionLayer;
use tollgate_metrics::Hooks;
use tollgate_pricing::{FixedPricer, PriceController, Pricer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by the gateway routes.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Per-resource prices.
    pub controller: Arc<PriceController>,
    /// Upstream selection for `/mcp/chat`.
    pub balancer: Arc<RoundRobin>,
}

impl GatewayState {
    /// Build the controller and balancer from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let controller = PriceController::new(config.pricing)?;
        let balancer = RoundRobin::new(config.backend_urls()?)?;
        Ok(Self { controller: Arc::new(controller), balancer: Arc::new(balancer) })
    }

    /// Scrape hooks keeping the price gauges current.
    pub fn metrics_hooks(&self) -> Hooks {
        let controller = Arc::clone(&self.controller);
        Hooks::builder().with_hook(move || controller.publish_metrics()).build()
    }
}

/// The gateway's priced routes.
///
/// `/mcp/chat` is proxied to the backends and `/context` is served locally.
/// Both are admitted against the controller's price, or against a constant
/// when `settings.fixed_price` is set.
pub fn router(state: GatewayState, settings: &AdmissionSettings) -> Router {
    let pricer: Arc<dyn Pricer> = match settings.fixed_price {
        Some(price) => Arc::new(FixedPricer::new(price)),
        None => state.controller.clone(),
    };

    let mut admission = AdmissionLayer::new(pricer);
    if let Some(deadline) = settings.deadline() {
        admission = admission.with_deadline(deadline);
    }

    Router::new()
        .route("/mcp/chat", any(proxy))
        .route("/context", get(handlers::context))
        .route_layer(admission)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The mock model backend.
pub fn backend_router(script: ChatScript) -> Router {
    Router::new()
        .route("/mcp/chat", get(handlers::chat))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(script))
}

async fn proxy(State(state): State<GatewayState>, request: Request) -> Response {
    state.balancer.forward(request).await
}

/// Bind `addr`.
pub async fn bind(addr: std::net::SocketAddr) -> Result<TcpListener, GatewayError> {
    TcpListener::bind(addr).await.map_err(|source| GatewayError::Bind { addr, source })
}

/// Serve `router` until `shutdown` resolves, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), GatewayError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(GatewayError::Serve)
}

/// Resolves on ctrl-c.
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
