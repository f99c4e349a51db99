//! HTTP routes for scraping.

use crate::Hooks;
use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State shared by the metrics routes.
struct ServerState {
    handle: PrometheusHandle,
    hooks: Hooks,
}

/// Routes serving `/metrics` (prometheus text format) and `/health`.
///
/// Hooks run before every render so gauges derived from live state are current.
pub fn metrics_router(handle: PrometheusHandle, hooks: Hooks) -> Router {
    let state = Arc::new(ServerState { handle, hooks });

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.hooks.execute_all();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], state.handle.render())
}

async fn health_handler() -> &'static str {
    "ok"
}
