//! Round-robin reverse proxy to the model backends.

use crate::GatewayError;
use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, header};
use std::sync::atomic::{AtomicUsize, Ordering};
use tollgate_admission::UsageReporter;
use tollgate_stream::{TokenUsage, UsageTap};
use tracing::{debug, error, warn};
use url::Url;

/// Set on every proxied request.
pub const FORWARDED_BY_HEADER: HeaderName = HeaderName::from_static("x-forwarded-by");

/// Headers that describe a single hop and are never forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Spreads requests over a fixed set of backends in turn.
#[derive(Debug)]
pub struct RoundRobin {
    backends: Vec<Url>,
    next: AtomicUsize,
    client: reqwest::Client,
}

impl RoundRobin {
    /// Balance over `backends`. An empty list answers every request with 503.
    pub fn new(backends: Vec<Url>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { backends, next: AtomicUsize::new(0), client })
    }

    /// The configured backends.
    pub fn backends(&self) -> &[Url] {
        &self.backends
    }

    /// The backend for the next request.
    pub fn next_backend(&self) -> Option<&Url> {
        if self.backends.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.backends.len();
        self.backends.get(index)
    }

    /// Send `request` to the next backend and stream its response back.
    ///
    /// Usage events in the response stream are reported to the request's
    /// [`UsageReporter`] as they pass through.
    pub async fn forward(&self, request: Request) -> Response {
        let Some(backend) = self.next_backend() else {
            warn!("no backend configured");
            return (StatusCode::SERVICE_UNAVAILABLE, "No backend available").into_response();
        };

        let (parts, body) = request.into_parts();
        let reporter = parts.extensions.get::<UsageReporter>().cloned();
        let target = upstream_url(backend, &parts.uri);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.insert(FORWARDED_BY_HEADER, HeaderValue::from_static("tollgate"));

        debug!(method = %parts.method, upstream = %target, "forwarding");
        let upstream = self
            .client
            .request(parts.method, target.clone())
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await;

        let upstream = match upstream {
            Ok(upstream) => upstream,
            Err(err) => {
                error!(backend = %backend, %err, "backend request failed");
                return (StatusCode::BAD_GATEWAY, "Backend unavailable").into_response();
            }
        };

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let body = UsageTap::new(upstream.bytes_stream(), move |usage: TokenUsage| {
            if let Some(reporter) = &reporter {
                reporter.report(usage.total_tokens);
            }
        });

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

/// `backend` with the path and query of `uri`.
fn upstream_url(backend: &Url, uri: &Uri) -> Url {
    let mut url = backend.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());
    url
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}
