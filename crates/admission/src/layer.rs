//! The admission layer and service.

use crate::{
    MeteredBody, Rejection, UsageReporter,
    guard::ObservationGuard,
    headers::{self, PRICE_HEADER, UsageHeader},
};
use axum::body::Body;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response, header};
use std::{
    fmt,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
use tollgate_metrics::catalogue::admission::{self as admission_metrics, Outcome};
use tollgate_pricing::Pricer;
use tower::{BoxError, Layer, Service};
use tracing::{debug, trace, warn};

/// Applies price-gated admission to the wrapped service.
#[derive(Clone)]
pub struct AdmissionLayer {
    pricer: Arc<dyn Pricer>,
    resource: Option<Arc<str>>,
    deadline: Option<Duration>,
}

impl AdmissionLayer {
    /// Price requests with `pricer`, keyed by request path.
    pub fn new(pricer: Arc<dyn Pricer>) -> Self {
        Self { pricer, resource: None, deadline: None }
    }

    /// Price every request under a fixed key instead of its path.
    pub fn with_key(mut self, resource: impl Into<Arc<str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Cancel admitted requests that have not finished within `deadline`.
    ///
    /// A handler that has not produced a response head by then is dropped and
    /// the client gets a 504. A response body still streaming at the deadline is
    /// cut short.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl fmt::Debug for AdmissionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionLayer")
            .field("resource", &self.resource)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            pricer: Arc::clone(&self.pricer),
            resource: self.resource.clone(),
            deadline: self.deadline,
        }
    }
}

/// Service produced by [`AdmissionLayer`].
#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    pricer: Arc<dyn Pricer>,
    resource: Option<Arc<str>>,
    deadline: Option<Duration>,
}

impl<S> fmt::Debug for AdmissionService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionService")
            .field("resource", &self.resource)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AdmissionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: http_body::Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // The ready service goes with this call; the clone serves the next one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let resource =
            self.resource.clone().unwrap_or_else(|| Arc::from(request.uri().path()));
        let pricer = Arc::clone(&self.pricer);
        let deadline = self.deadline.map(|limit| Instant::now() + limit);
        let price = pricer.price(&resource);

        let bid = match headers::parse_bid(request.headers()) {
            Some(bid) => bid,
            None => {
                admission_metrics::record_outcome(&resource, Outcome::RejectedNoToken);
                debug!(%resource, price, "rejected: no token");
                return reject(Rejection::NoToken, price);
            }
        };

        if bid < price {
            admission_metrics::record_outcome(&resource, Outcome::RejectedPrice);
            debug!(%resource, bid, price, "rejected: bid below price");
            return reject(Rejection::PriceAboveBid { bid, price }, price);
        }

        admission_metrics::record_outcome(&resource, Outcome::Accepted);
        trace!(%resource, bid, price, "admitted");

        let usage = UsageReporter::new();
        request.extensions_mut().insert(usage.clone());
        let mut guard = ObservationGuard::new(pricer, Arc::clone(&resource), usage);

        Box::pin(async move {
            let call = inner.call(request);
            let result = match deadline {
                Some(at) => match tokio::time::timeout_at(at, call).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(%resource, "handler deadline exceeded");
                        guard.finish();
                        return Ok(Rejection::DeadlineExceeded.into_priced_response(price));
                    }
                },
                None => call.await,
            };

            // On error the guard drops here and records the observation.
            let response = result?;
            let (mut parts, body) = response.into_parts();

            match headers::parse_usage(&parts.headers) {
                UsageHeader::Absent => {}
                UsageHeader::Valid(value) => guard.set_header_usage(value),
                UsageHeader::Malformed(raw) => {
                    warn!(%resource, value = %raw, "malformed usage header, counting as 0");
                    admission_metrics::usage_parse_error(&resource);
                }
            }
            parts.headers.insert(PRICE_HEADER, headers::price_value(price));
            if deadline.is_some() {
                // A truncated body would contradict a declared length.
                parts.headers.remove(header::CONTENT_LENGTH);
            }

            let body = Body::new(MeteredBody::new(body, guard, deadline));
            Ok(Response::from_parts(parts, body))
        })
    }
}

fn reject<E: Send + 'static>(
    rejection: Rejection,
    price: u64,
) -> BoxFuture<'static, Result<Response<Body>, E>> {
    Box::pin(futures::future::ready(Ok(rejection.into_priced_response(price))))
}
