//! End-to-end behaviour of the admission layer around axum handlers.

use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use futures::stream;
use http_body::Body as _;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tollgate_admission::{AdmissionLayer, PRICE_HEADER, TOKEN_HEADER, USAGE_HEADER, UsageReporter};
use tollgate_metrics::{
    CaptureRecorder,
    catalogue::{REQUESTS_TOTAL, USAGE_PARSE_ERRORS_TOTAL},
    metrics,
};
use tollgate_pricing::{PriceController, Pricer};
use tower::ServiceExt;

/// Quotes a fixed price and remembers every observation.
#[derive(Debug, Default)]
struct RecordingPricer {
    price: u64,
    observations: Mutex<Vec<(String, Duration, u64)>>,
}

impl RecordingPricer {
    fn new(price: u64) -> Arc<Self> {
        Arc::new(Self { price, observations: Mutex::default() })
    }

    fn observations(&self) -> Vec<(String, Duration, u64)> {
        self.observations.lock().clone()
    }
}

impl Pricer for RecordingPricer {
    fn price(&self, _resource: &str) -> u64 {
        self.price
    }

    fn record(&self, resource: &str, latency: Duration, cost_units: u64) {
        self.observations.lock().push((resource.to_owned(), latency, cost_units));
    }
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn price_of(response: &Response) -> u64 {
    response.headers()[PRICE_HEADER].to_str().unwrap().parse().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn ok() -> &'static str {
    "MCP Task Success"
}

async fn reports_usage(Extension(usage): Extension<UsageReporter>) -> &'static str {
    usage.report(12);
    "done"
}

async fn usage_header() -> impl IntoResponse {
    ([(USAGE_HEADER, "30")], "done")
}

async fn bad_usage_header() -> impl IntoResponse {
    ([(USAGE_HEADER, "lots")], "done")
}

async fn reporter_and_header(Extension(usage): Extension<UsageReporter>) -> impl IntoResponse {
    usage.report(12);
    ([(USAGE_HEADER, "30")], "done")
}

/// Four chunks 100ms apart; usage is only known once the last one is sent.
async fn streaming(Extension(usage): Extension<UsageReporter>) -> Response {
    let chunks = stream::unfold(0u32, move |sent| {
        let usage = usage.clone();
        async move {
            if sent == 4 {
                usage.report(44);
                return None;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            Some((Ok::<_, Infallible>(Bytes::from(format!("data: {sent}\n\n"))), sent + 1))
        }
    });
    Body::from_stream(chunks).into_response()
}

/// Every chunk is ready immediately and the length is declared up front.
async fn eager() -> Response {
    let chunks = stream::iter(["abcd", "efgh", "ijkl"].map(Ok::<_, Infallible>));
    ([(header::CONTENT_LENGTH, "12")], Body::from_stream(chunks)).into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

fn app(pricer: Arc<RecordingPricer>) -> Router {
    Router::new()
        .route("/context", get(ok))
        .route("/reports", get(reports_usage))
        .route("/header", get(usage_header))
        .route("/bad-header", get(bad_usage_header))
        .route("/both", get(reporter_and_header))
        .route("/stream", get(streaming))
        .route("/slow", get(slow))
        .route("/boom", get(boom))
        .layer(AdmissionLayer::new(pricer))
}

#[tokio::test]
async fn test_missing_token_is_forbidden() {
    let pricer = RecordingPricer::new(5);

    for token in [None, Some(""), Some("five")] {
        let response = app(pricer.clone()).oneshot(request("/context", token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(price_of(&response), 5);
        assert_eq!(body_text(response).await, "No Token");
    }

    assert!(pricer.observations().is_empty());
}

#[tokio::test]
async fn test_low_bid_is_rejected_with_price() {
    let pricer = RecordingPricer::new(7);

    let response = app(pricer.clone()).oneshot(request("/context", Some("5"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(price_of(&response), 7);
    assert_eq!(body_text(response).await, "System is busy (Price > Token)");
    assert!(pricer.observations().is_empty());
}

#[tokio::test]
async fn test_sufficient_bid_is_admitted_and_observed() {
    let pricer = RecordingPricer::new(7);

    let response = app(pricer.clone()).oneshot(request("/context", Some("7"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(price_of(&response), 7);
    assert_eq!(body_text(response).await, "MCP Task Success");

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].0, "/context");
    assert_eq!(observations[0].2, 0);
}

#[tokio::test]
async fn test_usage_sources() {
    let pricer = RecordingPricer::new(1);

    for path in ["/reports", "/header", "/bad-header", "/both"] {
        let response = app(pricer.clone()).oneshot(request(path, Some("1"))).await.unwrap();
        body_text(response).await;
    }

    let usage: Vec<_> =
        pricer.observations().into_iter().map(|(key, _, usage)| (key, usage)).collect();
    assert_eq!(
        usage,
        vec![
            ("/reports".to_string(), 12),
            ("/header".to_string(), 30),
            ("/bad-header".to_string(), 0),
            ("/both".to_string(), 12),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_streamed_usage_recorded_after_last_chunk() {
    let pricer = RecordingPricer::new(5);

    let response = app(pricer.clone()).oneshot(request("/stream", Some("9"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(price_of(&response), 5);
    assert!(pricer.observations().is_empty(), "observed before the body was sent");

    let mut body = response.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.into_data().unwrap(), Bytes::from_static(b"data: 0\n\n"));
    assert!(pricer.observations().is_empty(), "observed at first byte");

    while let Some(frame) = body.frame().await {
        frame.unwrap();
    }

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    let (resource, latency, usage) = &observations[0];
    assert_eq!(resource, "/stream");
    assert!(*latency >= Duration::from_millis(400), "latency {latency:?}");
    assert_eq!(*usage, 44);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_stream_is_observed_once() {
    let pricer = RecordingPricer::new(5);

    let response = app(pricer.clone()).oneshot(request("/stream", Some("9"))).await.unwrap();
    let mut body = response.into_body();
    body.frame().await.unwrap().unwrap();
    drop(body);

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].2, 0);
    assert!(observations[0].1 >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_returns_gateway_timeout() {
    let pricer = RecordingPricer::new(3);
    let app = Router::new()
        .route("/slow", get(slow))
        .layer(AdmissionLayer::new(pricer.clone()).with_deadline(Duration::from_millis(250)));

    let response = app.oneshot(request("/slow", Some("3"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(price_of(&response), 3);

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert!(observations[0].1 >= Duration::from_millis(250));
    assert!(observations[0].1 < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_truncates_slow_stream() {
    let pricer = RecordingPricer::new(3);
    let app = Router::new()
        .route("/stream", get(streaming))
        .layer(AdmissionLayer::new(pricer.clone()).with_deadline(Duration::from_millis(250)));

    let response = app.oneshot(request("/stream", Some("3"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert_eq!(text, "data: 0\n\ndata: 1\n\n");

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].2, 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_truncates_ready_body() {
    let pricer = RecordingPricer::new(3);
    let app = Router::new()
        .route("/eager", get(eager))
        .layer(AdmissionLayer::new(pricer.clone()).with_deadline(Duration::from_millis(250)));

    let response = app.oneshot(request("/eager", Some("3"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_LENGTH).is_none());

    tokio::time::advance(Duration::from_millis(300)).await;
    let mut body = response.into_body();
    assert!(body.frame().await.is_none());
    assert!(body.is_end_stream());
    assert_eq!(body.size_hint().exact(), Some(0));

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert!(observations[0].1 >= Duration::from_millis(250));
}

#[tokio::test]
async fn test_ready_body_without_deadline_keeps_length() {
    let pricer = RecordingPricer::new(3);
    let app = Router::new().route("/eager", get(eager)).layer(AdmissionLayer::new(pricer));

    let response = app.oneshot(request("/eager", Some("3"))).await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "12");
    assert_eq!(body_text(response).await, "abcdefghijkl");
}

#[tokio::test]
async fn test_panicking_handler_is_still_observed() {
    let pricer = RecordingPricer::new(2);

    let outcome = tokio::spawn(app(pricer.clone()).oneshot(request("/boom", Some("2")))).await;
    assert!(outcome.unwrap_err().is_panic());

    let observations = pricer.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].0, "/boom");
}

#[tokio::test]
async fn test_fixed_key_overrides_path() {
    let pricer = RecordingPricer::new(1);
    let app = Router::new()
        .route("/a", get(ok))
        .route("/b", get(ok))
        .layer(AdmissionLayer::new(pricer.clone()).with_key("shared"));

    for path in ["/a", "/b"] {
        body_text(app.clone().oneshot(request(path, Some("1"))).await.unwrap()).await;
    }

    let keys: Vec<_> = pricer.observations().into_iter().map(|(key, _, _)| key).collect();
    assert_eq!(keys, vec!["shared", "shared"]);
}

#[tokio::test]
async fn test_each_request_counts_one_outcome() {
    let recorder = CaptureRecorder::new();
    let _guard = metrics::set_default_local_recorder(&recorder);
    let pricer = RecordingPricer::new(7);

    for token in [None, Some("5"), Some("7"), Some("100"), Some("x")] {
        let response = app(pricer.clone()).oneshot(request("/context", token)).await.unwrap();
        body_text(response).await;
    }
    body_text(app(pricer.clone()).oneshot(request("/bad-header", Some("7"))).await.unwrap()).await;

    let count = |status: &str, resource: &str| {
        recorder
            .counter(REQUESTS_TOTAL, &[("status", status), ("resource", resource)])
            .unwrap_or(0)
    };
    assert_eq!(count("rejected_no_token", "/context"), 2);
    assert_eq!(count("rejected_price", "/context"), 1);
    assert_eq!(count("accepted", "/context"), 2);
    assert_eq!(count("accepted", "/bad-header"), 1);
    assert_eq!(recorder.counter_total(REQUESTS_TOTAL), 6);
    assert_eq!(recorder.counter(USAGE_PARSE_ERRORS_TOTAL, &[("resource", "/bad-header")]), Some(1));
}

#[tokio::test]
async fn test_controller_price_gates_requests() {
    let controller = Arc::new(PriceController::default());
    controller.record("/context", Duration::from_millis(500), 100);
    assert_eq!(controller.price("/context"), 7);

    let app =
        Router::new().route("/context", get(ok)).layer(AdmissionLayer::new(controller.clone()));

    let rejected = app.clone().oneshot(request("/context", Some("5"))).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(price_of(&rejected), 7);
    assert_eq!(controller.snapshot("/context").unwrap().observations, 1);

    let admitted = app.oneshot(request("/context", Some("9"))).await.unwrap();
    assert_eq!(admitted.status(), StatusCode::OK);
    assert_eq!(price_of(&admitted), 7);
    body_text(admitted).await;
    assert_eq!(controller.snapshot("/context").unwrap().observations, 2);
}
