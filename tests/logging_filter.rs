//! In-process tests of the body-capturing logging filter.

use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use futures_util::stream;
use employee_service::http::server::panic_response;
use employee_service::http::{logging_filter, CaptureSettings};
use employee_service::{HttpServer, ServiceConfig};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::subscriber::DefaultGuard;

mod common;

use common::LogSink;

fn capture_logs() -> (LogSink, DefaultGuard) {
    let sink = LogSink::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::INFO)
        .with_writer(sink.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (sink, guard)
}

async fn echo(body: Bytes) -> Bytes {
    body
}

async fn length(body: Bytes) -> String {
    body.len().to_string()
}

async fn explode() -> &'static str {
    panic!("boom")
}

async fn broken_stream() -> Response {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(std::io::Error::other("upstream reset")),
    ];
    Response::new(Body::from_stream(stream::iter(chunks)))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

fn filtered(settings: CaptureSettings) -> Router {
    Router::new()
        .route("/echo", post(echo))
        .route("/length", post(length))
        .route("/explode", get(explode))
        .route("/broken", get(broken_stream))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(settings, logging_filter))
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    (status, to_bytes(response.into_body(), usize::MAX).await.unwrap())
}

#[tokio::test]
async fn test_one_line_each_with_exact_bodies() {
    let (logs, _guard) = capture_logs();
    let router = HttpServer::new(ServiceConfig::default()).router();

    let payload = r#"{"name":"A","email":"a@x.com","phone":"1"}"#;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/employee?source=import")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();
    let (status, sent) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let requests = logs.events("Incoming request");
    assert_eq!(requests.len(), 1);
    let fields = &requests[0]["fields"];
    assert_eq!(fields["method"], "POST");
    assert_eq!(fields["uri"], "/employee");
    assert_eq!(fields["content_type"], "application/json");
    assert_eq!(fields["body"], payload);
    assert_eq!(fields["body_truncated"], false);
    assert!(fields["time_taken_ms"].is_u64());

    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    let fields = &responses[0]["fields"];
    assert_eq!(fields["status"], 200);
    assert_eq!(fields["content_type"], "application/json");
    assert_eq!(fields["body"], std::str::from_utf8(&sent).unwrap());
}

#[tokio::test]
async fn test_empty_bodies_log_as_empty_string() {
    let (logs, _guard) = capture_logs();
    let router = HttpServer::new(ServiceConfig::default()).router();

    let request = Request::builder().uri("/hello").body(Body::empty()).unwrap();
    let (status, _) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let requests = logs.events("Incoming request");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["fields"]["body"], "");
    assert_eq!(requests[0]["fields"]["content_type"], "");

    let responses = logs.events("Outgoing response");
    assert_eq!(responses[0]["fields"]["body"], r#"{"message":"Hello world"}"#);
}

#[tokio::test]
async fn test_error_responses_are_observed() {
    let (logs, _guard) = capture_logs();
    let router = HttpServer::new(ServiceConfig::default()).router();

    let request = Request::builder().uri("/employee/42").body(Body::empty()).unwrap();
    let (status, sent) = send(router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 404);
    assert_eq!(responses[0]["fields"]["body"], std::str::from_utf8(&sent).unwrap());
}

#[tokio::test]
async fn test_invalid_charset_falls_back_to_utf8() {
    let (logs, _guard) = capture_logs();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "text/plain; charset=bogus-charset")
        .body(Body::from("héllo"))
        .unwrap();
    let (status, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&sent[..], "héllo".as_bytes());
    assert_eq!(logs.events("Incoming request")[0]["fields"]["body"], "héllo");
}

#[tokio::test]
async fn test_declared_charset_is_used_for_logging_only() {
    let (logs, _guard) = capture_logs();
    let latin1: &[u8] = &[0x63, 0x61, 0x66, 0xE9];

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "text/plain; charset=ISO-8859-1")
        .body(Body::from(latin1))
        .unwrap();
    let (_, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(&sent[..], latin1);
    assert_eq!(logs.events("Incoming request")[0]["fields"]["body"], "café");
}

#[tokio::test]
async fn test_logged_copy_is_capped_but_delivery_is_not() {
    let (logs, _guard) = capture_logs();
    let settings = CaptureSettings {
        enabled: true,
        max_request_payload: 16,
        ..CaptureSettings::default()
    };

    let request = Request::builder()
        .method(Method::POST)
        .uri("/length")
        .body(Body::from(vec![b'x'; 100]))
        .unwrap();
    let (status, sent) = send(filtered(settings), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&sent[..], b"100");

    let requests = logs.events("Incoming request");
    assert_eq!(requests[0]["fields"]["body"], "x".repeat(16));
    assert_eq!(requests[0]["fields"]["body_truncated"], true);
}

#[tokio::test]
async fn test_default_cap_is_one_mebibyte() {
    let (logs, _guard) = capture_logs();
    let size = 1024 * 1024 + 512;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/length")
        .body(Body::from(vec![b'y'; size]))
        .unwrap();
    let (_, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(std::str::from_utf8(&sent).unwrap(), size.to_string());
    let logged = logs.events("Incoming request")[0]["fields"]["body"]
        .as_str()
        .unwrap()
        .len();
    assert_eq!(logged, 1024 * 1024);
}

#[tokio::test]
async fn test_panicking_handler_is_still_observed_and_flushed() {
    let (logs, _guard) = capture_logs();

    let request = Request::builder().uri("/explode").body(Body::empty()).unwrap();
    let (status, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&sent[..], br#"{"message":"boom"}"#);
    assert_eq!(logs.events("Incoming request").len(), 1);

    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 500);
    assert_eq!(responses[0]["fields"]["body"], r#"{"message":"boom"}"#);
}

#[tokio::test]
async fn test_disabled_capture_passes_through_silently() {
    let (logs, _guard) = capture_logs();
    let settings = CaptureSettings {
        enabled: false,
        max_request_payload: 16,
        ..CaptureSettings::default()
    };

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .body(Body::from("untouched"))
        .unwrap();
    let (_, sent) = send(filtered(settings), request).await;

    assert_eq!(&sent[..], b"untouched");
    assert!(logs.events("Incoming request").is_empty());
    assert!(logs.events("Outgoing response").is_empty());
}

fn limited_service(max_body_bytes: usize) -> Router {
    let mut config = ServiceConfig::default();
    config.limits.max_body_bytes = max_body_bytes;
    HttpServer::new(config).router()
}

fn assert_rejected_as_too_large(logs: &LogSink, status: StatusCode, sent: &Bytes) {
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(sent).unwrap();
    assert_eq!(
        body["message"],
        "Failed to read request body: request body exceeds 2097152 bytes"
    );

    assert_eq!(logs.events("Incoming request").len(), 1);
    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 400);
    assert_eq!(responses[0]["fields"]["content_type"], "application/json");
}

#[tokio::test]
async fn test_declared_oversized_body_is_observed_and_enveloped() {
    let (logs, _guard) = capture_logs();
    let size = 3 * 1024 * 1024;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/employee")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, size.to_string())
        .body(Body::from(vec![b'x'; size]))
        .unwrap();
    let (status, sent) = send(limited_service(2 * 1024 * 1024), request).await;

    assert_rejected_as_too_large(&logs, status, &sent);
}

#[tokio::test]
async fn test_streamed_oversized_body_is_observed_and_enveloped() {
    let (logs, _guard) = capture_logs();
    let chunks: Vec<Result<Bytes, std::io::Error>> = (0..3)
        .map(|_| Ok(Bytes::from(vec![b'x'; 1024 * 1024])))
        .collect();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/employee")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap();
    let (status, sent) = send(limited_service(2 * 1024 * 1024), request).await;

    assert_rejected_as_too_large(&logs, status, &sent);
}

#[tokio::test]
async fn test_failed_request_stream_is_observed_as_400() {
    let (logs, _guard) = capture_logs();
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(std::io::Error::other("client went away")),
    ];

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap();
    let (status, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&sent).unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to read request body"));

    let requests = logs.events("Incoming request");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["fields"]["body"], "partial");

    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 400);
}

#[tokio::test]
async fn test_failed_response_stream_is_observed_as_500() {
    let (logs, _guard) = capture_logs();

    let request = Request::builder().uri("/broken").body(Body::empty()).unwrap();
    let (status, sent) = send(filtered(CaptureSettings::default()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&sent[..], br#"{"message":"Failed to produce response body"}"#);

    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 500);
    assert_eq!(
        responses[0]["fields"]["body"],
        r#"{"message":"Failed to produce response body"}"#
    );
}

#[tokio::test]
async fn test_timed_out_request_is_observed_once() {
    let (logs, _guard) = capture_logs();
    let mut config = ServiceConfig::default();
    config.timeouts.request_secs = 1;
    let router = HttpServer::layered(Router::new().route("/slow", get(slow)), &config);

    let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
    let (status, _) = send(router, request).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(logs.events("Incoming request").len(), 1);
    let responses = logs.events("Outgoing response");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["fields"]["status"], 408);
}
