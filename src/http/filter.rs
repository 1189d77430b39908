//! Request/response observability filter.
//!
//! # Data Flow
//! ```text
//! Start     → span keyed by path, stopwatch, wrap request
//! Dispatch  → read body once, rebuild request, run the rest of the stack
//! Observe   → log request line, log response line, record metrics
//! Flush     → release the held-back response bytes, exactly once
//! ```
//!
//! # Design Decisions
//! - Every buffer is owned by this call; nothing is shared between requests
//! - Handler failures arrive here as responses (typed errors are translated
//!   by the router, panics by the catch-panic layer), so Observe and Flush
//!   always run
//! - Observe only borrows the buffers Flush later consumes

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::config::ServiceConfig;
use crate::http::body::{DEFAULT_MAX_BODY, DEFAULT_MAX_PAYLOAD};
use crate::http::error::{HttpError, RouteError};
use crate::http::request::{CachingRequest, CapturedRequest};
use crate::http::response::CachingResponse;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;

/// Settings the filter runs with.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub enabled: bool,
    pub max_request_payload: usize,
    /// Bodies above this are answered with 400 before dispatch.
    pub max_body: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_request_payload: DEFAULT_MAX_PAYLOAD,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

impl From<&ServiceConfig> for CaptureSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            enabled: config.capture.enabled,
            max_request_payload: config.capture.max_request_payload_bytes,
            max_body: config.limits.max_body_bytes,
        }
    }
}

/// Middleware entry point; mount once, outside the route table.
pub async fn logging_filter(
    State(settings): State<CaptureSettings>,
    request: Request,
    next: Next,
) -> Response {
    if !settings.enabled {
        return next.run(request).await;
    }

    let span = tracing::info_span!("request", path = %request.uri().path());
    exchange(settings, request, next).instrument(span).await
}

async fn exchange(settings: CaptureSettings, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request_id(request.headers());

    let mut caching_request =
        CachingRequest::new(request, settings.max_request_payload, settings.max_body);
    let (response, captured_request) = match caching_request.body().await {
        Ok(_) => {
            let (request, captured) = caching_request.split();
            (next.run(request).await, captured)
        }
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Failed to read request body");
            let (_, captured) = caching_request.split();
            let rejection = RouteError::from(HttpError::bad_request(format!(
                "Failed to read request body: {err}"
            )));
            (rejection.into_response(), captured)
        }
    };

    let caching_response = match CachingResponse::buffer(response).await {
        Ok(buffered) => buffered,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Failed to drain response body");
            CachingResponse::from_error(&HttpError::internal("Failed to produce response body"))
        }
    };

    observe(&request_id, &captured_request, &caching_response, started);

    caching_response.copy_body_to_response()
}

fn observe(
    request_id: &str,
    request: &CapturedRequest,
    response: &CachingResponse,
    started: Instant,
) {
    let elapsed = started.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %request.method,
        uri = %request.uri.path(),
        content_type = request.content_type.as_deref().unwrap_or_default(),
        body = %request.body.text(),
        body_truncated = request.body.is_truncated(),
        time_taken_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "Incoming request"
    );

    tracing::info!(
        request_id = %request_id,
        status = response.status().as_u16(),
        content_type = response.content_type().unwrap_or_default(),
        body = %response.captured().text(),
        "Outgoing response"
    );

    metrics::record_request(request.method.as_str(), response.status().as_u16(), elapsed);
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
