//! Response-side body capture.
//!
//! # Responsibilities
//! - Collect every frame the handler produced into a `CapturedBody`
//! - Hold the bytes back from the client until explicitly flushed
//! - Flush exactly once, with the payload unchanged
//!
//! # Design Decisions
//! - `copy_body_to_response` consumes the wrapper, so a second flush
//!   cannot be written
//! - The response side is not capped: the whole body is held for flushing
//!   anyway, and the logged copy is the same buffer

use axum::{
    body::{Body, Bytes},
    http::{header, response::Parts, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::StreamExt;

use crate::http::body::{resolve_charset, CapturedBody};
use crate::http::error::{error_body, HttpError};

/// Decorator over an outbound response that holds its body until flushed.
#[derive(Debug)]
pub struct CachingResponse {
    parts: Parts,
    body: CapturedBody,
}

impl CachingResponse {
    /// Drain the handler's response body into the buffer.
    pub async fn buffer(response: Response) -> Result<Self, axum::Error> {
        let (parts, body) = response.into_parts();
        let mut captured = CapturedBody::unbounded(resolve_charset(&parts.headers));
        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            captured.append(&chunk?);
        }
        Ok(Self {
            parts,
            body: captured,
        })
    }

    /// A buffered error envelope, used when the handler's body could not be drained.
    pub fn from_error(error: &HttpError) -> Self {
        let (mut parts, ()) = Response::new(()).into_parts();
        parts.status = error.status();
        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let mut body = CapturedBody::unbounded(encoding_rs::UTF_8);
        body.append(&error_body(error.message()));
        Self { parts, body }
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn captured(&self) -> &CapturedBody {
        &self.body
    }

    /// Release the held-back bytes to the real response.
    pub fn copy_body_to_response(self) -> Response {
        let Self { mut parts, body } = self;
        let bytes = Bytes::from(body.into_bytes());
        parts.headers.remove(header::TRANSFER_ENCODING);
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        Response::from_parts(parts, Body::from(bytes))
    }
}
