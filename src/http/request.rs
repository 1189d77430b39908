//! Request-side body capture.
//!
//! # Responsibilities
//! - Read the upstream request body exactly once
//! - Mirror each chunk into a capped `CapturedBody` as it is read
//! - Hand downstream code an untruncated, cheaply clonable copy
//!
//! # Design Decisions
//! - Buffering starts on the first `body()` call, later calls reuse it
//! - The cap applies to the logged copy only, never to delivery
//! - The delivery limit is enforced here, for declared and streamed
//!   lengths alike, so an oversized body fails the same way either way
//! - A request whose body was never read passes through uncaptured

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, request::Parts, Method, Uri},
};
use futures_util::StreamExt;
use thiserror::Error;

use crate::http::body::{resolve_charset, CapturedBody};

/// Why the request body could not be buffered.
#[derive(Debug, Error)]
pub enum BodyReadError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error(transparent)]
    Stream(#[from] axum::Error),
}

/// Decorator over an inbound request that caches its body.
#[derive(Debug)]
pub struct CachingRequest {
    parts: Parts,
    upstream: Option<Body>,
    max_body: usize,
    delivered: Bytes,
    capture: CapturedBody,
}

/// What the filter keeps of a request once it has been dispatched.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub content_type: Option<String>,
    pub body: CapturedBody,
}

impl CachingRequest {
    /// Wrap a request. Nothing is read until `body()` is called.
    ///
    /// `max_payload` caps the logged copy; `max_body` caps what is accepted
    /// at all.
    pub fn new(request: Request, max_payload: usize, max_body: usize) -> Self {
        let (parts, body) = request.into_parts();
        let capture = CapturedBody::bounded(max_payload, resolve_charset(&parts.headers));
        Self {
            parts,
            upstream: Some(body),
            max_body,
            delivered: Bytes::new(),
            capture,
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn captured(&self) -> &CapturedBody {
        &self.capture
    }

    /// The full request body.
    ///
    /// The first call drains the upstream stream; every later call returns
    /// the buffered copy. On a read error the bytes received so far stay
    /// buffered and captured. A declared `Content-Length` above the limit
    /// fails before anything is read.
    pub async fn body(&mut self) -> Result<Bytes, BodyReadError> {
        if let Some(upstream) = self.upstream.take() {
            if self.declared_length().is_some_and(|len| len > self.max_body) {
                return Err(BodyReadError::TooLarge {
                    limit: self.max_body,
                });
            }

            let mut delivered = Vec::new();
            let result = drain(upstream, self.max_body, &mut delivered, &mut self.capture).await;
            self.delivered = Bytes::from(delivered);
            result?;
        }
        Ok(self.delivered.clone())
    }

    fn declared_length(&self) -> Option<usize> {
        self.parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }

    /// Rebuild the request for downstream code and keep the capture.
    pub fn split(self) -> (Request, CapturedRequest) {
        let body = match self.upstream {
            Some(untouched) => untouched,
            None => Body::from(self.delivered),
        };
        let captured = CapturedRequest {
            method: self.parts.method.clone(),
            uri: self.parts.uri.clone(),
            content_type: self
                .parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            body: self.capture,
        };
        (Request::from_parts(self.parts, body), captured)
    }
}

async fn drain(
    upstream: Body,
    max_body: usize,
    delivered: &mut Vec<u8>,
    capture: &mut CapturedBody,
) -> Result<(), BodyReadError> {
    let mut stream = upstream.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        capture.append(&chunk);
        if delivered.len() + chunk.len() > max_body {
            return Err(BodyReadError::TooLarge { limit: max_body });
        }
        delivered.extend_from_slice(&chunk);
    }
    Ok(())
}
