//! HTTP error taxonomy and the central error translation.
//!
//! # Responsibilities
//! - Define the closed set of typed failures a handler may produce
//! - Translate every handler failure into a uniform `{ "message": ... }` body
//!
//! # Design Decisions
//! - `ErrorKind` is closed: the status mapping is one exhaustive match
//! - `RouteError` is the only error type handlers return
//! - Unclassified failures become 500; their detail goes to the log only

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::employee::repository::RepositoryError;

/// The fixed set of failure kinds, each bound to one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    InternalError,
}

impl ErrorKind {
    /// HTTP status carried by this kind.
    pub const fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A typed failure: a kind (and therefore a status) plus a message.
///
/// Immutable once built. An empty message is replaced by the status'
/// canonical reason phrase so the wire body never carries `""`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    kind: ErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.status()
                .canonical_reason()
                .unwrap_or("Error")
                .to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub message: &'a str,
}

/// Serialize the error envelope for `message`.
pub fn error_body(message: &str) -> Vec<u8> {
    // A struct holding one string cannot fail to serialize.
    serde_json::to_vec(&ErrorBody { message }).unwrap_or_default()
}

/// Any failure a handler can produce.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A failure from the closed taxonomy; answered with its own status.
    #[error(transparent)]
    Typed(#[from] HttpError),

    /// Anything else; answered with 500.
    #[error("{0}")]
    Unclassified(Box<dyn std::error::Error + Send + Sync>),
}

impl RouteError {
    pub fn unclassified(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RouteError::Unclassified(source.into())
    }

    /// Status this failure is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Typed(err) => err.status(),
            RouteError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for RouteError {
    fn from(err: RepositoryError) -> Self {
        RouteError::Unclassified(Box::new(err))
    }
}

impl From<JsonRejection> for RouteError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::bad_request(rejection.body_text()).into()
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            RouteError::Typed(err) => {
                tracing::debug!(status = status.as_u16(), message = %err, "Handler failed");
            }
            RouteError::Unclassified(source) => {
                tracing::error!(error = ?source, "Unhandled handler failure");
            }
        }
        let message = self.to_string();
        (status, Json(ErrorBody { message: &message })).into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        RouteError::from(self).into_response()
    }
}
