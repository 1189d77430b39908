//! Path-variable extraction.
//!
//! Malformed path variables are client errors: they reject with
//! `BadRequest` through the same error translation as handler failures.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::http::error::{HttpError, RouteError};

/// The `{id}` segment of an employee path, parsed as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployeeId(pub i64);

impl<S> FromRequestParts<S> for EmployeeId
where
    S: Send + Sync,
{
    type Rejection = RouteError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| HttpError::bad_request(rejection.body_text()))?;

        raw.trim()
            .parse::<i64>()
            .map(EmployeeId)
            .map_err(|_| HttpError::bad_request(format!("Invalid employee id: {raw}")).into())
    }
}
