//! Route table construction.
//!
//! # Responsibilities
//! - Bind method + path pattern to handlers
//! - Answer unmatched paths through the same error envelope
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards
//! - Handlers return `RouteError`; its `IntoResponse` impl is the single
//!   place statuses are decided
//! - Greeting and employee routes are separate tables merged at the end

use axum::{
    extract::Path,
    http::{Method, Uri},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::employee::resource::{self, EmployeeResource};
use crate::http::error::{HttpError, RouteError};

/// `{ "message": ... }` success payload of the greeting routes.
#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
}

/// The complete route table.
pub fn route_table(employees: EmployeeResource) -> Router {
    hello_routes()
        .merge(employee_routes(employees))
        .fallback(route_not_found)
}

/// `/hello` and `/hello/{name}`.
pub fn hello_routes() -> Router {
    Router::new()
        .route("/hello", get(greet_anonymous))
        .route("/hello/{name}", get(greet_user))
}

/// CRUD routes under `/employee`.
pub fn employee_routes(employees: EmployeeResource) -> Router {
    Router::new()
        .route("/employee", get(resource::fetch_all).post(resource::save))
        .route(
            "/employee/{id}",
            get(resource::fetch_by_id).put(resource::update),
        )
        .with_state(employees)
}

async fn greet_anonymous() -> Json<Greeting> {
    Json(Greeting {
        message: "Hello world".to_string(),
    })
}

async fn greet_user(Path(name): Path<String>) -> Json<Greeting> {
    Json(Greeting {
        message: format!("Hello {name}"),
    })
}

async fn route_not_found(method: Method, uri: Uri) -> RouteError {
    HttpError::not_found(format!("No route for {method} {}", uri.path())).into()
}
