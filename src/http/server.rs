//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from the route table
//! - Wire up middleware (trace, request ID, limits, capture filter,
//!   timeout, panic recovery)
//! - Bind server to listener and shut down gracefully
//!
//! # Middleware order (outermost first)
//! ```text
//! TraceLayer → SetRequestId → PropagateRequestId → DefaultBodyLimit
//!     → logging_filter → Timeout → CatchPanic → route table
//! ```
//! The filter sits outside timeout and panic recovery so both still
//! produce a response it can observe and flush. It also enforces the body
//! limit itself, so oversized requests are logged and enveloped like any
//! other failure. `DefaultBodyLimit` covers the extractors when capture is
//! disabled.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::employee::{EmployeeRepository, EmployeeResource, InMemoryEmployeeRepository};
use crate::http::error::RouteError;
use crate::http::filter::{logging_filter, CaptureSettings};
use crate::http::request_id::{UuidRequestId, X_REQUEST_ID};
use crate::routing::route_table;

/// HTTP server for the employee service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server backed by an empty in-memory repository.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_repository(config, Arc::new(InMemoryEmployeeRepository::new()))
    }

    /// Create a new HTTP server backed by `repository`.
    pub fn with_repository(config: ServiceConfig, repository: Arc<dyn EmployeeRepository>) -> Self {
        let router = Self::layered(route_table(EmployeeResource::new(repository)), &config);
        Self { router, config }
    }

    /// Wrap `routes` in the full middleware stack.
    #[allow(deprecated)]
    pub fn layered(routes: Router, config: &ServiceConfig) -> Router {
        routes
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(
                CaptureSettings::from(config),
                logging_filter,
            ))
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Translate a handler panic into the 500 error envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "Handler panicked".to_string()
    };
    RouteError::unclassified(message).into_response()
}
