//! HTTP boundary layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request_id.rs (x-request-id assigned)
//!     → filter.rs (capture cycle: wrap, dispatch, observe, flush)
//!         → request.rs (request body read once, mirrored into body.rs)
//!         → routing (handler, error translation via error.rs)
//!         → response.rs (response body held back until flushed)
//!     → Send to client
//! ```

pub mod body;
pub mod error;
pub mod filter;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

pub use error::{ErrorKind, HttpError, RouteError};
pub use filter::{logging_filter, CaptureSettings};
pub use request_id::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
