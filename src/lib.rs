//! Employee CRUD service with a body-capturing observability filter.

pub mod config;
pub mod employee;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
