//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route table lookup)
//!     → params.rs (typed path variables)
//!     → handler → Result<_, RouteError>
//!     → http::error (RouteError → status + JSON envelope)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - One error translation for every route, no per-handler status logic

pub mod params;
pub mod router;

pub use params::EmployeeId;
pub use router::route_table;
