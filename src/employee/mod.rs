//! Employee resource.
//!
//! # Data Flow
//! ```text
//! routing (method + path)
//!     → resource.rs (decode, call repository, encode)
//!     → repository.rs (DashMap store, optional JSON snapshot)
//! ```

pub mod model;
pub mod repository;
pub mod resource;

pub use model::{Employee, EmployeeUpdate, Employees};
pub use repository::{EmployeeRepository, InMemoryEmployeeRepository, RepositoryError};
pub use resource::EmployeeResource;
