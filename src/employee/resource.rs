//! Employee HTTP handlers.
//!
//! Handlers only talk to the repository and return `RouteError` on
//! failure; status codes are decided by the router's error translation.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::employee::model::{Employee, EmployeeUpdate, Employees};
use crate::employee::repository::EmployeeRepository;
use crate::http::error::{HttpError, RouteError};
use crate::routing::params::EmployeeId;

/// Handler state: the repository collaborator.
#[derive(Clone)]
pub struct EmployeeResource {
    repository: Arc<dyn EmployeeRepository>,
}

impl EmployeeResource {
    pub fn new(repository: Arc<dyn EmployeeRepository>) -> Self {
        Self { repository }
    }

    fn find_existing(&self, id: i64) -> Result<Employee, RouteError> {
        self.repository
            .find_by_id(id)?
            .ok_or_else(|| HttpError::not_found(format!("Employee with id {id} not found")).into())
    }
}

/// `POST /employee`
pub async fn save(
    State(resource): State<EmployeeResource>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Result<Json<Employee>, RouteError> {
    let Json(employee) = payload?;
    let stored = resource.repository.persist(employee)?;
    tracing::debug!(id = ?stored.id, "Employee created");
    Ok(Json(stored))
}

/// `GET /employee`
pub async fn fetch_all(
    State(resource): State<EmployeeResource>,
) -> Result<Json<Employees>, RouteError> {
    let employees = resource.repository.find_all()?;
    Ok(Json(Employees { employees }))
}

/// `GET /employee/{id}`
pub async fn fetch_by_id(
    State(resource): State<EmployeeResource>,
    EmployeeId(id): EmployeeId,
) -> Result<Json<Employee>, RouteError> {
    resource.find_existing(id).map(Json)
}

/// `PUT /employee/{id}`
pub async fn update(
    State(resource): State<EmployeeResource>,
    EmployeeId(id): EmployeeId,
    payload: Result<Json<EmployeeUpdate>, JsonRejection>,
) -> Result<Json<Employee>, RouteError> {
    let mut employee = resource.find_existing(id)?;
    let Json(update) = payload?;
    update.apply_to(&mut employee);
    let updated = resource.repository.update(employee)?;
    tracing::debug!(id, "Employee updated");
    Ok(Json(updated))
}
