//! Employee records and their wire shapes.

use serde::{Deserialize, Serialize};

/// A stored (or to-be-stored) employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Assigned by the repository on persist; `null` before that.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Employee {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Envelope for the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employees {
    pub employees: Vec<Employee>,
}

/// The mutable fields of an employee, as submitted to the update endpoint.
///
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl EmployeeUpdate {
    /// Overlay the submitted fields onto `employee`.
    pub fn apply_to(self, employee: &mut Employee) {
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if let Some(phone) = self.phone {
            employee.phone = phone;
        }
    }
}
