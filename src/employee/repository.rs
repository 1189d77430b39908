//! Employee persistence.
//!
//! `EmployeeRepository` is the seam handlers talk to. The bundled
//! implementation keeps records in a `DashMap` and can snapshot them to a
//! JSON file across restarts.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use thiserror::Error;

use crate::employee::model::Employee;

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("employee has no id")]
    MissingId,

    #[error("employee {0} does not exist")]
    Missing(i64),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is malformed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// CRUD store for employees.
pub trait EmployeeRepository: Send + Sync {
    /// Store a new employee, assigning a fresh id.
    fn persist(&self, employee: Employee) -> Result<Employee, RepositoryError>;

    fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepositoryError>;

    /// All employees in ascending id order.
    fn find_all(&self) -> Result<Vec<Employee>, RepositoryError>;

    /// Replace an existing employee. Last write wins.
    fn update(&self, employee: Employee) -> Result<Employee, RepositoryError>;
}

/// Thread-safe in-memory repository.
#[derive(Debug)]
pub struct InMemoryEmployeeRepository {
    employees: DashMap<i64, Employee>,
    next_id: AtomicI64,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryEmployeeRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self {
            employees: DashMap::new(),
            next_id: AtomicI64::new(1),
            snapshot_path: None,
        }
    }

    /// Load from a snapshot file if it exists; later saves go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let mut repository = Self::new();
        repository.snapshot_path = Some(path.to_path_buf());

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let employees: Vec<Employee> = serde_json::from_reader(reader)?;
            let mut max_id = 0;
            for employee in employees {
                let id = employee.id.ok_or(RepositoryError::MissingId)?;
                max_id = max_id.max(id);
                repository.employees.insert(id, employee);
            }
            repository.next_id.store(max_id + 1, Ordering::SeqCst);
            tracing::info!(
                path = %path.display(),
                count = repository.employees.len(),
                "Loaded employee snapshot"
            );
        }
        Ok(repository)
    }

    /// Write the snapshot, if a snapshot path is configured.
    pub fn save_to_file(&self) -> Result<(), RepositoryError> {
        if let Some(path) = &self.snapshot_path {
            let employees = self.sorted();
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(writer, &employees)?;
            tracing::info!(
                path = %path.display(),
                count = employees.len(),
                "Saved employee snapshot"
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    fn sorted(&self) -> Vec<Employee> {
        let mut employees: Vec<Employee> = self
            .employees
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        employees.sort_by_key(|employee| employee.id);
        employees
    }
}

impl Default for InMemoryEmployeeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeRepository for InMemoryEmployeeRepository {
    fn persist(&self, mut employee: Employee) -> Result<Employee, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        employee.id = Some(id);
        self.employees.insert(id, employee.clone());
        Ok(employee)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.employees.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_all(&self) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self.sorted())
    }

    fn update(&self, employee: Employee) -> Result<Employee, RepositoryError> {
        let id = employee.id.ok_or(RepositoryError::MissingId)?;
        match self.employees.get_mut(&id) {
            Some(mut stored) => {
                *stored = employee.clone();
                Ok(employee)
            }
            None => Err(RepositoryError::Missing(id)),
        }
    }
}
