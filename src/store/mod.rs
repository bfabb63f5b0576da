//! Employee data store subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → Arc<dyn EmployeeStore> (injected at startup)
//!         → rest.rs   (PostgREST over HTTP, production)
//!         → memory.rs (in-process table, local runs and tests)
//!     ← rows affected, or StoreError
//! ```
//!
//! # Design Decisions
//! - Every operation returns the rows it touched; "not found" is an empty
//!   result, never an error
//! - Unique violations are a typed variant carrying the constraint name, so
//!   the HTTP layer never inspects error text

pub mod error;
pub mod memory;
pub mod model;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{Employee, EmployeeChanges, NewEmployee};
pub use rest::RestStore;

/// Table-scoped operations the API needs from its data store.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// All rows, newest `created_at` first.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Insert one row; returns what the store wrote.
    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Vec<Employee>>;

    /// Overwrite the mutable fields of rows whose `emp_id` matches.
    async fn update_employee(
        &self,
        emp_id: &str,
        changes: EmployeeChanges,
    ) -> StoreResult<Vec<Employee>>;

    /// Delete rows whose `emp_id` matches; returns the removed rows.
    async fn delete_employee(&self, emp_id: &str) -> StoreResult<Vec<Employee>>;

    /// Cheap connectivity check.
    async fn ping(&self) -> StoreResult<()>;
}

/// Build the store selected by `config.backend`.
pub fn build_store(config: &StoreConfig) -> StoreResult<Arc<dyn EmployeeStore>> {
    match config.backend {
        StoreBackend::Rest => Ok(Arc::new(RestStore::new(config)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(config))),
    }
}
