//! In-process employees table.
//!
//! Enforces the same unique constraints as the managed table and reports
//! violations the way Postgres words them, so the HTTP layer behaves the same
//! against either backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::store::{Employee, EmployeeChanges, EmployeeStore, NewEmployee, StoreError, StoreResult};

#[derive(Default)]
struct Table {
    rows: Vec<Employee>,
    next_id: u64,
    last_created: Option<DateTime<Utc>>,
}

impl Table {
    /// Strictly increasing insert timestamp.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Memory-backed [`EmployeeStore`].
pub struct MemoryStore {
    table: RwLock<Table>,
    emp_id_constraint: String,
    email_constraint: String,
}

impl MemoryStore {
    /// Create an empty table using the constraint names from `config`.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            emp_id_constraint: config.emp_id_constraint.clone(),
            email_constraint: config.email_constraint.clone(),
        }
    }

    fn violation(constraint: &str) -> StoreError {
        StoreError::UniqueViolation {
            constraint: Some(constraint.to_string()),
            message: format!("duplicate key value violates unique constraint \"{}\"", constraint),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let table = self.table.read().await;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Vec<Employee>> {
        let mut table = self.table.write().await;

        if table.rows.iter().any(|r| r.emp_id == employee.emp_id) {
            return Err(Self::violation(&self.emp_id_constraint));
        }
        if table.rows.iter().any(|r| r.email.as_deref() == Some(employee.email.as_str())) {
            return Err(Self::violation(&self.email_constraint));
        }

        table.next_id += 1;
        let mut extra = Map::new();
        extra.insert("id".to_string(), Value::from(table.next_id));

        let row = Employee {
            emp_id: employee.emp_id,
            name: employee.name,
            email: Some(employee.email),
            department: employee.department,
            salary: employee.salary,
            created_at: Some(table.stamp()),
            extra,
        };
        table.rows.push(row.clone());
        Ok(vec![row])
    }

    async fn update_employee(
        &self,
        emp_id: &str,
        changes: EmployeeChanges,
    ) -> StoreResult<Vec<Employee>> {
        let mut table = self.table.write().await;

        // An update that matches nothing cannot violate a constraint.
        if !table.rows.iter().any(|r| r.emp_id == emp_id) {
            return Ok(Vec::new());
        }

        if let Some(email) = changes.email.as_deref() {
            let taken = table
                .rows
                .iter()
                .any(|r| r.emp_id != emp_id && r.email.as_deref() == Some(email));
            if taken {
                return Err(Self::violation(&self.email_constraint));
            }
        }

        let mut updated = Vec::new();
        for row in table.rows.iter_mut().filter(|r| r.emp_id == emp_id) {
            row.name = changes.name.clone();
            row.email = changes.email.clone();
            row.department = changes.department.clone();
            row.salary = changes.salary.clone();
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete_employee(&self, emp_id: &str) -> StoreResult<Vec<Employee>> {
        let mut table = self.table.write().await;
        let (removed, kept): (Vec<_>, Vec<_>) =
            table.rows.drain(..).partition(|r| r.emp_id == emp_id);
        table.rows = kept;
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_employee(emp_id: &str, email: &str) -> NewEmployee {
        NewEmployee {
            emp_id: emp_id.to_string(),
            name: None,
            email: email.to_string(),
            department: None,
            salary: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::default();
        for id in ["A", "B", "C"] {
            store.insert_employee(new_employee(id, &format!("{id}@x.com"))).await.unwrap();
        }

        let ids: Vec<_> = store
            .list_employees()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.emp_id)
            .collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = MemoryStore::default();
        store.insert_employee(new_employee("E1", "a@x.com")).await.unwrap();

        let err = store.insert_employee(new_employee("E1", "b@x.com")).await.unwrap_err();
        assert!(err.violates("employees_emp_id_key"));

        let err = store.insert_employee(new_employee("E2", "a@x.com")).await.unwrap_err();
        assert!(err.violates("employees_email_key"));
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"employees_email_key\""
        );
    }

    #[tokio::test]
    async fn test_update_overwrites_and_checks_email() {
        let store = MemoryStore::default();
        store.insert_employee(new_employee("E1", "a@x.com")).await.unwrap();
        store.insert_employee(new_employee("E2", "b@x.com")).await.unwrap();

        let err = store
            .update_employee("E2", EmployeeChanges { email: Some("a@x.com".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(err.violates("employees_email_key"));

        // Keeping one's own email is not a conflict.
        let rows = store
            .update_employee("E1", EmployeeChanges { email: Some("a@x.com".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = store
            .update_employee("E1", EmployeeChanges { name: Some("B".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("B"));
        assert_eq!(rows[0].email, None);

        assert!(store.update_employee("missing", EmployeeChanges::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_row_ignores_taken_email() {
        let store = MemoryStore::default();
        store.insert_employee(new_employee("E1", "a@x.com")).await.unwrap();

        let rows = store
            .update_employee("NOPE", EmployeeChanges { email: Some("a@x.com".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = MemoryStore::default();
        store.insert_employee(new_employee("E1", "a@x.com")).await.unwrap();

        assert_eq!(store.delete_employee("E1").await.unwrap().len(), 1);
        assert!(store.delete_employee("E1").await.unwrap().is_empty());
        assert!(store.list_employees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::default();
        let rows = store.insert_employee(new_employee("E1", "a@x.com")).await.unwrap();
        assert!(rows[0].created_at.is_some());
        assert_eq!(rows[0].extra.get("id"), Some(&Value::from(1u64)));
    }
}
