//! Store error taxonomy.

use thiserror::Error;

/// Errors returned by an [`EmployeeStore`](crate::store::EmployeeStore).
///
/// `Display` yields the store's own text; the API exposes it verbatim on 500.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{message}")]
    UniqueViolation {
        /// Constraint name, when the store reported one.
        constraint: Option<String>,
        message: String,
    },

    /// The store answered with an error status.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never completed (connection failure, timeout).
    #[error("{0}")]
    Transport(String),

    /// The store's response could not be decoded.
    #[error("invalid response from store: {0}")]
    Decode(String),

    /// The client could not be constructed.
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this is a unique violation on `constraint`.
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(
            self,
            StoreError::UniqueViolation { constraint: Some(name), .. } if name == constraint
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violates_matches_constraint_name() {
        let err = StoreError::UniqueViolation {
            constraint: Some("employees_email_key".into()),
            message: "duplicate key value violates unique constraint \"employees_email_key\"".into(),
        };
        assert!(err.violates("employees_email_key"));
        assert!(!err.violates("employees_emp_id_key"));

        let unnamed = StoreError::UniqueViolation { constraint: None, message: "dup".into() };
        assert!(!unnamed.violates("employees_email_key"));
    }

    #[test]
    fn test_display_is_raw_text() {
        let err = StoreError::Rejected {
            status: 400,
            code: Some("22P02".into()),
            message: "invalid input syntax for type numeric".into(),
        };
        assert_eq!(err.to_string(), "invalid input syntax for type numeric");
        assert_eq!(StoreError::Transport("connection refused".into()).to_string(), "connection refused");
    }
}
