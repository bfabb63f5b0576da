//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values that parse but cannot work
//! (missing store credentials, unparseable addresses, zero timeouts). Every
//! problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, StoreBackend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("store.url: {0}")]
    InvalidUrl(String),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.store.backend == StoreBackend::Rest {
        if config.store.url.trim().is_empty() {
            errors.push(ValidationError::Missing { field: "store.url (SUPABASE_URL)" });
        } else {
            match url::Url::parse(&config.store.url) {
                Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
                Ok(u) => errors.push(ValidationError::InvalidUrl(format!(
                    "unsupported scheme '{}'",
                    u.scheme()
                ))),
                Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
            }
        }
        if config.store.api_key.trim().is_empty() {
            errors.push(ValidationError::Missing { field: "store.api_key (SUPABASE_ANON_KEY)" });
        }
    }

    if config.store.table.trim().is_empty() {
        errors.push(ValidationError::Missing { field: "store.table" });
    }
    if config.store.emp_id_constraint.trim().is_empty() {
        errors.push(ValidationError::Missing { field: "store.emp_id_constraint" });
    }
    if config.store.email_constraint.trim().is_empty() {
        errors.push(ValidationError::Missing { field: "store.email_constraint" });
    }

    if config.store.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "store.timeout_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.request_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.store.url = "https://project.supabase.co".to_string();
        config.store.api_key = "anon-key".to_string();
        config
    }

    #[test]
    fn test_valid_rest_config() {
        assert!(validate_config(&rest_config()).is_ok());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let mut config = ServiceConfig::default();
        config.store.backend = StoreBackend::Memory;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let errors = validate_config(&ServiceConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.to_string().contains("SUPABASE_URL")));
        assert!(errors.iter().any(|e| e.to_string().contains("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn test_bad_values_collected() {
        let mut config = rest_config();
        config.store.url = "ftp://example.com".to_string();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "timeouts.request_secs" }));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = rest_config();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
