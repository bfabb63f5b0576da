//! PostgREST client for a managed Postgres (Supabase) employees table.
//!
//! # Responsibilities
//! - Build table-scoped select/insert/update/delete requests
//! - Authenticate with the project access key
//! - Turn PostgREST error bodies into [`StoreError`] variants
//! - Bound every request with the configured timeout

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::StoreConfig;
use crate::store::{Employee, EmployeeChanges, EmployeeStore, NewEmployee, StoreError, StoreResult};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Store backed by the PostgREST HTTP interface.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    /// `<url>/rest/v1/<table>`
    endpoint: Url,
    api_key: String,
    timeout_secs: u64,
}

impl RestStore {
    /// Create a client for the table named in `config`.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let mut base = Url::parse(config.url.trim())
            .map_err(|e| StoreError::Config(format!("invalid store url '{}': {}", config.url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("rest/v1/{}", config.table))
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        tracing::debug!(endpoint = %endpoint, "REST store client created");

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Table endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    /// Request that asks PostgREST to return the affected rows.
    fn returning(&self, method: Method) -> RequestBuilder {
        self.request(method).header("Prefer", "return=representation")
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<Employee>> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        self.rows(response).await
    }

    async fn rows(&self, response: Response) -> StoreResult<Vec<Employee>> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Transport(format!("store request timed out after {}s", self.timeout_secs))
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl EmployeeStore for RestStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let request = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.send(request).await
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Vec<Employee>> {
        let request = self.returning(Method::POST).json(&employee);
        self.send(request).await
    }

    async fn update_employee(
        &self,
        emp_id: &str,
        changes: EmployeeChanges,
    ) -> StoreResult<Vec<Employee>> {
        let request = self
            .returning(Method::PATCH)
            .query(&[("emp_id", format!("eq.{}", emp_id))])
            .json(&changes);
        self.send(request).await
    }

    async fn delete_employee(&self, emp_id: &str) -> StoreResult<Vec<Employee>> {
        let request = self
            .returning(Method::DELETE)
            .query(&[("emp_id", format!("eq.{}", emp_id))]);
        self.send(request).await
    }

    async fn ping(&self) -> StoreResult<()> {
        let request = self
            .request(Method::GET)
            .query(&[("select", "emp_id"), ("limit", "1")]);
        self.send(request).await.map(|_| ())
    }
}

/// Map a PostgREST error response to a [`StoreError`].
fn parse_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("store returned {}", status)
            } else {
                body.trim().to_string()
            }
        });

    if parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
        let constraint = constraint_name(&message)
            .or_else(|| parsed.details.as_deref().and_then(constraint_name));
        return StoreError::UniqueViolation { constraint, message };
    }

    StoreError::Rejected {
        status: status.as_u16(),
        code: parsed.code,
        message,
    }
}

/// Extract `name` from `... constraint "name"`.
fn constraint_name(text: &str) -> Option<String> {
    let start = text.find("constraint \"")? + "constraint \"".len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    let name = &rest[..end];
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> StoreConfig {
        StoreConfig {
            url: url.to_string(),
            api_key: "key".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_endpoint_joins_table() {
        let store = RestStore::new(&config("https://abc.supabase.co")).unwrap();
        assert_eq!(store.endpoint().as_str(), "https://abc.supabase.co/rest/v1/employees");

        let store = RestStore::new(&config("http://localhost:54321/proxy")).unwrap();
        assert_eq!(store.endpoint().as_str(), "http://localhost:54321/proxy/rest/v1/employees");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        assert!(matches!(RestStore::new(&config("not a url")), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_unique_violation_parsed() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@x.com) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"employees_email_key\""}"#;
        match parse_error(StatusCode::CONFLICT, body) {
            StoreError::UniqueViolation { constraint, message } => {
                assert_eq!(constraint.as_deref(), Some("employees_email_key"));
                assert!(message.starts_with("duplicate key value"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_rejected() {
        let body = r#"{"code":"PGRST204","message":"Could not find the 'salery' column"}"#;
        assert_eq!(
            parse_error(StatusCode::BAD_REQUEST, body),
            StoreError::Rejected {
                status: 400,
                code: Some("PGRST204".into()),
                message: "Could not find the 'salery' column".into(),
            }
        );

        match parse_error(StatusCode::BAD_GATEWAY, "upstream down") {
            StoreError::Rejected { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_constraint_name() {
        assert_eq!(
            constraint_name("violates unique constraint \"employees_emp_id_key\"").as_deref(),
            Some("employees_emp_id_key")
        );
        assert_eq!(constraint_name("no constraint here"), None);
        assert_eq!(constraint_name("constraint \"\""), None);
    }
}
