//! Employee endpoint handlers.
//!
//! Each handler makes exactly one store call. Validation happens before it,
//! status mapping after it; nothing is retried.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{error, info, instrument, warn};

use crate::export;
use crate::http::response::{ApiError, MessageBody};
use crate::http::server::AppState;
use crate::store::model::{deserialize_salary, deserialize_text};
use crate::store::{Employee, EmployeeChanges, NewEmployee, StoreError};

/// Body of `PUT /api/employees/{empId}`. Absent fields are written as null.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: Option<Number>,
}

impl From<UpdateEmployeeRequest> for EmployeeChanges {
    fn from(req: UpdateEmployeeRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            department: req.department,
            salary: req.salary,
        }
    }
}

/// `GET /`
pub async fn health() -> &'static str {
    "Flask backend is running!"
}

/// `GET /api/employees`
#[instrument(name = "list_employees", skip(state))]
pub async fn list_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = state
        .store
        .list_employees()
        .await
        .map_err(|e| store_failure("list", e))?;
    Ok(Json(employees))
}

/// `GET /api/employees/export/csv`
#[instrument(name = "export_csv", skip(state))]
pub async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let employees = state
        .store
        .list_employees()
        .await
        .map_err(|e| store_failure("export", e))?;

    if employees.is_empty() {
        return Err(ApiError::NotFound("No employees found"));
    }

    let body = export::render_csv(&employees).map_err(|e| {
        error!(error = %e, "Failed to render CSV");
        ApiError::Internal
    })?;
    let disposition = format!("attachment; filename=\"{}\"", export::export_filename(Utc::now()));

    info!(rows = employees.len(), "Employees exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        body,
    )
        .into_response())
}

/// `POST /api/employees`
#[instrument(name = "create_employee", skip(state, payload))]
pub async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Employee>, ApiError> {
    let Json(body) = payload.map_err(bad_body)?;
    let employee = new_employee(&body)?;

    let store_config = &state.config.store;
    let rows = state.store.insert_employee(employee).await.map_err(|e| {
        classify_write(
            "insert",
            e,
            &[
                (store_config.emp_id_constraint.as_str(), "Employee ID already exists"),
                (store_config.email_constraint.as_str(), "Email already exists"),
            ],
        )
    })?;

    let created = rows.into_iter().next().ok_or_else(|| {
        warn!("Store accepted insert but returned no row");
        ApiError::BadRequest("Insert failed".to_string())
    })?;

    info!(emp_id = %created.emp_id, "Employee created");
    Ok(Json(created))
}

/// `PUT /api/employees/{empId}`
#[instrument(name = "update_employee", skip(state, payload))]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    payload: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> Result<Json<Employee>, ApiError> {
    let Json(request) = payload.map_err(bad_body)?;

    let store_config = &state.config.store;
    let rows = state
        .store
        .update_employee(&emp_id, request.into())
        .await
        .map_err(|e| {
            classify_write(
                "update",
                e,
                &[(store_config.email_constraint.as_str(), "Email already exists")],
            )
        })?;

    let updated = rows
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("Employee not found"))?;

    info!(emp_id = %updated.emp_id, "Employee updated");
    Ok(Json(updated))
}

/// `DELETE /api/employees/{empId}`
#[instrument(name = "delete_employee", skip(state))]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let removed = state
        .store
        .delete_employee(&emp_id)
        .await
        .map_err(|e| store_failure("delete", e))?;

    if removed.is_empty() {
        return Err(ApiError::NotFound("Employee not found"));
    }

    info!(emp_id = %emp_id, "Employee deleted");
    Ok(Json(MessageBody::new("Employee deleted successfully")))
}

/// Router fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

/// Build an insert from a create body: trim text, require `emp_id` then
/// `email`, decode `salary`.
fn new_employee(body: &Value) -> Result<NewEmployee, ApiError> {
    let emp_id = text_field(body, "emp_id").unwrap_or_default();
    if emp_id.is_empty() {
        return Err(ApiError::BadRequest("Employee ID is required".to_string()));
    }

    let email = text_field(body, "email").unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    let salary = deserialize_salary(body.get("salary").cloned().unwrap_or(Value::Null))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(NewEmployee {
        emp_id,
        name: text_field(body, "name").filter(|s| !s.is_empty()),
        email,
        department: text_field(body, "department").filter(|s| !s.is_empty()),
        salary,
    })
}

/// Trimmed text of `body[key]`; numbers are rendered, anything else is absent.
fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "Rejected request body");
    ApiError::BadRequest(rejection.body_text())
}

fn store_failure(operation: &'static str, err: StoreError) -> ApiError {
    error!(operation, error = %err, "Store operation failed");
    ApiError::Store(err)
}

fn classify_write(
    operation: &'static str,
    err: StoreError,
    known: &[(&str, &'static str)],
) -> ApiError {
    match ApiError::from_write(err, known) {
        ApiError::Store(err) => store_failure(operation, err),
        conflict => {
            warn!(operation, reason = %conflict, "Write rejected by unique constraint");
            conflict
        }
    }
}
