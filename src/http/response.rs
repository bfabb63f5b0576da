//! Error responses.
//!
//! Every failure leaves the API as `{"message": <string>}` with a status
//! chosen by [`ApiError`]:
//! - 400 for missing input, malformed bodies and unique-constraint conflicts
//! - 404 when no row matched
//! - 500 for everything the store reported otherwise, with the store's text
//!
//! Responses the framework produces without a body (405, timeouts) are given
//! the same shape by [`json_error_body`].

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// JSON body of every non-data response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Handler-level error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, or a write the store declined.
    #[error("{0}")]
    BadRequest(String),

    /// A unique constraint was violated.
    #[error("{0}")]
    Conflict(&'static str),

    /// No row matched.
    #[error("{0}")]
    NotFound(&'static str),

    /// Any other store failure; the text is passed through.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failure with nothing useful to tell the caller.
    #[error("Internal server error")]
    Internal,

    /// Error status produced below the handlers, e.g. by routing or the
    /// request timeout.
    #[error("{}", status_message(.0))]
    Status(StatusCode),
}

fn status_message(status: &StatusCode) -> &'static str {
    match *status {
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        other => other.canonical_reason().unwrap_or("Request failed"),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Status(status) => *status,
        }
    }

    /// Classify a failed write. A unique violation on one of `known`
    /// constraints becomes a conflict with the paired message; anything else
    /// stays a store error.
    pub fn from_write(err: StoreError, known: &[(&str, &'static str)]) -> Self {
        known
            .iter()
            .find(|(constraint, _)| err.violates(constraint))
            .map(|(_, message)| ApiError::Conflict(*message))
            .unwrap_or(ApiError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageBody::new(self.to_string()))).into_response()
    }
}

/// Give bodiless error responses a `{"message"}` body. Everything the
/// handlers return already carries a content type and is left alone.
pub async fn json_error_body(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let mut replaced = ApiError::Status(status).into_response();
    parts.headers.extend(replaced.headers_mut().drain());
    Response::from_parts(parts, replaced.into_body())
}
