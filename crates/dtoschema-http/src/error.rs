//! # HTTP Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure is returned as the same JSON envelope:
//!
//! ```json
//! { "message": "...", "code": "VALIDATION_ERROR",
//!   "errors": [{ "field": "title", "message": "is required" }],
//!   "traceId": "..." }
//! ```
//!
//! Validation failures list every violated field, never just the first.
//! Internal error details are logged and never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dtoschema_validate::{ValidationIssue, ValidationIssues};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

/// One violated field in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<ValidationIssue> for FieldError {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            field: issue.field,
            message: issue.message,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Request-level failure.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Body, query or path parameters failed their schemas (400).
    #[error("request validation failed with {} issue(s)", .issues.len())]
    Validation {
        issues: ValidationIssues,
        trace_id: Option<String>,
    },

    /// The request could not be decoded at all (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub fn validation(issues: impl Into<ValidationIssues>, trace_id: Option<String>) -> Self {
        Self::Validation {
            issues: issues.into(),
            trace_id,
        }
    }

    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, VALIDATION_ERROR_CODE),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// The body this error is rendered as.
    pub fn envelope(&self) -> ErrorEnvelope {
        let (_, code) = self.status_and_code();
        let code = Some(code.to_string());
        match self {
            Self::Validation { issues, trace_id } => ErrorEnvelope {
                message: "Validation failed".to_string(),
                code,
                errors: Some(issues.iter().cloned().map(FieldError::from).collect()),
                trace_id: trace_id.clone(),
            },
            Self::Internal(_) => ErrorEnvelope {
                message: "An internal error occurred".to_string(),
                code,
                errors: None,
                trace_id: None,
            },
            other => ErrorEnvelope {
                message: other.to_string(),
                code,
                errors: None,
                trace_id: None,
            },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Validation { issues, trace_id } => {
                tracing::debug!(issues = issues.len(), trace_id = ?trace_id, "rejected invalid request")
            }
            _ => {}
        }
        (status, Json(self.envelope())).into_response()
    }
}

impl From<dtoschema_query::QueryError> for HttpError {
    fn from(err: dtoschema_query::QueryError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<dtoschema_openapi::OpenApiError> for HttpError {
    fn from(err: dtoschema_openapi::OpenApiError) -> Self {
        Self::Internal(err.to_string())
    }
}
