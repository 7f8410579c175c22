//! API error handling
//!
//! Every handler returns `Result<_, AppError>`. The variant alone decides the
//! status code; server-side failures are logged with a correlation id that is
//! the only detail the client receives.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use webeditor_core::EditorError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Field-level validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Identifier to look up a server error in the logs
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: None,
            correlation_id: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Authentication required")
    }

    pub fn internal_error(correlation_id: String) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..Self::new("INTERNAL_ERROR", "Internal server error")
        }
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {message}")]
    ValidationFailed {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::ValidationFailed { message, errors } => {
                let mut error = ApiError::new("VALIDATION_FAILED", message);
                if !errors.is_empty() {
                    error.errors = Some(errors);
                }
                (StatusCode::BAD_REQUEST, error)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", msg)),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, ApiError::unauthorized()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, ApiError::new("CONFLICT", msg)),
            AppError::Storage(msg) => {
                let correlation_id = uuid::Uuid::new_v4().to_string();
                tracing::error!(%correlation_id, error = %msg, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error(correlation_id),
                )
            }
            AppError::Internal(msg) => {
                let correlation_id = uuid::Uuid::new_v4().to_string();
                tracing::error!(%correlation_id, error = %msg, "Internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error(correlation_id),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::NotFound(msg) => AppError::NotFound(msg),
            EditorError::Forbidden(msg) => AppError::Forbidden(msg),
            EditorError::Conflict(conflict) => AppError::Conflict(conflict.message().to_string()),
            EditorError::ValidationError(msg) => AppError::validation(msg),
            EditorError::DatabaseError(msg) => AppError::Storage(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                let field = field.to_string();
                failures.iter().map(move |failure| FieldError {
                    field: field.clone(),
                    message: failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));

        AppError::ValidationFailed {
            message: "Validation failed".to_string(),
            errors: fields,
        }
    }
}
