//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use wd_core::db::DbError;
use wd_core::{CorrelationError, DirectoryError, IngestError, TicketError};

/// API error type.
///
/// Delivery failures never appear here: notification dispatch is
/// fire-and-forget and is swallowed below this layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed required input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ticket lifecycle guard rejected the transition.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Persistence failure, surfaced with the underlying message.
    #[error("Store error: {0}")]
    Store(String),
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidTransition(_) => "INVALID_TRANSITION",
            ApiError::Store(_) => "STORE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(msg) => ApiError::Validation(msg),
            IngestError::Store(e) => ApiError::Store(e.to_string()),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::Validation(msg) => ApiError::Validation(msg),
            TicketError::NotFound(id) => ApiError::NotFound(format!("Ticket {id} not found")),
            TicketError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            TicketError::Store(e) => ApiError::Store(e.to_string()),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Validation(msg) => ApiError::Validation(msg),
            DirectoryError::NotFound(id) => ApiError::NotFound(format!("Analyst {id} not found")),
            DirectoryError::Store(e) => ApiError::Store(e.to_string()),
        }
    }
}

impl From<CorrelationError> for ApiError {
    fn from(err: CorrelationError) -> Self {
        match err {
            CorrelationError::Store(e) => ApiError::Store(e.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut reasons: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let codes: Vec<String> = errors.iter().map(|e| e.code.to_string()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        reasons.sort();
        ApiError::Validation(reasons.join("; "))
    }
}
