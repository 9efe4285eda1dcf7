//! Domain error types for the FERI/AD request lifecycle.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! The variants form a closed taxonomy so callers can tell guard failures,
//! validation failures and dependency faults apart without string matching.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found (request, invoice, draft, document)
    #[error("{0} not found")]
    NotFound(String),

    /// Transition rejected by the lifecycle guard
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Transition attempted on a terminal request
    #[error("Terminal state: {0}")]
    TerminalState(String),

    /// Malformed workflow input, rejected before any store write
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Uniqueness race exhausted its retry budget
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Storage (S3) operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notification dispatch failed (fatal only when a caller chooses so)
    #[error("Notification error: {0}")]
    Notification(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidTransition(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                self.to_string(),
            ),
            AppError::TerminalState(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "TERMINAL_STATE",
                self.to_string(),
            ),
            AppError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            AppError::Conflict(err_str) => {
                tracing::error!("Conflict after retries: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFLICT",
                    "A uniqueness conflict could not be resolved".to_string(),
                )
            }
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Storage(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                self.to_string(),
            ),
            AppError::Notification(err_str) => {
                tracing::error!("Notification error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFICATION_ERROR",
                    "Notification dispatch failed".to_string(),
                )
            }
            AppError::Unauthorized(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            AppError::Forbidden(_) => (
                actix_web::http::StatusCode::FORBIDDEN,
                "FORBIDDEN",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_failures_map_to_conflict_status() {
        let invalid = AppError::InvalidTransition("CREATED -> COMPLETED".to_string());
        assert_eq!(invalid.error_response().status(), 409);

        let terminal = AppError::TerminalState("request is REJECTED".to_string());
        assert_eq!(terminal.error_response().status(), 409);
    }

    #[test]
    fn test_validation_is_client_error() {
        let err = AppError::Validation("amount must be greater than zero".to_string());
        assert_eq!(err.error_response().status(), 400);
    }

    #[test]
    fn test_conflict_is_server_error() {
        let err = AppError::Conflict("invoice numbering retries exhausted".to_string());
        assert_eq!(err.error_response().status(), 500);
    }
}
