//! Unified error handling
//!
//! This module provides the error taxonomy shared by the store, the
//! services, and the authorization engine, and converts errors to
//! HTTP responses for the transport layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Authentication error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid or expired reset token")]
    InvalidToken,

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An update referenced a field the user record does not have.
    /// Programmer error; fatal to the calling operation, never retried.
    #[error("Unknown user field: {0}")]
    UnknownField(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AuthError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AuthError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AuthError::AlreadyExists(msg) => (StatusCode::CONFLICT, "ALREADY_EXISTS", msg.clone()),
            AuthError::InvalidToken => (
                StatusCode::FORBIDDEN,
                "INVALID_TOKEN",
                "Invalid reset token".to_string(),
            ),
            AuthError::MalformedCredential(msg) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_CREDENTIAL", msg.clone())
            }
            AuthError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, "INVALID_QUERY", msg.clone()),
            AuthError::UnknownField(field) => {
                error!("Update referenced unknown user field: {}", field);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UNKNOWN_FIELD",
                    "An internal error occurred".to_string(),
                )
            }
            AuthError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AuthError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
