//! API error handling
//!
//! Every failure leaves the API as `{error, code}` JSON: `error` is the
//! human-readable message, `code` a stable machine discriminant. Domain
//! errors arrive as `BookingError` and map onto statuses here; handlers
//! never pick status codes themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain_booking::BookingError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "invalid_state", msg.clone()),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "transient", msg.clone())
            }
            // Internals are logged server-side, never echoed to callers
            ApiError::Internal(msg) => {
                error!(detail = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => ApiError::Validation(msg),
            BookingError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            BookingError::InvalidState(msg) => ApiError::Conflict(msg),
            BookingError::GenerationExhausted { .. } => ApiError::Internal(err.to_string()),
            BookingError::Transient(msg) => ApiError::Unavailable(msg),
            BookingError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}
