//! Chat error types with HTTP status code mapping.
//!
//! [`ChatError`] is the central error type for the messaging service. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Live-connection code paths log these errors instead of
//! returning them to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "unauthenticated: session expired",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Authentication  | 401 Unauthorized          |
/// | 3000–3999 | Server          | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Session token missing, unknown or expired.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Inbound chat message failed validation.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// HTTP request parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence layer failure.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Read or write failure on a live connection.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidMessage(_) => 1002,
            Self::Unauthenticated(_) => 2001,
            Self::Internal(_) => 3000,
            Self::StorageError(_) => 3001,
            Self::TransportError(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::StorageError(_) | Self::TransportError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<axum::Error> for ChatError {
    fn from(err: axum::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
