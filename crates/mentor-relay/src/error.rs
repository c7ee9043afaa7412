//! Relay error types and the JSON error envelope.
//!
//! `RelayError` keeps the failure classes apart (validation, upstream
//! transport, upstream run failure, protocol shape, timeout); `ApiError`
//! collapses them into a status code plus `{"error": {"message": ...}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mentor_core::types::ErrorEnvelope;

use crate::provider::{ProviderError, RunStatus};

/// Failures of a relay operation.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Request is missing required fields. Nothing was sent upstream.
    #[error("{0}")]
    Validation(String),

    /// The provider could not be reached or rejected a call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The run reached a terminal failure status.
    #[error("Run {status}: {reason}")]
    RunFailed { status: RunStatus, reason: String },

    /// The run never reached a terminal status within the attempt budget.
    #[error("Run polling timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The run completed but the thread holds no assistant message.
    #[error("No assistant message found")]
    NoAssistantMessage,

    /// The latest assistant message has no text part.
    #[error("No text content in assistant message")]
    NoTextContent,
}

/// API error that maps to an HTTP status and the JSON error envelope.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 500 Internal Server Error - any relay or upstream failure.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorEnvelope::new(message))).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
