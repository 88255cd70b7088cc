//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sluice_clients::ClientError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Credentials were absent or rejected. Serving paths answer 404 so the
    /// response never reveals that a private artefact exists.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("too many requests")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("upstream error: {0}")]
    Client(#[from] ClientError),

    #[error("storage error: {0}")]
    Storage(#[from] sluice_storage::StorageError),

    #[error("core error: {0}")]
    Core(#[from] sluice_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "not_found",
            Self::TooManyRequests => "too_many_requests",
            Self::Internal(_) => "internal_error",
            Self::Client(_) => "upstream_error",
            Self::Storage(_) => "storage_error",
            Self::Core(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::NOT_FOUND,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Upstream statuses pass through verbatim so callers see the same
            // failure they would have seen talking to the upstream directly.
            Self::Client(e) => e
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Storage(e) => match e {
                sluice_storage::StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(e) => match e {
                sluice_core::Error::UnknownFormat(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Whether the response body should carry the error detail. Auth and
    /// internal failures get a generic body instead.
    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "not found: resource not found".to_string(),
            Self::Internal(_) | Self::Storage(_) | Self::Core(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
