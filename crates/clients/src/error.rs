//! Upstream client error types.

use thiserror::Error;

/// Errors returned by upstream metadata clients.
///
/// `Status` preserves the code an upstream explicitly reported so the
/// gateway can propagate it verbatim; everything else maps to a 500 at the
/// handler boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("request not authorised: {0}")]
    Unauthorized(String),

    #[error("upstream reported status {status}: {context}")]
    Status { status: u16, context: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The upstream status code to propagate, if the upstream reported one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound(_) => Some(404),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for upstream client calls.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
