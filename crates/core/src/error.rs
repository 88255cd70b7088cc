//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid private url: {0}")]
    InvalidPrivateUrl(String),

    #[error("unknown download format: {0}")]
    UnknownFormat(String),

    #[error("unknown file state: {0}")]
    UnknownFileState(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
