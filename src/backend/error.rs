//! Backend error types
//!
//! Errors raised while talking to the hosted table backend.

use thiserror::Error;

/// Errors that can occur when reading from or writing to the backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// The service answered with a non-success status; `message` is its own text
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Backend unavailable")]
    Unavailable,

    /// A single-row lookup matched more than one row
    #[error("Expected at most one row, got {0}")]
    NotUnique(usize),

    /// The response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The client could not be built from its configuration
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Whether the failure falls outside the backend-error bucket
    ///
    /// Transport and service failures are expected; a body the client cannot
    /// make sense of, or a client it cannot build, is not.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, BackendError::Decode(_) | BackendError::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
