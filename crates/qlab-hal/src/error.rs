//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur while talking to an execution backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Backend is not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// The backend rejected the supplied credentials (or none were supplied).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials could not be loaded, stored or removed.
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading or writing backend state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HalError {
    /// Whether this error means the caller should (re)authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, HalError::AuthenticationFailed(_))
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
