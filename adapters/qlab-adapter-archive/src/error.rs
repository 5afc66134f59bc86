//! Error types for the archive adapter.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur when reading a job archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No token was supplied.
    #[error("Archive access requires a token. Set QLAB_TOKEN or run `qlab auth login`.")]
    MissingToken,

    /// The archive has an access list and the token is not on it.
    #[error("Token is not authorized for this archive")]
    InvalidToken,

    /// The archive root does not exist or is not a directory.
    #[error("Archive not found at {0}")]
    NotFound(PathBuf),

    /// No record for the job.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job identifier cannot name a record file.
    #[error("Invalid job id '{0}'")]
    InvalidJobId(String),

    /// A record parsed but its content is unusable.
    #[error("Invalid record {path}: {message}")]
    InvalidRecord {
        /// Record file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// The job has not completed.
    #[error("Job {0} has not completed")]
    NotCompleted(String),

    /// The archive is read-only.
    #[error("{0} is not supported by a read-only archive")]
    ReadOnly(&'static str),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ArchiveError> for qlab_hal::HalError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::MissingToken | ArchiveError::InvalidToken => {
                qlab_hal::HalError::AuthenticationFailed(e.to_string())
            }
            ArchiveError::NotFound(_) => qlab_hal::HalError::BackendUnavailable(e.to_string()),
            ArchiveError::JobNotFound(id) | ArchiveError::InvalidJobId(id) => {
                qlab_hal::HalError::JobNotFound(id)
            }
            ArchiveError::ReadOnly(_) => qlab_hal::HalError::Unsupported(e.to_string()),
            ArchiveError::Io(io) => qlab_hal::HalError::Io(io),
            ArchiveError::Json(json) => qlab_hal::HalError::Serialization(json),
            ArchiveError::InvalidRecord { .. } | ArchiveError::NotCompleted(_) => {
                qlab_hal::HalError::Backend(e.to_string())
            }
        }
    }
}
