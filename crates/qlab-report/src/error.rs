//! Error types for the report crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a report.
///
/// Everything except [`ReportError::Io`] means the input itself is
/// unusable; see [`ReportError::is_invalid_input`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// Shot total must be positive.
    #[error("Invalid input: shot total must be at least 1")]
    ZeroShots,

    /// An outcome key is the empty string.
    #[error("Invalid input: empty measurement outcome")]
    EmptyOutcome,

    /// An outcome key contains something other than `0` and `1`.
    #[error("Invalid input: outcome '{outcome}' is not a binary string")]
    NonBinaryOutcome {
        /// The offending key.
        outcome: String,
    },

    /// Outcome keys do not all have the same width.
    #[error("Invalid input: outcome '{outcome}' has width {found}, expected {expected}")]
    WidthMismatch {
        /// The offending key.
        outcome: String,
        /// Width of the other keys.
        expected: usize,
        /// Width of the offending key.
        found: usize,
    },

    /// A count has no paired probability.
    #[error("Invalid input: no probability for outcome '{outcome}'")]
    MissingProbability {
        /// The unpaired key.
        outcome: String,
    },

    /// Writing the textual report failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Whether the error is about the input rather than the output stream.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, ReportError::Io(_))
    }
}

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while exporting charts.
///
/// These never abort a report: the textual output has already been written
/// by the time charts are rendered.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    /// There is nothing to draw.
    #[error("Nothing to render: the mapping is empty")]
    EmptyData,

    /// The file stem cannot be used as a file name.
    #[error("Invalid file stem '{0}'")]
    InvalidStem(String),

    /// The output location could not be prepared.
    #[error("Cannot write to {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The drawing backend failed.
    #[error("Drawing failed: {0}")]
    Draw(String),
}
