//! Job identifiers and lifecycle.
//!
//! ```text
//!   Queued ──→ Running ──→ Completed
//!     │           │
//!     │           ├──→ Failed(reason)
//!     │           │
//!     └───────────┴──→ Cancelled
//! ```
//!
//! Terminal states are permanent and `result()` is only valid once a job
//! reports `Completed`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a job, as assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier can be used as a file stem.
    ///
    /// Provider IDs are short alphanumeric strings (`ctb7hnpdf6zg0080t7q0`);
    /// anything with path separators or dots is rejected.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Map a provider status label onto the lifecycle.
    ///
    /// Accepts both the lifecycle names and the upper-case labels cloud
    /// providers report (`INITIALIZING`, `VALIDATING`, `DONE`, `ERROR`, ...).
    pub fn from_provider_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "QUEUED" | "INITIALIZING" | "VALIDATING" => Some(JobStatus::Queued),
            "RUNNING" => Some(JobStatus::Running),
            "COMPLETED" | "DONE" => Some(JobStatus::Completed),
            "CANCELLED" | "CANCELED" => Some(JobStatus::Cancelled),
            "FAILED" | "ERROR" => Some(JobStatus::Failed(String::new())),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) if msg.is_empty() => write!(f, "Failed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("error".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_provider_labels() {
        assert_eq!(
            JobStatus::from_provider_label("DONE"),
            Some(JobStatus::Completed)
        );
        assert_eq!(
            JobStatus::from_provider_label("initializing"),
            Some(JobStatus::Queued)
        );
        assert!(matches!(
            JobStatus::from_provider_label("ERROR"),
            Some(JobStatus::Failed(_))
        ));
        assert_eq!(JobStatus::from_provider_label("exploded"), None);
    }

    #[test]
    fn test_job_id_path_safety() {
        assert!(JobId::new("ctb7hnpdf6zg0080t7q0").is_path_safe());
        assert!(JobId::new("job-12_a").is_path_safe());
        assert!(!JobId::new("../etc/passwd").is_path_safe());
        assert!(!JobId::new("").is_path_safe());
    }

    #[test]
    fn test_job_id_serializes_as_string() {
        let json = serde_json::to_string(&JobId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
