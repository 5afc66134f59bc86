//! Backend trait and configuration.
//!
//! The [`Backend`] trait is the execution seam: everything between "here is
//! a circuit" and "here are the counts" happens behind it.
//!
//! ```text
//!   availability() ──→ submit() ──→ status() ──→ result()
//!      (async)          (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `availability()` | async | yes | `HalResult<BackendAvailability>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<ExecutionResult>` |
//! | `run()` | async | provided | `HalResult<ExecutionResult>` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// A circuit as handed to a backend.
///
/// Circuits are built elsewhere; backends receive them as OpenQASM source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitSource {
    /// Human-readable circuit name (`bell_phi_plus`, `grover_3q`, ...).
    pub name: String,
    /// OpenQASM program text.
    pub qasm: String,
}

impl CircuitSource {
    /// Wrap OpenQASM text under a name.
    pub fn new(name: impl Into<String>, qasm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qasm: qasm.into(),
        }
    }
}

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// Service endpoint or local root (URL or directory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Poll interval used by [`Backend::wait`].
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum time [`Backend::wait`] blocks before giving up.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_wait_timeout_secs() -> u64 {
    300
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            poll_interval_ms: default_poll_interval_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the wait timeout.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_secs = timeout.as_secs();
        self
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("wait_timeout_secs", &self.wait_timeout_secs)
            .finish()
    }
}

/// Trait for execution backends.
///
/// Retrying failed executions is the backend's business; callers either get
/// a completed [`ExecutionResult`] or an error.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Check whether the backend accepts work and how busy it is.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Submit a circuit for execution.
    ///
    /// The returned job starts out `Queued`.
    async fn submit(&self, circuit: &CircuitSource, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a running job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Poll interval and overall timeout for [`Backend::wait`].
    fn wait_policy(&self) -> (Duration, Duration) {
        (Duration::from_millis(500), Duration::from_secs(300))
    }

    /// Wait for a job to complete and return its result.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let (poll_interval, timeout) = self.wait_policy();
        let max_polls = (timeout.as_millis() / poll_interval.as_millis().max(1)).max(1);

        for _ in 0..max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }

    /// Submit, wait, and return the result in one call.
    async fn run(&self, circuit: &CircuitSource, shots: u32) -> HalResult<ExecutionResult> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be at least 1".into()));
        }
        let job_id = self.submit(circuit, shots).await?;
        debug!("Submitted {} to {} as job {}", circuit.name, self.name(), job_id);
        self.wait(&job_id).await
    }
}

/// Backend availability information.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Whether the backend is currently accepting jobs.
    pub is_available: bool,
    /// Number of jobs currently in queue (if known).
    pub queue_depth: Option<u32>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Availability for a backend that is always ready.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            status_message: None,
        }
    }

    /// Availability for an offline backend.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: Backend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}
