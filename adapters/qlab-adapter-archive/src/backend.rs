//! Archive service and backend.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use qlab_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, BackendInfo, CircuitSource,
    Credentials, ExecutionResult, HalError, HalResult, JobId, JobStatus, SelectionFilter,
    least_busy,
};
use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult};
use crate::store::{Archive, JobRecord};

/// Name the backend registers under.
pub const BACKEND_NAME: &str = "archive";

/// An authenticated handle on a job archive.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    archive: Archive,
    credentials: Credentials,
}

impl ArchiveService {
    /// Open the archive at `root` with `credentials`.
    ///
    /// An empty token is always rejected. If the archive carries an access
    /// list, the token must be on it.
    pub fn connect(root: impl Into<PathBuf>, credentials: &Credentials) -> HalResult<Self> {
        if credentials.token.trim().is_empty() {
            return Err(ArchiveError::MissingToken.into());
        }
        credentials.validate()?;

        let archive = Archive::open(root)?;
        if let Some(allowed) = archive.access_list()? {
            if !allowed.iter().any(|t| t == &credentials.token) {
                return Err(ArchiveError::InvalidToken.into());
            }
        }

        info!("Connected to archive at {}", archive.root().display());
        Ok(Self {
            archive,
            credentials: credentials.clone(),
        })
    }

    /// The underlying archive.
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Credentials the service was opened with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// All backends in the catalogue.
    pub async fn backends(&self) -> HalResult<Vec<BackendInfo>> {
        Ok(self.archive.catalogue().await?)
    }

    /// The least busy backend passing `filter`.
    pub async fn least_busy(&self, filter: SelectionFilter) -> HalResult<Option<BackendInfo>> {
        let backends = self.backends().await?;
        Ok(least_busy(&backends, filter).cloned())
    }

    /// Raw record for `job_id`.
    pub async fn job(&self, job_id: &JobId) -> HalResult<JobRecord> {
        let (record, _) = self.archive.job(job_id).await?;
        Ok(record)
    }

    /// A [`Backend`] over this service.
    pub fn backend(&self) -> ArchiveBackend {
        ArchiveBackend::new(self.clone())
    }
}

/// Read-only [`Backend`] that serves archived jobs.
///
/// `status`, `result` and `wait` read job records; `submit` and `cancel`
/// are unsupported.
#[derive(Debug, Clone)]
pub struct ArchiveBackend {
    service: ArchiveService,
    poll_interval: Duration,
    timeout: Duration,
}

impl ArchiveBackend {
    /// Backend with the default wait policy.
    pub fn new(service: ArchiveService) -> Self {
        Self {
            service,
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(300),
        }
    }

    /// Set the poll interval and overall timeout used by `wait`.
    pub fn with_wait_policy(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.timeout = timeout;
        self
    }

    /// The service behind this backend.
    pub fn service(&self) -> &ArchiveService {
        &self.service
    }

    async fn record(&self, job_id: &JobId) -> ArchiveResult<(JobRecord, PathBuf)> {
        self.service.archive.job(job_id).await
    }
}

#[async_trait]
impl Backend for ArchiveBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        let backends = self.service.backends().await?;
        let operational = backends.iter().filter(|b| b.operational).count();
        let queued: u32 = backends.iter().map(|b| b.pending_jobs).sum();

        Ok(BackendAvailability {
            is_available: true,
            queue_depth: Some(queued),
            status_message: Some(format!(
                "{} of {} backends operational",
                operational,
                backends.len()
            )),
        })
    }

    async fn submit(&self, circuit: &CircuitSource, _shots: u32) -> HalResult<JobId> {
        debug!("Rejecting submission of {}", circuit.name);
        Err(ArchiveError::ReadOnly("submit").into())
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let (record, path) = self.record(job_id).await?;
        record.status().ok_or_else(|| {
            ArchiveError::InvalidRecord {
                path,
                message: format!("unknown status '{}'", record.status),
            }
            .into()
        })
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let (record, path) = self.record(job_id).await?;
        match record.status() {
            Some(JobStatus::Failed(msg)) => Err(HalError::JobFailed(msg)),
            Some(JobStatus::Cancelled) => Err(HalError::JobCancelled),
            _ => Ok(record.to_result(&path)?),
        }
    }

    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        Err(ArchiveError::ReadOnly("cancel").into())
    }

    fn wait_policy(&self) -> (Duration, Duration) {
        (self.poll_interval, self.timeout)
    }
}

impl BackendFactory for ArchiveBackend {
    /// `endpoint` is the archive directory; `token` is required.
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let root = config.endpoint.as_deref().ok_or_else(|| {
            HalError::BackendUnavailable("archive backend needs an endpoint directory".into())
        })?;
        let token = config.token.as_deref().ok_or(ArchiveError::MissingToken)?;

        let service = ArchiveService::connect(root, &Credentials::new(token))?;
        Ok(ArchiveBackend::new(service).with_wait_policy(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.wait_timeout_secs),
        ))
    }
}
