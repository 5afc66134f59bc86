//! On-disk archive layout and record parsing.
//!
//! ```text
//!   <root>/
//!     backends.json        catalogue: [BackendInfo, ...]
//!     tokens.json          optional access list: ["token", ...]
//!     jobs/<job_id>.json   one JobRecord per job
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use qlab_hal::{BackendInfo, Counts, DEFAULT_REGISTER, ExecutionResult, JobId, JobStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArchiveError, ArchiveResult};

/// Catalogue file name.
pub const CATALOGUE_FILE: &str = "backends.json";

/// Access list file name.
pub const TOKENS_FILE: &str = "tokens.json";

/// Directory holding job records.
pub const JOBS_DIR: &str = "jobs";

/// A job as stored in the archive.
///
/// Outcomes are stored either as aggregated `counts` or as raw hex
/// `samples` (one per shot, e.g. `"0x3"`), the two shapes cloud providers
/// return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Provider job identifier.
    pub id: String,
    /// Backend that ran the job.
    pub backend: String,
    /// Provider status label (`DONE`, `QUEUED`, `ERROR`, ...).
    pub status: String,
    /// Shots requested. Defaults to the sum of the outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<u32>,
    /// Classical register the outcomes were read from.
    #[serde(default = "default_register")]
    pub register: String,
    /// Aggregated outcome counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Counts>,
    /// Raw per-shot hex samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<String>>,
    /// Submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Execution time reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Failure reason for failed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_register() -> String {
    DEFAULT_REGISTER.to_string()
}

impl JobRecord {
    /// Lifecycle status of the record.
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_provider_label(&self.status).map(|status| match status {
            JobStatus::Failed(_) => JobStatus::Failed(
                self.error
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            other => other,
        })
    }

    /// Outcome counts, aggregating samples if needed.
    pub fn outcome_counts(&self) -> Option<Counts> {
        if let Some(counts) = &self.counts {
            return Some(counts.clone());
        }
        let samples = self.samples.as_ref()?;
        let width = infer_bit_width(samples);
        Some(
            samples
                .iter()
                .map(|sample| (hex_to_binary(sample, width), 1))
                .collect(),
        )
    }

    /// Convert a completed record into an [`ExecutionResult`].
    pub fn to_result(&self, path: &Path) -> ArchiveResult<ExecutionResult> {
        let invalid = |message: String| ArchiveError::InvalidRecord {
            path: path.to_path_buf(),
            message,
        };

        match self.status() {
            Some(JobStatus::Completed) => {}
            Some(_) => return Err(ArchiveError::NotCompleted(self.id.clone())),
            None => return Err(invalid(format!("unknown status '{}'", self.status))),
        }

        let counts = self
            .outcome_counts()
            .ok_or_else(|| invalid("no counts or samples".into()))?;
        let shots = match self.shots {
            Some(shots) => shots,
            None => u32::try_from(counts.total_shots())
                .map_err(|_| invalid("shot total does not fit in u32".into()))?,
        };

        let mut result = ExecutionResult::new(counts, shots, &self.backend)
            .with_register(&self.register)
            .with_job_id(self.id.as_str());
        if let Some(ms) = self.execution_time_ms {
            result = result.with_execution_time(ms);
        }
        if let Some(created_at) = self.created_at {
            result.metadata = serde_json::json!({ "created_at": created_at });
        }
        Ok(result)
    }
}

/// Infer the register width from hex samples: bits needed for the largest
/// value, at least one.
pub fn infer_bit_width(samples: &[String]) -> usize {
    let max_val = samples
        .iter()
        .filter_map(|s| {
            let hex = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(hex, 16).ok()
        })
        .max()
        .unwrap_or(0);

    if max_val == 0 {
        1
    } else {
        64 - max_val.leading_zeros() as usize
    }
}

/// Hex sample to a bit-string padded to `width`.
///
/// Input that is not hex is returned unchanged.
pub fn hex_to_binary(hex: &str, width: usize) -> String {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    match u64::from_str_radix(hex, 16) {
        Ok(value) => format!("{value:0>width$b}"),
        Err(_) => hex.to_string(),
    }
}

/// A job archive rooted at a directory.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    /// Open the archive at `root`.
    pub fn open(root: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ArchiveError::NotFound(root));
        }
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Access list, if the archive has one.
    pub fn access_list(&self) -> ArchiveResult<Option<Vec<String>>> {
        let path = self.root.join(TOKENS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Path of the record for `job_id`.
    pub fn job_path(&self, job_id: &JobId) -> ArchiveResult<PathBuf> {
        if !job_id.is_path_safe() {
            return Err(ArchiveError::InvalidJobId(job_id.0.clone()));
        }
        Ok(self.root.join(JOBS_DIR).join(format!("{job_id}.json")))
    }

    /// Read the backend catalogue. A missing catalogue is empty.
    pub async fn catalogue(&self) -> ArchiveResult<Vec<BackendInfo>> {
        let path = self.root.join(CATALOGUE_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No catalogue at {}", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the record for `job_id`.
    pub async fn job(&self, job_id: &JobId) -> ArchiveResult<(JobRecord, PathBuf)> {
        let path = self.job_path(job_id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchiveError::JobNotFound(job_id.0.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let record: JobRecord = serde_json::from_str(&contents)?;
        if record.id != job_id.0 {
            return Err(ArchiveError::InvalidRecord {
                path,
                message: format!("record id '{}' does not match file name", record.id),
            });
        }
        Ok((record, path))
    }

    /// Identifiers of all archived jobs, sorted.
    pub async fn job_ids(&self) -> ArchiveResult<Vec<JobId>> {
        let dir = self.root.join(JOBS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(JobId::new(stem));
                }
            }
        }
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> JobRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_hex_to_binary() {
        assert_eq!(hex_to_binary("0x0", 2), "00");
        assert_eq!(hex_to_binary("0x3", 2), "11");
        assert_eq!(hex_to_binary("0x5", 4), "0101");
        assert_eq!(hex_to_binary("01", 2), "01");
    }

    #[test]
    fn test_infer_bit_width() {
        let samples = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(infer_bit_width(&samples(&["0x0", "0x0"])), 1);
        assert_eq!(infer_bit_width(&samples(&["0x0", "0x3"])), 2);
        assert_eq!(infer_bit_width(&samples(&["0x1", "0x7"])), 3);
    }

    #[test]
    fn test_record_with_counts() {
        let rec = record(
            r#"{"id": "j1", "backend": "ibm_brisbane", "status": "DONE",
                "counts": {"00": 250, "11": 250}}"#,
        );
        let result = rec.to_result(Path::new("j1.json")).unwrap();
        assert_eq!(result.shots, 500);
        assert_eq!(result.register, "meas");
        assert_eq!(result.backend, "ibm_brisbane");
        assert_eq!(result.job_id, Some(JobId::new("j1")));
    }

    #[test]
    fn test_record_with_samples() {
        let rec = record(
            r#"{"id": "j2", "backend": "ibm_kyoto", "status": "DONE", "register": "c",
                "samples": ["0x0", "0x3", "0x3", "0x0", "0x3"]}"#,
        );
        let result = rec.to_result(Path::new("j2.json")).unwrap();
        assert_eq!(result.counts.get("00"), 2);
        assert_eq!(result.counts.get("11"), 3);
        assert_eq!(result.shots, 5);
        assert_eq!(result.register, "c");
    }

    #[test]
    fn test_failed_record_status() {
        let rec = record(
            r#"{"id": "j3", "backend": "ibm_kyoto", "status": "ERROR", "error": "calibration"}"#,
        );
        assert_eq!(rec.status(), Some(JobStatus::Failed("calibration".into())));
        assert!(matches!(
            rec.to_result(Path::new("j3.json")),
            Err(ArchiveError::NotCompleted(_))
        ));
    }

    #[test]
    fn test_unknown_status_is_invalid() {
        let rec = record(r#"{"id": "j4", "backend": "x", "status": "LOST", "counts": {"0": 1}}"#);
        assert_eq!(rec.status(), None);
        assert!(matches!(
            rec.to_result(Path::new("j4.json")),
            Err(ArchiveError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_completed_record_without_outcomes() {
        let rec = record(r#"{"id": "j5", "backend": "x", "status": "DONE"}"#);
        let err = rec.to_result(Path::new("j5.json")).unwrap_err();
        assert!(err.to_string().contains("no counts or samples"));
    }

    #[test]
    fn test_job_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::open(dir.path()).unwrap();
        assert!(matches!(
            archive.job_path(&JobId::new("../secret")),
            Err(ArchiveError::InvalidJobId(_))
        ));
        assert_eq!(
            archive.job_path(&JobId::new("abc")).unwrap(),
            dir.path().join("jobs").join("abc.json")
        );
    }
}
