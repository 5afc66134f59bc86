//! Raw execution results as returned by a backend.
//!
//! [`Counts`] is deliberately unordered: backends hand outcomes back in
//! whatever order they like. Ordering and normalization are the job of the
//! reporting layer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Name used when a backend does not report its classical register.
pub const DEFAULT_REGISTER: &str = "meas";

/// Occurrence count per measured bit-string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    inner: FxHashMap<String, u64>,
}

impl Counts {
    /// Create an empty count table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.inner.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring` (zero when never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.inner.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all occurrences.
    pub fn total_shots(&self) -> u64 {
        self.inner.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The outcome observed most often, if any.
    ///
    /// Ties go to the smaller bit-string so the answer is stable.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.inner
            .iter()
            .max_by(|(ka, va), (kb, vb)| va.cmp(vb).then_with(|| kb.cmp(ka)))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterate over `(bitstring, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.insert(bitstring, count);
        }
        counts
    }
}

/// Result of one completed execution.
///
/// The register the counts were read from travels with the result, so
/// callers never need to guess between `"meas"`, `"c"` or any other name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome counts for `register`.
    pub counts: Counts,
    /// Number of shots the backend executed.
    pub shots: u32,
    /// Name of the backend (simulator method or device) that ran the job.
    pub backend: String,
    /// Classical register the counts were read from.
    #[serde(default = "default_register")]
    pub register: String,
    /// Identifier of the job that produced this result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Wall-clock execution time reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Backend-specific extras.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

fn default_register() -> String {
    DEFAULT_REGISTER.to_string()
}

impl ExecutionResult {
    /// Create a result for `counts` measured into the default register.
    pub fn new(counts: Counts, shots: u32, backend: impl Into<String>) -> Self {
        Self {
            counts,
            shots,
            backend: backend.into(),
            register: default_register(),
            job_id: None,
            execution_time_ms: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the classical register name.
    pub fn with_register(mut self, register: impl Into<String>) -> Self {
        self.register = register.into();
        self
    }

    /// Attach the job identifier.
    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Attach the execution time.
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Whether the counts add up to the reported shot total.
    pub fn is_consistent(&self) -> bool {
        self.counts.total_shots() == u64::from(self.shots)
    }
}
