//! Backend catalogue entries and least-busy selection.
//!
//! A [`BackendInfo`] is what a service reports about each device it can
//! reach: whether it is simulated, whether it is operational, how many jobs
//! are waiting, and a few descriptive fields used for listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor of one backend reachable through a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend name (e.g. `ibm_brisbane`, `aer_simulator`).
    pub name: String,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub simulator: bool,
    /// Whether the backend currently accepts jobs.
    #[serde(default = "default_operational")]
    pub operational: bool,
    /// Jobs waiting in the backend queue.
    #[serde(default)]
    pub pending_jobs: u32,
    /// Number of qubits on the device.
    pub num_qubits: u32,
    /// When the backend went online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_date: Option<DateTime<Utc>>,
    /// Processor family (e.g. `Eagle`, `Heron`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_family: Option<String>,
}

fn default_operational() -> bool {
    true
}

impl BackendInfo {
    /// Create an operational hardware entry with an empty queue.
    pub fn hardware(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            simulator: false,
            operational: true,
            pending_jobs: 0,
            num_qubits,
            online_date: None,
            processor_family: None,
        }
    }

    /// Create an operational simulator entry with an empty queue.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            simulator: true,
            ..Self::hardware(name, num_qubits)
        }
    }

    /// Set the queue depth.
    pub fn with_pending_jobs(mut self, pending_jobs: u32) -> Self {
        self.pending_jobs = pending_jobs;
        self
    }

    /// Set the operational flag.
    pub fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Set the processor family.
    pub fn with_processor_family(mut self, family: impl Into<String>) -> Self {
        self.processor_family = Some(family.into());
        self
    }

    /// Set the date the backend went online.
    pub fn with_online_date(mut self, date: DateTime<Utc>) -> Self {
        self.online_date = Some(date);
        self
    }

    /// `"simulated"` or `"real"`, as shown in listings.
    pub fn kind_label(&self) -> &'static str {
        if self.simulator { "simulated" } else { "real" }
    }
}

/// Filter for [`least_busy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionFilter {
    /// Skip backends that are not operational.
    pub operational_only: bool,
    /// Consider simulators as candidates.
    pub include_simulators: bool,
    /// Minimum number of qubits required.
    pub min_qubits: u32,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self {
            operational_only: true,
            include_simulators: false,
            min_qubits: 0,
        }
    }
}

impl SelectionFilter {
    fn accepts(&self, info: &BackendInfo) -> bool {
        (!self.operational_only || info.operational)
            && (self.include_simulators || !info.simulator)
            && info.num_qubits >= self.min_qubits
    }
}

/// Pick the candidate with the fewest pending jobs.
///
/// Ties are broken by name so the choice is deterministic.
pub fn least_busy<'a>(
    infos: impl IntoIterator<Item = &'a BackendInfo>,
    filter: SelectionFilter,
) -> Option<&'a BackendInfo> {
    infos
        .into_iter()
        .filter(|info| filter.accepts(info))
        .min_by(|a, b| {
            a.pending_jobs
                .cmp(&b.pending_jobs)
                .then_with(|| a.name.cmp(&b.name))
        })
}
