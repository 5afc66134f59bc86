//! Counts to probabilities.

use qlab_hal::Counts;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::{ReportError, ReportResult};
use crate::outcome::{CountMap, ProbabilityMap};

/// Divide every count by the shot total.
///
/// The shot total comes from the backend and is never recomputed here. If
/// the counts do not add up to it the probabilities will not sum to one;
/// that is logged rather than rejected so partial results stay reportable.
pub fn normalize(counts: &CountMap, shots: u32) -> ReportResult<ProbabilityMap> {
    if shots == 0 {
        return Err(ReportError::ZeroShots);
    }

    let total = counts.total();
    if total != u64::from(shots) {
        warn!(
            "Counts sum to {} but the backend reported {} shots",
            total, shots
        );
    }

    let shots = f64::from(shots);
    let entries: FxHashMap<_, _> = counts
        .iter()
        .map(|(outcome, &count)| (outcome.clone(), count as f64 / shots))
        .collect();

    Ok(ProbabilityMap::from_validated(entries, counts.width()))
}

/// Validate raw backend counts and normalize them.
pub fn normalize_counts(counts: &Counts, shots: u32) -> ReportResult<ProbabilityMap> {
    if shots == 0 {
        return Err(ReportError::ZeroShots);
    }
    normalize(&CountMap::from_counts(counts)?, shots)
}
