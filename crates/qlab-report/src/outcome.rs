//! Measurement outcomes and outcome-keyed maps.
//!
//! An [`Outcome`] is a validated bit-string such as `"01"`. An
//! [`OutcomeMap`] holds one value per outcome, with every key sharing the
//! same width; [`CountMap`] and [`ProbabilityMap`] are its two uses.

use std::cmp::Ordering;
use std::fmt;

use qlab_hal::Counts;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{ReportError, ReportResult};
use crate::sort::{SortedMap, sort_outcomes};

/// A joint classical register state, e.g. `"00"` or `"101"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Outcome(String);

impl Outcome {
    /// Validate a bit-string.
    pub fn parse(raw: &str) -> ReportResult<Self> {
        if raw.is_empty() {
            return Err(ReportError::EmptyOutcome);
        }
        if !raw.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(ReportError::NonBinaryOutcome {
                outcome: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// The bit-string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of bits.
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Unsigned integer value, if it fits in 128 bits.
    pub fn value(&self) -> Option<u128> {
        if self.width() > 128 {
            return None;
        }
        u128::from_str_radix(&self.0, 2).ok()
    }
}

impl Ord for Outcome {
    /// Shorter strings first, then lexicographic, which for equal widths is
    /// ascending unsigned binary value.
    fn cmp(&self, other: &Self) -> Ordering {
        self.width()
            .cmp(&other.width())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Outcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome-keyed values sharing one bit width; iteration order is unspecified.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeMap<V> {
    entries: FxHashMap<Outcome, V>,
    width: usize,
}

/// Occurrence count per outcome.
pub type CountMap = OutcomeMap<u64>;

/// Probability per outcome.
pub type ProbabilityMap = OutcomeMap<f64>;

impl<V> OutcomeMap<V> {
    /// Build from raw `(bitstring, value)` pairs, validating every key.
    ///
    /// Duplicate keys keep the last value.
    pub fn try_from_pairs<K, I>(pairs: I) -> ReportResult<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entries = FxHashMap::default();
        let mut width = None;

        for (key, value) in pairs {
            let outcome = Outcome::parse(key.as_ref())?;
            match width {
                None => width = Some(outcome.width()),
                Some(expected) if expected != outcome.width() => {
                    return Err(ReportError::WidthMismatch {
                        found: outcome.width(),
                        outcome: outcome.0,
                        expected,
                    });
                }
                Some(_) => {}
            }
            entries.insert(outcome, value);
        }

        Ok(Self {
            entries,
            width: width.unwrap_or(0),
        })
    }

    /// Value for `bitstring`, if present.
    pub fn get(&self, bitstring: &str) -> Option<&V> {
        // Keys are validated on insert, so a lookup by raw string is exact.
        self.entries.get(&Outcome(bitstring.to_string()))
    }

    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bit width shared by every key (0 for an empty map).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Iterate in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Outcome, &V)> {
        self.entries.iter()
    }

    /// Copy into a [`SortedMap`].
    pub fn sorted(&self) -> SortedMap<V>
    where
        V: Clone,
    {
        sort_outcomes(
            self.entries
                .iter()
                .map(|(outcome, value)| (outcome.clone(), value.clone())),
        )
    }

    pub(crate) fn from_validated(entries: FxHashMap<Outcome, V>, width: usize) -> Self {
        Self { entries, width }
    }
}

impl CountMap {
    /// Validate a backend's raw counts.
    pub fn from_counts(counts: &Counts) -> ReportResult<Self> {
        Self::try_from_pairs(counts.iter())
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().sum()
    }
}

impl ProbabilityMap {
    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }
}

impl<V> IntoIterator for OutcomeMap<V> {
    type Item = (Outcome, V);
    type IntoIter = std::collections::hash_map::IntoIter<Outcome, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
