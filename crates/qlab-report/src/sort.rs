//! Deterministic ordering of outcome-keyed values.

use serde::ser::{Serialize, Serializer};

use crate::outcome::Outcome;

/// Outcome-keyed values in ascending bit-string order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedMap<V> {
    entries: Vec<(Outcome, V)>,
}

/// Order any outcome-keyed mapping by ascending bit-string.
///
/// Keys are assumed unique, so the result does not depend on input order.
/// Sorting an already sorted map returns an identical map.
pub fn sort_outcomes<V, I>(mapping: I) -> SortedMap<V>
where
    I: IntoIterator<Item = (Outcome, V)>,
{
    let mut entries: Vec<_> = mapping.into_iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    SortedMap { entries }
}

impl<V> SortedMap<V> {
    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `bitstring`, if present.
    pub fn get(&self, bitstring: &str) -> Option<&V> {
        self.entries
            .binary_search_by(|(outcome, _)| {
                outcome
                    .width()
                    .cmp(&bitstring.len())
                    .then_with(|| outcome.as_str().cmp(bitstring))
            })
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Iterate in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&Outcome, &V)> {
        self.entries.iter().map(|(outcome, value)| (outcome, value))
    }

    /// Outcomes in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &Outcome> {
        self.entries.iter().map(|(outcome, _)| outcome)
    }

    /// Values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Borrow the ordered entries.
    pub fn as_slice(&self) -> &[(Outcome, V)] {
        &self.entries
    }
}

impl<V> IntoIterator for SortedMap<V> {
    type Item = (Outcome, V);
    type IntoIter = std::vec::IntoIter<(Outcome, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for SortedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .map(|(outcome, value)| (outcome.as_str(), value)),
        )
    }
}
