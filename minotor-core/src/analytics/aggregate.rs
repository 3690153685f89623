//! Grouped counts over canonical events.
//!
//! Three independent, pure groupings. Each takes the event slice as its only
//! input and never fails: no events means an empty table.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::CanonicalEvent;

/// Label used for events without an `event_type`.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Ordered label -> count association.
///
/// Order is meaningful: it is the order consumers display. Serializes as a
/// JSON object with keys in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    entries: Vec<(String, u64)>,
}

impl CountTable {
    /// Count labels, keeping groups in first-encountered order.
    fn tally<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();

        for label in labels {
            match index.get(label) {
                Some(&i) => entries[i].1 += 1,
                None => {
                    index.insert(label, entries.len());
                    entries.push((label.to_string(), 1));
                }
            }
        }

        Self { entries }
    }

    /// Reorder by count descending; equal counts keep their current order.
    fn sorted_by_count(mut self) -> Self {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// First `n` entries in table order
    pub fn top(&self, n: usize) -> &[(String, u64)] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Share of the total for each entry, in percent.
    pub fn percentages(&self) -> Vec<(&str, f64)> {
        let total = self.total();
        self.iter()
            .map(|(label, count)| {
                let pct = if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                };
                (label, pct)
            })
            .collect()
    }

    pub fn into_entries(self) -> Vec<(String, u64)> {
        self.entries
    }
}

impl Serialize for CountTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Visits per url, most visited first.
///
/// Ties keep the order in which the urls first appeared.
pub fn page_statistics(events: &[CanonicalEvent]) -> CountTable {
    CountTable::tally(events.iter().map(|e| e.url.as_str())).sorted_by_count()
}

/// Events per event type; missing types are counted under [`UNKNOWN_LABEL`].
pub fn event_type_stats(events: &[CanonicalEvent]) -> CountTable {
    CountTable::tally(
        events
            .iter()
            .map(|e| e.event_type.as_deref().unwrap_or(UNKNOWN_LABEL)),
    )
}

/// Events per device type; events without one are left out entirely.
///
/// Unlike [`event_type_stats`] there is no unknown bucket here.
pub fn device_type_stats(events: &[CanonicalEvent]) -> CountTable {
    CountTable::tally(events.iter().filter_map(|e| e.device_type.as_deref()))
}
