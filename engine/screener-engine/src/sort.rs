//! Deterministic sort engine

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use ticker_cache::TickerRecord;

/// Sortable record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    LastPrice,
    Change24h,
    Volume24h,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active sort field and direction with header-toggle semantics:
/// toggling the active field flips direction, toggling a new field selects
/// it and resets direction to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { field: SortField::Volume24h, direction: SortDirection::Descending }
    }
}

impl SortState {
    /// Apply a header toggle for `field`
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.field = field;
            self.direction = SortDirection::Descending;
        }
    }
}

/// Stable, deterministic comparator over ticker records.
///
/// Key values go through the parse-or-zero policy, so unparsable fields
/// compare as 0. Sorting is stable: equal keys keep the snapshot's relative
/// order, which prevents visual jitter between refresh cycles.
pub struct SortEngine;

impl SortEngine {
    /// Compare two records by `field` in `direction`
    pub fn compare(
        a: &TickerRecord,
        b: &TickerRecord,
        field: SortField,
        direction: SortDirection,
    ) -> Ordering {
        let (ka, kb) = match field {
            SortField::LastPrice => (a.price(), b.price()),
            SortField::Change24h => (a.change(), b.change()),
            SortField::Volume24h => (a.volume(), b.volume()),
        };

        // Keys are finite by the parse-or-zero policy
        let ordering = ka.partial_cmp(&kb).unwrap_or(Ordering::Equal);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Stable in-place sort of a snapshot under `state`
    pub fn sort(records: &mut [TickerRecord], state: SortState) {
        records.sort_by(|a, b| Self::compare(a, b, state.field, state.direction));
    }
}
