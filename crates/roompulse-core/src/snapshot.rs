//! Point-in-time status distributions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::StatusValue;

/// Per-status participant counts.
///
/// Always holds an entry for every [`StatusValue`], zero or not. Serialized
/// as a map keyed by status name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<StatusValue, u32>", into = "BTreeMap<StatusValue, u32>")]
pub struct StatusCounts([u32; StatusValue::COUNT]);

impl StatusCounts {
    /// All-zero counts.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; StatusValue::COUNT])
    }

    /// Count for one status.
    #[must_use]
    pub const fn get(&self, status: StatusValue) -> u32 {
        self.0[status.index()]
    }

    /// Sum over all statuses.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    /// `(status, count)` for every status, in [`StatusValue::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusValue, u32)> + '_ {
        StatusValue::ALL.iter().map(|&s| (s, self.get(s)))
    }

    fn increment(&mut self, status: StatusValue) {
        let slot = &mut self.0[status.index()];
        *slot = slot.saturating_add(1);
    }
}

impl From<BTreeMap<StatusValue, u32>> for StatusCounts {
    fn from(map: BTreeMap<StatusValue, u32>) -> Self {
        let mut counts = Self::zero();
        for (status, count) in map {
            counts.0[status.index()] = count;
        }
        counts
    }
}

impl From<StatusCounts> for BTreeMap<StatusValue, u32> {
    fn from(counts: StatusCounts) -> Self {
        counts.iter().collect()
    }
}

/// The status distribution of the live population at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// When the sample was taken (epoch milliseconds).
    pub timestamp_ms: i64,
    /// How many participants reported each status.
    pub counts: StatusCounts,
}

impl StatusSnapshot {
    /// Count one entry per status in `statuses`.
    ///
    /// Never fails; an empty input yields all zeros. Duplicated identities
    /// are the caller's concern: each yielded value is counted.
    pub fn build<I>(statuses: I, timestamp_ms: i64) -> Self
    where
        I: IntoIterator<Item = StatusValue>,
    {
        let mut counts = StatusCounts::zero();
        for status in statuses {
            counts.increment(status);
        }
        Self {
            timestamp_ms,
            counts,
        }
    }

    /// Count for one status.
    #[must_use]
    pub const fn count(&self, status: StatusValue) -> u32 {
        self.counts.get(status)
    }

    /// Number of participants observed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}
