//! Two-tier status history retention.
//!
//! Keeps a bounded history of [`StatusSnapshot`]s in two tiers:
//!
//! - **dense**: every admitted sample from the last `dense_interval_window`
//!   of time, spaced at least `dense_snapshot_interval` apart
//! - **sparse**: older samples thinned to at least
//!   `sparse_snapshot_interval` spacing
//!
//! # Record pipeline
//!
//! 1. Admission gate: drop the call if the newest dense sample is younger
//!    than the dense interval
//! 2. Build a snapshot at `now` and append it to dense
//! 3. Pop aged-out dense samples (`timestamp < now - window`) oldest first,
//!    admitting each to sparse only if it is at least the sparse interval
//!    after the last sparse sample, and discarding the rest
//! 4. Evict from the oldest end (sparse first) down to `max_snapshot_count`
//!
//! The engine is a plain single-owner structure; see
//! [`crate::recorder::StatusRecorder`] for the shared, lock-protected form.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::RetentionConfig;
use crate::error::ConfigError;
use crate::snapshot::StatusSnapshot;
use crate::status::StatusValue;

// =============================================================================
// Outcomes and stats
// =============================================================================

/// What happened during one admitted `record` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    /// Timestamp of the snapshot that was appended.
    pub timestamp_ms: i64,
    /// Aged-out dense samples kept in the sparse tier.
    pub migrated: usize,
    /// Aged-out dense samples dropped by down-sampling.
    pub discarded: usize,
    /// Samples dropped to stay within `max_snapshot_count`.
    pub evicted: usize,
}

/// Result of a `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Rejected by the admission gate; history unchanged.
    Throttled {
        /// Milliseconds since the newest dense sample (negative if `now`
        /// went backwards).
        since_last_ms: i64,
    },
    /// A snapshot was appended.
    Recorded(RecordReport),
}

impl RecordOutcome {
    /// Whether a snapshot was appended.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    /// The report for an admitted call.
    #[must_use]
    pub fn report(&self) -> Option<&RecordReport> {
        match self {
            Self::Recorded(report) => Some(report),
            Self::Throttled { .. } => None,
        }
    }
}

/// Lifetime counters and current tier sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionStats {
    /// Samples currently in the dense tier.
    pub dense_len: usize,
    /// Samples currently in the sparse tier.
    pub sparse_len: usize,
    /// Snapshots ever appended.
    pub recorded: u64,
    /// Calls rejected by the admission gate.
    pub throttled: u64,
    /// Aged-out samples ever admitted to sparse.
    pub migrated: u64,
    /// Aged-out samples ever dropped by down-sampling.
    pub discarded: u64,
    /// Samples ever dropped for capacity.
    pub evicted: u64,
}

// =============================================================================
// Engine
// =============================================================================

/// Dense + sparse status history with rate limiting and a capacity bound.
#[derive(Debug, Clone)]
pub struct RetentionEngine {
    config: RetentionConfig,
    dense: VecDeque<StatusSnapshot>,
    sparse: VecDeque<StatusSnapshot>,
    stats: RetentionStats,
}

impl RetentionEngine {
    /// Create an empty engine.
    ///
    /// Fails with every violated config invariant listed in one error.
    pub fn new(config: RetentionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            dense: VecDeque::new(),
            sparse: VecDeque::new(),
            stats: RetentionStats::default(),
        })
    }

    /// Sample `statuses` at `now_ms`, subject to the admission gate.
    ///
    /// Never fails. A `now_ms` earlier than the newest dense sample is
    /// treated like a too-early call.
    pub fn record<I>(&mut self, statuses: I, now_ms: i64) -> RecordOutcome
    where
        I: IntoIterator<Item = StatusValue>,
    {
        if let Some(last) = self.dense.back() {
            let since_last_ms = now_ms.saturating_sub(last.timestamp_ms);
            if since_last_ms < self.config.dense_interval_ms() {
                self.stats.throttled += 1;
                trace!(since_last_ms, "status snapshot throttled");
                return RecordOutcome::Throttled { since_last_ms };
            }
        }

        self.dense.push_back(StatusSnapshot::build(statuses, now_ms));
        self.stats.recorded += 1;

        let (migrated, discarded) = self.migrate_aged_out(now_ms);
        let evicted = self.enforce_capacity();

        let report = RecordReport {
            timestamp_ms: now_ms,
            migrated,
            discarded,
            evicted,
        };
        debug!(
            timestamp_ms = now_ms,
            dense = self.dense.len(),
            sparse = self.sparse.len(),
            migrated,
            discarded,
            evicted,
            "status snapshot recorded"
        );
        RecordOutcome::Recorded(report)
    }

    /// Move dense samples older than the window into sparse, thinning them.
    ///
    /// Single oldest-first pass over the front of dense. Returns
    /// `(migrated, discarded)`.
    fn migrate_aged_out(&mut self, now_ms: i64) -> (usize, usize) {
        let cutoff_ms = now_ms.saturating_sub(self.config.dense_window_ms());
        let sparse_interval_ms = self.config.sparse_interval_ms();
        let mut migrated = 0;
        let mut discarded = 0;

        while let Some(candidate) = self.dense.front().copied() {
            if candidate.timestamp_ms >= cutoff_ms {
                break;
            }
            self.dense.pop_front();

            let admit = self.sparse.back().is_none_or(|last| {
                candidate.timestamp_ms.saturating_sub(last.timestamp_ms) >= sparse_interval_ms
            });
            if admit {
                self.sparse.push_back(candidate);
                migrated += 1;
            } else {
                discarded += 1;
            }
        }

        self.stats.migrated += migrated as u64;
        self.stats.discarded += discarded as u64;
        (migrated, discarded)
    }

    /// Drop the oldest samples (sparse first, then dense) down to capacity.
    fn enforce_capacity(&mut self) -> usize {
        let total = self.len();
        let excess = total.saturating_sub(self.config.max_snapshot_count);
        if excess == 0 {
            return 0;
        }

        let from_sparse = excess.min(self.sparse.len());
        self.sparse.drain(..from_sparse);
        let from_dense = excess - from_sparse;
        self.dense.drain(..from_dense);

        self.stats.evicted += excess as u64;
        debug!(excess, from_sparse, from_dense, "status history trimmed to capacity");
        excess
    }

    /// Full history, oldest first: sparse then dense.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &StatusSnapshot> + '_ {
        self.sparse.iter().chain(self.dense.iter())
    }

    /// Owned copy of [`Self::history`].
    #[must_use]
    pub fn to_vec(&self) -> Vec<StatusSnapshot> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.history().copied());
        out
    }

    /// Dense tier, oldest first.
    pub fn dense(&self) -> impl DoubleEndedIterator<Item = &StatusSnapshot> + '_ {
        self.dense.iter()
    }

    /// Sparse tier, oldest first.
    pub fn sparse(&self) -> impl DoubleEndedIterator<Item = &StatusSnapshot> + '_ {
        self.sparse.iter()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.dense.back().or_else(|| self.sparse.back())
    }

    /// Combined history length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sparse.len() + self.dense.len()
    }

    /// Whether nothing has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sparse.is_empty() && self.dense.is_empty()
    }

    /// Counters and tier sizes.
    #[must_use]
    pub fn stats(&self) -> RetentionStats {
        RetentionStats {
            dense_len: self.dense.len(),
            sparse_len: self.sparse.len(),
            ..self.stats
        }
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================
