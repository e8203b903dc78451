//! A live room: one host, many participants, one status history.
//!
//! Ties a [`StatusLedger`] to a [`StatusRecorder`]. A status change is
//! written to the ledger and immediately followed by a recording attempt,
//! so the chart reacts to changes without waiting for the next refresh;
//! the admission gate keeps bursts of changes from flooding the history.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::RetentionConfig;
use crate::error::ConfigError;
use crate::ledger::{ParticipantSession, StatusLedger};
use crate::recorder::StatusRecorder;
use crate::retention::{RecordOutcome, RetentionStats};
use crate::snapshot::StatusSnapshot;
use crate::status::StatusValue;

/// One room's participants and status history.
#[derive(Debug)]
pub struct Room {
    room_id: String,
    host_id: String,
    host_last_seen_ms: AtomicI64,
    ledger: StatusLedger,
    recorder: StatusRecorder,
}

impl Room {
    /// Open a room. The host counts as seen at creation time.
    pub fn new(
        room_id: impl Into<String>,
        host_id: impl Into<String>,
        config: RetentionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let now_ms = clock.now_ms();
        let room = Self {
            room_id: room_id.into(),
            host_id: host_id.into(),
            host_last_seen_ms: AtomicI64::new(now_ms),
            ledger: StatusLedger::new(),
            recorder: StatusRecorder::new(config, clock)?,
        };
        info!(room_id = %room.room_id, host = %room.host_id, "room opened");
        Ok(room)
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    fn now_ms(&self) -> i64 {
        self.recorder.clock().now_ms()
    }

    // -- Participants --

    /// Store a participant's status, then try to record the new distribution.
    pub fn set_participant_status(&self, id: impl Into<String>, status: StatusValue) -> RecordOutcome {
        let id = id.into();
        debug!(room_id = %self.room_id, participant = %id, %status, "participant status set");
        self.ledger.set_status(id, status, self.now_ms());
        self.recorder.record_ledger(&self.ledger)
    }

    #[must_use]
    pub fn participant_status(&self, id: &str) -> Option<StatusValue> {
        self.ledger.status(id)
    }

    #[must_use]
    pub fn participant(&self, id: &str) -> Option<ParticipantSession> {
        self.ledger.get(id)
    }

    /// Mark a participant as active. Returns `false` if unknown.
    pub fn touch_participant(&self, id: &str) -> bool {
        self.ledger.touch(id, self.now_ms())
    }

    /// Whether `id` belongs to this room (the host always does).
    #[must_use]
    pub fn has_participant(&self, id: &str) -> bool {
        self.is_host(id) || self.ledger.contains(id)
    }

    /// Ids of every participant with a reported status.
    #[must_use]
    pub fn participants(&self) -> Vec<String> {
        self.ledger.ids()
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.ledger.len()
    }

    /// Current status of every participant.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusValue> {
        self.ledger.statuses()
    }

    /// Drop participants idle for more than `timeout_ms`.
    pub fn remove_inactive_participants(&self, timeout_ms: i64) -> usize {
        let removed = self.ledger.remove_inactive(timeout_ms, self.now_ms());
        if !removed.is_empty() {
            info!(room_id = %self.room_id, removed = removed.len(), "inactive participants dropped");
        }
        removed.len()
    }

    // -- Host --

    #[must_use]
    pub fn is_host(&self, id: &str) -> bool {
        self.host_id == id
    }

    pub fn touch_host(&self) {
        self.host_last_seen_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    /// Whether the host has been idle for more than `timeout_ms`.
    #[must_use]
    pub fn is_host_inactive(&self, timeout_ms: i64) -> bool {
        let last = self.host_last_seen_ms.load(Ordering::Relaxed);
        self.now_ms().saturating_sub(last) > timeout_ms
    }

    // -- History --

    /// Record the current distribution (periodic refresh).
    pub fn tick(&self) -> RecordOutcome {
        self.recorder.record_ledger(&self.ledger)
    }

    /// Retained history, oldest first.
    #[must_use]
    pub fn status_history(&self) -> Vec<StatusSnapshot> {
        self.recorder.read_history()
    }

    #[must_use]
    pub fn history_stats(&self) -> RetentionStats {
        self.recorder.stats()
    }

    #[must_use]
    pub fn recorder(&self) -> &StatusRecorder {
        &self.recorder
    }

    #[must_use]
    pub fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }
}
