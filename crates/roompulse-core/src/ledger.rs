//! Concurrent participant status ledger.
//!
//! Maps participant identity to its current [`ParticipantSession`]. Many
//! writers update it concurrently (one per participant request) while the
//! refresh loop takes point-in-time copies for recording.
//!
//! A single `RwLock<HashMap>` guards the whole map. Every bulk read
//! ([`StatusLedger::statuses`], [`StatusLedger::entries`]) copies under one
//! guard, so a concurrent insert or removal can never tear an iteration.
//! Poisoned locks are recovered rather than propagated: a panicking writer
//! cannot leave a half-applied entry behind, since every mutation is a
//! single `HashMap` call.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::StatusValue;

// ---------------------------------------------------------------------------
// Session record
// ---------------------------------------------------------------------------

/// One participant's reported status and last activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSession {
    /// Most recently reported status.
    pub status: StatusValue,
    /// Last time the participant was seen (epoch milliseconds).
    pub last_seen_ms: i64,
}

impl ParticipantSession {
    /// A session first seen at `now_ms`.
    #[must_use]
    pub const fn new(status: StatusValue, now_ms: i64) -> Self {
        Self {
            status,
            last_seen_ms: now_ms,
        }
    }

    /// Whether more than `timeout_ms` has passed since `last_seen_ms`.
    #[must_use]
    pub const fn is_inactive(&self, timeout_ms: i64, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_seen_ms) > timeout_ms
    }
}

// ---------------------------------------------------------------------------
// StatusLedger
// ---------------------------------------------------------------------------

/// Thread-safe participant → session map.
#[derive(Debug, Default)]
pub struct StatusLedger {
    sessions: RwLock<HashMap<String, ParticipantSession>>,
}

impl StatusLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ParticipantSession>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ParticipantSession>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a participant's status, refreshing `last_seen_ms`.
    ///
    /// Returns the previous session, if any.
    pub fn set_status(
        &self,
        id: impl Into<String>,
        status: StatusValue,
        now_ms: i64,
    ) -> Option<ParticipantSession> {
        self.write().insert(id.into(), ParticipantSession::new(status, now_ms))
    }

    /// Refresh `last_seen_ms` for a known participant.
    ///
    /// Returns `false` if the participant is unknown.
    pub fn touch(&self, id: &str, now_ms: i64) -> bool {
        self.update(id, |session| session.last_seen_ms = now_ms).is_some()
    }

    /// Apply `f` to one session under the write lock.
    ///
    /// Returns `f`'s result, or `None` if the participant is unknown.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut ParticipantSession) -> R) -> Option<R> {
        self.write().get_mut(id).map(f)
    }

    /// Copy of one participant's session.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ParticipantSession> {
        self.read().get(id).copied()
    }

    /// One participant's status.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<StatusValue> {
        self.get(id).map(|session| session.status)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Remove a participant, returning their last session.
    pub fn remove(&self, id: &str) -> Option<ParticipantSession> {
        self.write().remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // -- Snapshot accessors --

    /// Current statuses of every participant, copied under one read guard.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusValue> {
        self.read().values().map(|session| session.status).collect()
    }

    /// Every `(id, session)` pair, copied under one read guard.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, ParticipantSession)> {
        self.read()
            .iter()
            .map(|(id, session)| (id.clone(), *session))
            .collect()
    }

    /// Every participant id, copied under one read guard.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Drop sessions idle for more than `timeout_ms`, returning their ids.
    pub fn remove_inactive(&self, timeout_ms: i64, now_ms: i64) -> Vec<String> {
        let mut removed = Vec::new();
        self.write().retain(|id, session| {
            if session.is_inactive(timeout_ms, now_ms) {
                removed.push(id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            debug!(removed = removed.len(), timeout_ms, "inactive participants removed");
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn set_and_get() {
        let ledger = StatusLedger::new();
        assert!(ledger.set_status("alice", StatusValue::Green, 10).is_none());
        assert_eq!(ledger.status("alice"), Some(StatusValue::Green));
        assert_eq!(ledger.get("alice").unwrap().last_seen_ms, 10);
        assert!(ledger.contains("alice"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn set_replaces_and_returns_previous() {
        let ledger = StatusLedger::new();
        ledger.set_status("alice", StatusValue::Green, 10);
        let prev = ledger.set_status("alice", StatusValue::Red, 20).unwrap();
        assert_eq!(prev.status, StatusValue::Green);
        assert_eq!(prev.last_seen_ms, 10);
        assert_eq!(ledger.get("alice").unwrap(), ParticipantSession::new(StatusValue::Red, 20));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unknown_participant() {
        let ledger = StatusLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.get("ghost").is_none());
        assert!(ledger.status("ghost").is_none());
        assert!(!ledger.contains("ghost"));
        assert!(!ledger.touch("ghost", 5));
        assert!(ledger.remove("ghost").is_none());
    }

    #[test]
    fn touch_refreshes_last_seen_only() {
        let ledger = StatusLedger::new();
        ledger.set_status("bob", StatusValue::Yellow, 1);
        assert!(ledger.touch("bob", 99));
        let session = ledger.get("bob").unwrap();
        assert_eq!(session.status, StatusValue::Yellow);
        assert_eq!(session.last_seen_ms, 99);
    }

    #[test]
    fn update_returns_closure_result() {
        let ledger = StatusLedger::new();
        ledger.set_status("bob", StatusValue::Yellow, 1);
        let old = ledger.update("bob", |s| std::mem::replace(&mut s.status, StatusValue::Red));
        assert_eq!(old, Some(StatusValue::Yellow));
        assert_eq!(ledger.status("bob"), Some(StatusValue::Red));
        assert_eq!(ledger.update("ghost", |_| ()), None);
    }

    #[test]
    fn remove_returns_session() {
        let ledger = StatusLedger::new();
        ledger.set_status("carol", StatusValue::Red, 3);
        assert_eq!(ledger.remove("carol").unwrap().status, StatusValue::Red);
        assert!(ledger.is_empty());
    }

    #[test]
    fn statuses_and_entries_copy_everything() {
        let ledger = StatusLedger::new();
        ledger.set_status("a", StatusValue::Green, 1);
        ledger.set_status("b", StatusValue::Green, 2);
        ledger.set_status("c", StatusValue::Red, 3);

        let mut statuses = ledger.statuses();
        statuses.sort();
        assert_eq!(statuses, vec![StatusValue::Green, StatusValue::Green, StatusValue::Red]);

        let mut entries = ledger.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].0, "c");
        assert_eq!(entries[2].1.last_seen_ms, 3);

        let mut ids = ledger.ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn copies_are_detached_from_later_writes() {
        let ledger = StatusLedger::new();
        ledger.set_status("a", StatusValue::Green, 1);
        let before = ledger.statuses();
        ledger.set_status("b", StatusValue::Red, 2);
        ledger.remove("a");
        assert_eq!(before, vec![StatusValue::Green]);
    }

    #[test]
    fn remove_inactive_uses_strict_timeout() {
        let ledger = StatusLedger::new();
        ledger.set_status("stale", StatusValue::Green, 0);
        ledger.set_status("edge", StatusValue::Green, 40);
        ledger.set_status("fresh", StatusValue::Green, 90);

        let mut removed = ledger.remove_inactive(60, 100);
        removed.sort();
        assert_eq!(removed, vec!["stale"]);
        assert!(ledger.contains("edge"));
        assert!(ledger.contains("fresh"));
    }

    #[test]
    fn session_inactivity() {
        let session = ParticipantSession::new(StatusValue::Unknown, 1_000);
        assert!(!session.is_inactive(500, 1_500));
        assert!(session.is_inactive(500, 1_501));
    }

    #[test]
    fn concurrent_writers_and_snapshot_readers() {
        let ledger = Arc::new(StatusLedger::new());
        let mut handles = Vec::new();

        for t in 0..4 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    let status = StatusValue::ALL[i % StatusValue::COUNT];
                    ledger.set_status(format!("t{t}-p{}", i % 50), status, i as i64);
                }
            }));
        }
        for _ in 0..2 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let entries = ledger.entries();
                    assert!(entries.len() <= 200);
                    let statuses = ledger.statuses();
                    assert!(statuses.len() <= 200);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.len(), 200);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let ledger = Arc::new(StatusLedger::new());
        ledger.set_status("a", StatusValue::Green, 1);

        let poisoner = Arc::clone(&ledger);
        let result = thread::spawn(move || {
            let _guard = poisoner.sessions.write().unwrap();
            panic!("poison the ledger");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(ledger.status("a"), Some(StatusValue::Green));
        ledger.set_status("b", StatusValue::Red, 2);
        assert_eq!(ledger.len(), 2);
    }
}
