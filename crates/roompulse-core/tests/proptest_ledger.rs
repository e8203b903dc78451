//! Property-based tests for the status ledger.
//!
//! Tests cover: set/get agreement with a HashMap model, statuses/entries
//! consistency, touch and update semantics, remove_inactive partitioning,
//! and recording a ledger through the recorder.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use roompulse_core::clock::ManualClock;
use roompulse_core::config::RetentionConfig;
use roompulse_core::ledger::{ParticipantSession, StatusLedger};
use roompulse_core::recorder::StatusRecorder;
use roompulse_core::status::StatusValue;

// ============================================================================
// Strategies
// ============================================================================

fn arb_status() -> impl Strategy<Value = StatusValue> {
    prop::sample::select(StatusValue::ALL.to_vec())
}

/// Small id space so writes collide.
fn arb_id() -> impl Strategy<Value = String> {
    (0u8..16).prop_map(|n| format!("p{n}"))
}

#[derive(Debug, Clone)]
enum Op {
    Set(String, StatusValue, i64),
    Touch(String, i64),
    Remove(String),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (arb_id(), arb_status(), 0i64..10_000).prop_map(|(id, s, t)| Op::Set(id, s, t)),
        2 => (arb_id(), 0i64..10_000).prop_map(|(id, t)| Op::Touch(id, t)),
        1 => arb_id().prop_map(Op::Remove),
    ]
}

fn apply(ledger: &StatusLedger, model: &mut HashMap<String, ParticipantSession>, op: &Op) {
    match op {
        Op::Set(id, status, t) => {
            let prev = ledger.set_status(id.clone(), *status, *t);
            assert_eq!(prev, model.insert(id.clone(), ParticipantSession::new(*status, *t)));
        }
        Op::Touch(id, t) => {
            let touched = ledger.touch(id, *t);
            let expected = model.get_mut(id).map(|s| s.last_seen_ms = *t).is_some();
            assert_eq!(touched, expected);
        }
        Op::Remove(id) => {
            assert_eq!(ledger.remove(id), model.remove(id));
        }
    }
}

// ============================================================================
// Model agreement
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The ledger behaves like a plain HashMap under any op sequence.
    #[test]
    fn ledger_matches_hashmap_model(ops in prop::collection::vec(arb_op(), 0..120)) {
        let ledger = StatusLedger::new();
        let mut model = HashMap::new();
        for op in &ops {
            apply(&ledger, &mut model, op);
        }

        prop_assert_eq!(ledger.len(), model.len());
        prop_assert_eq!(ledger.is_empty(), model.is_empty());
        for (id, session) in &model {
            prop_assert_eq!(ledger.get(id), Some(*session));
            prop_assert_eq!(ledger.status(id), Some(session.status));
        }

        let mut entries = ledger.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut expected: Vec<_> = model.into_iter().collect();
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        prop_assert_eq!(entries, expected);
    }

    /// statuses() is the multiset of entry statuses.
    #[test]
    fn statuses_agree_with_entries(ops in prop::collection::vec(arb_op(), 0..80)) {
        let ledger = StatusLedger::new();
        let mut model = HashMap::new();
        for op in &ops {
            apply(&ledger, &mut model, op);
        }

        let mut statuses = ledger.statuses();
        statuses.sort();
        let mut from_entries: Vec<_> = ledger.entries().into_iter().map(|(_, s)| s.status).collect();
        from_entries.sort();
        prop_assert_eq!(statuses, from_entries);
    }
}

// ============================================================================
// Inactivity sweep
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// remove_inactive splits sessions exactly at the timeout.
    #[test]
    fn remove_inactive_partitions_by_timeout(
        ops in prop::collection::vec(arb_op(), 0..80),
        timeout in 0i64..5_000,
        now in 5_000i64..15_000,
    ) {
        let ledger = StatusLedger::new();
        let mut model = HashMap::new();
        for op in &ops {
            apply(&ledger, &mut model, op);
        }

        let mut removed = ledger.remove_inactive(timeout, now);
        removed.sort();
        let mut expected: Vec<_> = model
            .iter()
            .filter(|(_, s)| now - s.last_seen_ms > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        expected.sort();
        prop_assert_eq!(&removed, &expected);

        for (_, session) in ledger.entries() {
            prop_assert!(!session.is_inactive(timeout, now));
        }
        prop_assert_eq!(ledger.len() + removed.len(), model.len());
    }
}

// ============================================================================
// Recording a ledger
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A recorded snapshot counts exactly the ledger's current statuses.
    #[test]
    fn recorded_snapshot_counts_ledger(ops in prop::collection::vec(arb_op(), 0..80)) {
        let ledger = StatusLedger::new();
        let mut model = HashMap::new();
        for op in &ops {
            apply(&ledger, &mut model, op);
        }

        let clock = Arc::new(ManualClock::new(1_000));
        let recorder = StatusRecorder::new(RetentionConfig::default(), clock).unwrap();
        prop_assert!(recorder.record_ledger(&ledger).is_recorded());

        let snap = recorder.latest().unwrap();
        prop_assert_eq!(snap.total(), model.len() as u64);
        for status in StatusValue::ALL {
            let expected = model.values().filter(|s| s.status == status).count() as u32;
            prop_assert_eq!(snap.count(status), expected);
        }
    }
}
