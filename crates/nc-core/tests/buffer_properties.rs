//! Property-based tests for the failure buffer.
//!
//! Checks ordering, uniqueness, and recency against a simple model over
//! arbitrary sequences of `record` calls.

use std::collections::BTreeMap;

use nc_common::{CheckId, Timestamp};
use nc_core::{FailureBuffer, RecordOutcome};
use proptest::prelude::*;

/// (check id, observed at, message) with a small id space to force collisions.
fn failure() -> impl Strategy<Value = (u64, i64, String)> {
    (0u64..32, 0i64..50, prop_oneof![Just(String::new()), "[a-z]{1,8}"])
}

/// Reference model: newest observation per check, ties keep the first.
fn model(failures: &[(u64, i64, String)]) -> BTreeMap<u64, (i64, String)> {
    let mut expected: BTreeMap<u64, (i64, String)> = BTreeMap::new();
    for (id, ts, msg) in failures {
        if msg.is_empty() {
            continue;
        }
        match expected.get(id) {
            Some((stored, _)) if *stored >= *ts => {}
            _ => {
                expected.insert(*id, (*ts, msg.clone()));
            }
        }
    }
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Drained records are strictly ascending, hence unique by check id.
    #[test]
    fn drained_records_strictly_ascending(failures in prop::collection::vec(failure(), 0..200)) {
        let mut buffer = FailureBuffer::with_growth_step(4);
        for (id, ts, msg) in &failures {
            buffer.record(CheckId(*id), Timestamp(*ts), msg);
        }

        let drained = buffer.drain_all();
        for pair in drained.windows(2) {
            prop_assert!(pair[0].check_id < pair[1].check_id,
                "{} not before {}", pair[0].check_id, pair[1].check_id);
        }
    }

    /// Buffer contents match the newest-wins model exactly.
    #[test]
    fn drained_records_match_model(failures in prop::collection::vec(failure(), 0..200)) {
        let mut buffer = FailureBuffer::new();
        for (id, ts, msg) in &failures {
            buffer.record(CheckId(*id), Timestamp(*ts), msg);
        }

        let drained: BTreeMap<u64, (i64, String)> = buffer
            .drain_all()
            .into_iter()
            .map(|r| (r.check_id.0, (r.observed_at.0, r.message)))
            .collect();
        prop_assert_eq!(drained, model(&failures));
    }

    /// No drained record carries an empty message.
    #[test]
    fn empty_messages_never_stored(failures in prop::collection::vec(failure(), 0..100)) {
        let mut buffer = FailureBuffer::new();
        for (id, ts, msg) in &failures {
            let outcome = buffer.record(CheckId(*id), Timestamp(*ts), msg);
            if msg.is_empty() {
                prop_assert_eq!(outcome, RecordOutcome::Ignored);
            }
        }
        prop_assert!(buffer.drain_all().iter().all(|r| !r.message.is_empty()));
    }

    /// Last-writer-wins for a single check.
    #[test]
    fn newer_observation_wins(t1 in 0i64..1000, t2 in 0i64..1000) {
        let mut buffer = FailureBuffer::new();
        buffer.record(CheckId(1), Timestamp(t1), "a");
        buffer.record(CheckId(1), Timestamp(t2), "b");

        let drained = buffer.drain_all();
        prop_assert_eq!(drained.len(), 1);
        if t2 > t1 {
            prop_assert_eq!(drained[0].observed_at, Timestamp(t2));
            prop_assert_eq!(drained[0].message.as_str(), "b");
        } else {
            prop_assert_eq!(drained[0].observed_at, Timestamp(t1));
            prop_assert_eq!(drained[0].message.as_str(), "a");
        }
    }

    /// Draining twice yields nothing the second time.
    #[test]
    fn second_drain_is_empty(failures in prop::collection::vec(failure(), 0..50)) {
        let mut buffer = FailureBuffer::new();
        for (id, ts, msg) in &failures {
            buffer.record(CheckId(*id), Timestamp(*ts), msg);
        }
        buffer.drain_all();
        prop_assert!(buffer.is_empty());
        prop_assert!(buffer.drain_all().is_empty());
    }
}
