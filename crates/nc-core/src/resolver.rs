//! Mapping failed checks to the triggers that depend on them.
//!
//! [`TriggerResolver`] is the seam the flush pipeline calls through.
//! [`DependencyIndex`] is the in-memory implementation backed by the
//! configuration cache's view of triggers and the checks their expressions
//! reference.

use std::collections::{HashMap, HashSet};

use nc_common::{
    CheckId, Error, Result, Timestamp, TriggerId, TriggerPriority, TriggerState, TriggerStatus,
    TriggerType, TriggerValue,
};
use nc_config::ResolverConfig;
use serde::{Deserialize, Serialize};

use crate::store::StateChange;

/// Stored fields of a trigger as last known to the configuration cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub trigger_id: TriggerId,
    pub description: String,
    pub expression: String,
    pub priority: TriggerPriority,
    pub trigger_type: TriggerType,
    pub status: TriggerStatus,
    pub state: TriggerState,
    pub value: TriggerValue,
    pub error: String,
    pub last_change: Timestamp,
}

impl TriggerRecord {
    /// Enabled trigger in normal state with no error.
    pub fn new(
        trigger_id: TriggerId,
        description: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        TriggerRecord {
            trigger_id,
            description: description.into(),
            expression: expression.into(),
            priority: TriggerPriority::default(),
            trigger_type: TriggerType::default(),
            status: TriggerStatus::Enabled,
            state: TriggerState::Normal,
            value: TriggerValue::Ok,
            error: String::new(),
            last_change: Timestamp::default(),
        }
    }
}

/// A trigger affected by a failed check, with the annotation to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerUpdate {
    /// Current stored fields, used for the conditional update.
    pub trigger: TriggerRecord,
    /// Error annotation computed from the failing check.
    pub new_error: String,
    /// When the failure was observed; stamps the state change.
    pub timestamp: Timestamp,
}

/// Resolves failed checks to the triggers depending on them.
pub trait TriggerResolver {
    /// Return the triggers affected by the given failures.
    ///
    /// `check_ids`, `timestamps`, and `errors` are index-aligned. The result
    /// holds each trigger at most once, in the resolver's own order. Checks
    /// without dependent triggers contribute nothing. Implementations copy
    /// what they need from `errors`; nothing is borrowed past the call.
    fn resolve_affected_triggers(
        &self,
        check_ids: &[CheckId],
        timestamps: &[Timestamp],
        errors: &[String],
    ) -> Vec<TriggerUpdate>;
}

impl<T: TriggerResolver + ?Sized> TriggerResolver for &T {
    fn resolve_affected_triggers(
        &self,
        check_ids: &[CheckId],
        timestamps: &[Timestamp],
        errors: &[String],
    ) -> Vec<TriggerUpdate> {
        (**self).resolve_affected_triggers(check_ids, timestamps, errors)
    }
}

/// Check → trigger dependency index over cached trigger records.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    triggers: HashMap<TriggerId, TriggerRecord>,
    links: HashMap<CheckId, Vec<TriggerId>>,
    config: ResolverConfig,
}

impl DependencyIndex {
    pub fn new(config: ResolverConfig) -> Self {
        DependencyIndex {
            triggers: HashMap::new(),
            links: HashMap::new(),
            config,
        }
    }

    /// Insert or replace a trigger record, returning the previous one.
    pub fn insert_trigger(&mut self, record: TriggerRecord) -> Option<TriggerRecord> {
        self.triggers.insert(record.trigger_id, record)
    }

    /// Declare that `trigger_id`'s expression references `check_id`.
    ///
    /// Links are kept in declaration order; repeated links are ignored.
    pub fn link(&mut self, check_id: CheckId, trigger_id: TriggerId) -> Result<()> {
        if !self.triggers.contains_key(&trigger_id) {
            return Err(Error::TriggerNotFound { trigger_id });
        }
        let linked = self.links.entry(check_id).or_default();
        if !linked.contains(&trigger_id) {
            linked.push(trigger_id);
        }
        Ok(())
    }

    /// Remove a trigger and every link to it.
    pub fn remove_trigger(&mut self, trigger_id: TriggerId) -> Option<TriggerRecord> {
        let removed = self.triggers.remove(&trigger_id)?;
        self.links.retain(|_, linked| {
            linked.retain(|id| *id != trigger_id);
            !linked.is_empty()
        });
        Some(removed)
    }

    pub fn trigger(&self, trigger_id: TriggerId) -> Option<&TriggerRecord> {
        self.triggers.get(&trigger_id)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Bring cached records in line with state changes a store committed.
    pub fn apply_state_changes(&mut self, changes: &[StateChange]) {
        for change in changes {
            if let Some(record) = self.triggers.get_mut(&change.trigger_id) {
                if change.changes_state() {
                    record.state = change.new_state;
                    record.last_change = change.timestamp;
                }
                record.error = change.new_error.clone();
            }
        }
    }
}

impl TriggerResolver for DependencyIndex {
    fn resolve_affected_triggers(
        &self,
        check_ids: &[CheckId],
        timestamps: &[Timestamp],
        errors: &[String],
    ) -> Vec<TriggerUpdate> {
        debug_assert_eq!(check_ids.len(), timestamps.len());
        debug_assert_eq!(check_ids.len(), errors.len());
        let count = check_ids.len().min(timestamps.len()).min(errors.len());

        let mut seen: HashSet<TriggerId> =
            HashSet::with_capacity(self.config.min_index_capacity.max(2 * count));
        let mut updates = Vec::with_capacity(count);

        let failures = check_ids.iter().zip(timestamps).zip(errors);
        for ((check_id, timestamp), error) in failures {
            let Some(linked) = self.links.get(check_id) else {
                continue;
            };
            for trigger_id in linked {
                let Some(record) = self.triggers.get(trigger_id) else {
                    continue;
                };
                if record.status == TriggerStatus::Disabled {
                    continue;
                }
                // First failing check wins for a trigger with several.
                if !seen.insert(*trigger_id) {
                    continue;
                }
                updates.push(TriggerUpdate {
                    trigger: record.clone(),
                    new_error: truncate_chars(error, self.config.error_max_len),
                    timestamp: *timestamp,
                });
            }
        }

        updates
    }
}

/// Copy at most `max_chars` characters of `s`.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => s[..byte_index].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(triggers: &[(u64, Vec<u64>)]) -> DependencyIndex {
        let mut index = DependencyIndex::new(ResolverConfig::default());
        for (trigger_id, checks) in triggers {
            index.insert_trigger(TriggerRecord::new(
                TriggerId(*trigger_id),
                format!("trigger {}", trigger_id),
                "{last(0)}>0",
            ));
            for check_id in checks {
                index.link(CheckId(*check_id), TriggerId(*trigger_id)).unwrap();
            }
        }
        index
    }

    fn resolve(index: &DependencyIndex, failures: &[(u64, i64, &str)]) -> Vec<TriggerUpdate> {
        let ids: Vec<CheckId> = failures.iter().map(|f| CheckId(f.0)).collect();
        let ts: Vec<Timestamp> = failures.iter().map(|f| Timestamp(f.1)).collect();
        let errors: Vec<String> = failures.iter().map(|f| f.2.to_string()).collect();
        index.resolve_affected_triggers(&ids, &ts, &errors)
    }

    #[test]
    fn test_unlinked_checks_are_dropped() {
        let index = index_with(&[(1, vec![100])]);
        let updates = resolve(&index, &[(100, 10, "timeout"), (999, 11, "refused")]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].trigger.trigger_id, TriggerId(1));
        assert_eq!(updates[0].new_error, "timeout");
        assert_eq!(updates[0].timestamp, Timestamp(10));
    }

    #[test]
    fn test_trigger_on_two_checks_resolved_once() {
        let index = index_with(&[(1, vec![100, 200]), (2, vec![200])]);
        let updates = resolve(&index, &[(100, 10, "first"), (200, 20, "second")]);

        let ids: Vec<u64> = updates.iter().map(|u| u.trigger.trigger_id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(updates[0].new_error, "first");
        assert_eq!(updates[1].new_error, "second");
    }

    #[test]
    fn test_disabled_triggers_are_skipped() {
        let mut index = index_with(&[(1, vec![100]), (2, vec![100])]);
        let mut disabled = index.trigger(TriggerId(2)).unwrap().clone();
        disabled.status = TriggerStatus::Disabled;
        index.insert_trigger(disabled);

        let updates = resolve(&index, &[(100, 10, "timeout")]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].trigger.trigger_id, TriggerId(1));
    }

    #[test]
    fn test_link_unknown_trigger_fails() {
        let mut index = DependencyIndex::new(ResolverConfig::default());
        let err = index.link(CheckId(1), TriggerId(7)).unwrap_err();
        assert!(matches!(err, Error::TriggerNotFound { trigger_id } if trigger_id == TriggerId(7)));
    }

    #[test]
    fn test_remove_trigger_drops_links() {
        let mut index = index_with(&[(1, vec![100]), (2, vec![100])]);
        assert!(index.remove_trigger(TriggerId(1)).is_some());
        assert!(index.remove_trigger(TriggerId(1)).is_none());

        let updates = resolve(&index, &[(100, 10, "timeout")]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].trigger.trigger_id, TriggerId(2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_error_is_truncated_on_char_boundary() {
        let mut index = DependencyIndex::new(ResolverConfig {
            min_index_capacity: 1,
            error_max_len: 3,
        });
        index.insert_trigger(TriggerRecord::new(TriggerId(1), "t", "e"));
        index.link(CheckId(1), TriggerId(1)).unwrap();

        let updates = resolve(&index, &[(1, 5, "ééééé")]);
        assert_eq!(updates[0].new_error, "ééé");
    }

    #[test]
    fn test_apply_state_changes() {
        let mut index = index_with(&[(1, vec![100])]);
        let record = index.trigger(TriggerId(1)).unwrap().clone();
        index.apply_state_changes(&[StateChange::for_update(
            &record,
            TriggerState::Unknown,
            "timeout",
            Timestamp(42),
        )]);
        let record = index.trigger(TriggerId(1)).unwrap();
        assert_eq!(record.state, TriggerState::Unknown);
        assert_eq!(record.error, "timeout");
        assert_eq!(record.last_change, Timestamp(42));
    }

    #[test]
    fn test_apply_error_only_change_keeps_last_change() {
        let mut index = index_with(&[(1, vec![100])]);
        let mut record = index.trigger(TriggerId(1)).unwrap().clone();
        record.state = TriggerState::Unknown;
        record.error = "timeout".into();
        record.last_change = Timestamp(10);
        index.insert_trigger(record.clone());

        index.apply_state_changes(&[StateChange::for_update(
            &record,
            TriggerState::Unknown,
            "connection refused",
            Timestamp(42),
        )]);
        let record = index.trigger(TriggerId(1)).unwrap();
        assert_eq!(record.state, TriggerState::Unknown);
        assert_eq!(record.error, "connection refused");
        assert_eq!(record.last_change, Timestamp(10));
    }
}
