//! Test utilities for nc-core.
//!
//! This module provides in-memory collaborators for exercising the flush
//! pipeline without a database:
//! - [`StaticResolver`]: fixed check → trigger mapping that records its input
//! - [`RecordingStore`]: store that keeps submitted batches for inspection
//! - [`RecordingExecutor`]: SQL executor that records every call

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use nc_common::{CheckId, Timestamp, TriggerId, TriggerState};

use crate::resolver::{TriggerRecord, TriggerResolver, TriggerUpdate};
use crate::store::{PersistentStore, SqlExecutor, StateChange, StatementBatch, StoreError};

// ============================================================================
// Resolver
// ============================================================================

/// Resolver over a fixed list of (check, trigger) links.
#[derive(Debug, Default)]
pub struct StaticResolver {
    links: Vec<(CheckId, TriggerRecord)>,
    calls: Cell<usize>,
    last_input: RefCell<Vec<(CheckId, Timestamp, String)>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `trigger` depend on `check_id`.
    pub fn with_link(mut self, check_id: u64, trigger: TriggerRecord) -> Self {
        self.links.push((CheckId(check_id), trigger));
        self
    }

    /// Number of resolve calls so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Input of the most recent resolve call, re-zipped.
    pub fn last_input(&self) -> Vec<(CheckId, Timestamp, String)> {
        self.last_input.borrow().clone()
    }
}

impl TriggerResolver for StaticResolver {
    fn resolve_affected_triggers(
        &self,
        check_ids: &[CheckId],
        timestamps: &[Timestamp],
        errors: &[String],
    ) -> Vec<TriggerUpdate> {
        self.calls.set(self.calls.get() + 1);
        *self.last_input.borrow_mut() = check_ids
            .iter()
            .zip(timestamps)
            .zip(errors)
            .map(|((id, ts), err)| (*id, *ts, err.clone()))
            .collect();

        let mut seen = HashSet::new();
        let mut updates = Vec::new();
        for ((check_id, timestamp), error) in check_ids.iter().zip(timestamps).zip(errors) {
            for (linked_check, trigger) in &self.links {
                if linked_check == check_id && seen.insert(trigger.trigger_id) {
                    updates.push(TriggerUpdate {
                        trigger: trigger.clone(),
                        new_error: error.clone(),
                        timestamp: *timestamp,
                    });
                }
            }
        }
        updates
    }
}

// ============================================================================
// Store
// ============================================================================

/// One statement appended to a [`RecordingBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStatement {
    pub trigger_id: TriggerId,
    pub new_state: TriggerState,
    pub new_error: String,
    pub timestamp: Timestamp,
}

/// Batch that records appended statements.
#[derive(Debug, Default)]
pub struct RecordingBatch {
    skip: HashSet<TriggerId>,
    pub statements: Vec<RecordedStatement>,
    pub skipped: Vec<TriggerId>,
    pub finished: bool,
    state_changes: Vec<StateChange>,
}

impl StatementBatch for RecordingBatch {
    fn append_trigger_update(
        &mut self,
        trigger: &TriggerRecord,
        new_state: TriggerState,
        new_error: &str,
        timestamp: Timestamp,
    ) -> bool {
        assert!(!self.finished, "append after finish");
        if self.skip.contains(&trigger.trigger_id) {
            self.skipped.push(trigger.trigger_id);
            return false;
        }
        self.statements.push(RecordedStatement {
            trigger_id: trigger.trigger_id,
            new_state,
            new_error: new_error.to_string(),
            timestamp,
        });
        self.state_changes.push(StateChange::for_update(trigger, new_state, new_error, timestamp));
        true
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    fn statement_count(&self) -> usize {
        self.statements.len()
    }

    fn state_changes(&self) -> &[StateChange] {
        &self.state_changes
    }
}

/// Store that keeps every submitted batch.
#[derive(Debug, Default)]
pub struct RecordingStore {
    skip: HashSet<TriggerId>,
    fail_submit: bool,
    begun: usize,
    submitted: Vec<RecordingBatch>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat updates of `trigger_id` as no-ops.
    pub fn skipping(mut self, trigger_id: u64) -> Self {
        self.skip.insert(TriggerId(trigger_id));
        self
    }

    /// Reject every submission.
    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn batches_begun(&self) -> usize {
        self.begun
    }

    pub fn submitted(&self) -> &[RecordingBatch] {
        &self.submitted
    }
}

impl PersistentStore for RecordingStore {
    type Batch = RecordingBatch;

    fn begin_batch(&mut self) -> RecordingBatch {
        self.begun += 1;
        RecordingBatch {
            skip: self.skip.clone(),
            ..RecordingBatch::default()
        }
    }

    fn submit(&mut self, batch: RecordingBatch) -> Result<(), StoreError> {
        if !batch.finished {
            return Err(StoreError::Unfinished);
        }
        if self.fail_submit {
            return Err(StoreError::Transaction("connection reset".to_string()));
        }
        self.submitted.push(batch);
        Ok(())
    }
}

// ============================================================================
// SQL executor
// ============================================================================

/// A call made against a [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Begin,
    Execute(String),
    Commit,
    Rollback,
}

/// SQL executor that records calls and can fail on demand.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Vec<ExecutorCall>,
    executions: usize,
    fail_on_execute: Option<usize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th execute call (1-based).
    pub fn failing_on_execute(mut self, n: usize) -> Self {
        self.fail_on_execute = Some(n);
        self
    }

    pub fn calls(&self) -> &[ExecutorCall] {
        &self.calls
    }

    /// SQL text of every successful execute call, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                ExecutorCall::Execute(sql) => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SqlExecutor for RecordingExecutor {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.calls.push(ExecutorCall::Begin);
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<u64, StoreError> {
        self.executions += 1;
        if self.fail_on_execute == Some(self.executions) {
            return Err(StoreError::Execute("deadlock detected".to_string()));
        }
        self.calls.push(ExecutorCall::Execute(sql.to_string()));
        Ok(sql.matches("update triggers").count() as u64)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.calls.push(ExecutorCall::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.calls.push(ExecutorCall::Rollback);
        Ok(())
    }
}
