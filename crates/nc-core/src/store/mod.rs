//! Batched-write contract of the persistent store.
//!
//! A flush opens one [`StatementBatch`], appends a conditional state-update
//! per affected trigger, finishes the batch, and hands it back to the
//! [`PersistentStore`] for atomic submission. Statement limits and overflow
//! chunking are the store's business; callers only append logical updates.

pub mod sql;

pub use sql::{trigger_update_sql, SqlBatch, SqlExecutor, SqlStore};

use nc_common::{Timestamp, TriggerId, TriggerPriority, TriggerState, TriggerValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::TriggerRecord;

/// Errors from store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("statement execution failed: {0}")]
    Execute(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("batch submitted before it was finished")]
    Unfinished,
}

/// Stored fields one appended statement rewrites.
///
/// A batch records one per appended statement. Once the batch is committed
/// the configuration cache applies them, and downstream event generation
/// picks out the ones where [`StateChange::changes_state`] holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub trigger_id: TriggerId,
    pub priority: TriggerPriority,
    /// Trigger value at the time of the change.
    pub value: TriggerValue,
    pub previous_state: TriggerState,
    pub new_state: TriggerState,
    pub new_error: String,
    pub timestamp: Timestamp,
}

impl StateChange {
    /// Change record for moving `trigger` to `new_state` / `new_error`.
    pub fn for_update(
        trigger: &TriggerRecord,
        new_state: TriggerState,
        new_error: &str,
        timestamp: Timestamp,
    ) -> Self {
        StateChange {
            trigger_id: trigger.trigger_id,
            priority: trigger.priority,
            value: trigger.value,
            previous_state: trigger.state,
            new_state,
            new_error: new_error.to_string(),
            timestamp,
        }
    }

    /// Whether the evaluation state moves, as opposed to an error-only
    /// rewrite.
    pub fn changes_state(&self) -> bool {
        self.previous_state != self.new_state
    }
}

/// A batch of state-update statements under construction.
pub trait StatementBatch {
    /// Append one conditional update moving `trigger` to `new_state` with
    /// `new_error`, stamped with `timestamp`.
    ///
    /// Returns `false` when the update would not change stored state; nothing
    /// is appended in that case.
    fn append_trigger_update(
        &mut self,
        trigger: &TriggerRecord,
        new_state: TriggerState,
        new_error: &str,
        timestamp: Timestamp,
    ) -> bool;

    /// Close the batch. Further appends are a logic error.
    fn finish(&mut self);

    /// Number of real statements appended.
    fn statement_count(&self) -> usize;

    /// Whether the batch carries anything worth submitting.
    fn has_statements(&self) -> bool {
        self.statement_count() > 0
    }

    /// One change record per appended statement, in append order.
    fn state_changes(&self) -> &[StateChange];
}

/// A persistent store that accepts atomic statement batches.
pub trait PersistentStore {
    type Batch: StatementBatch;

    /// Open an empty batch.
    fn begin_batch(&mut self) -> Self::Batch;

    /// Apply a finished batch atomically.
    fn submit(&mut self, batch: Self::Batch) -> Result<(), StoreError>;
}
