//! Sorted, deduplicating buffer of pending check failures.
//!
//! Check execution records a failure here instead of writing to the store
//! directly. The buffer keeps at most one record per check, the most recently
//! observed one, sorted by check id so insertion positions are found by
//! binary search. [`crate::flush::FlushOrchestrator`] drains it in one batch.
//!
//! Allocation failure while growing the buffer or copying a message aborts
//! the process, like every other allocation in the server. There is no
//! degraded mode: a partially applied insert would break the ordering and
//! uniqueness guarantees.

use nc_common::{CheckId, Timestamp};
use nc_config::BufferConfig;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::logging::{event_names, Stage};

/// One pending failure of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailureRecord {
    pub check_id: CheckId,
    pub observed_at: Timestamp,
    pub message: String,
}

/// What [`FailureBuffer::record`] did with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First pending failure for this check.
    Inserted,
    /// Replaced an older pending failure for this check.
    Replaced,
    /// A same-or-newer failure is already pending; nothing changed.
    Stale,
    /// Empty message; nothing to record.
    Ignored,
}

/// Pending check failures, unique by check id and sorted ascending.
///
/// Not synchronized: callers serialize `record` and `flush` themselves.
#[derive(Debug)]
pub struct FailureBuffer {
    records: Vec<CheckFailureRecord>,
    growth_step: usize,
}

impl Default for FailureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureBuffer {
    /// Default number of records added per growth.
    pub const DEFAULT_GROWTH_STEP: usize = 64;

    /// Create an empty buffer. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_growth_step(Self::DEFAULT_GROWTH_STEP)
    }

    /// Create an empty buffer that grows by at least `growth_step` records.
    pub fn with_growth_step(growth_step: usize) -> Self {
        FailureBuffer {
            records: Vec::new(),
            growth_step: growth_step.max(1),
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::with_growth_step(config.growth_step)
    }

    /// Record a failure of `check_id` observed at `observed_at`.
    ///
    /// An empty `message` means the check succeeded and is ignored. If a
    /// failure is already pending for the check, the newer observation wins;
    /// on equal timestamps the pending one is kept.
    pub fn record(
        &mut self,
        check_id: CheckId,
        observed_at: Timestamp,
        message: &str,
    ) -> RecordOutcome {
        if message.is_empty() {
            return RecordOutcome::Ignored;
        }

        match self
            .records
            .binary_search_by_key(&check_id, |record| record.check_id)
        {
            Ok(index) => {
                let existing = &mut self.records[index];
                if existing.observed_at >= observed_at {
                    return RecordOutcome::Stale;
                }
                // Same key, so the sorted position is unchanged.
                existing.observed_at = observed_at;
                existing.message = message.to_owned();
                trace!(
                    event = event_names::RECORD_REPLACED,
                    stage = %Stage::Record,
                    check_id = %check_id,
                    observed_at = %observed_at,
                    "replaced pending failure"
                );
                RecordOutcome::Replaced
            }
            Err(index) => {
                if self.records.len() == self.records.capacity() {
                    self.records.reserve(self.growth_step);
                }
                self.records.insert(
                    index,
                    CheckFailureRecord {
                        check_id,
                        observed_at,
                        message: message.to_owned(),
                    },
                );
                trace!(
                    event = event_names::RECORD_INSERTED,
                    stage = %Stage::Record,
                    check_id = %check_id,
                    observed_at = %observed_at,
                    pending = self.records.len(),
                    "buffered failure"
                );
                RecordOutcome::Inserted
            }
        }
    }

    /// Take every pending record, ascending by check id.
    ///
    /// The buffer is left empty but keeps its capacity for the next cycle.
    pub fn drain_all(&mut self) -> Vec<CheckFailureRecord> {
        self.records.drain(..).collect()
    }

    /// Pending record for `check_id`, if any.
    pub fn get(&self, check_id: CheckId) -> Option<&CheckFailureRecord> {
        self.records
            .binary_search_by_key(&check_id, |record| record.check_id)
            .ok()
            .map(|index| &self.records[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckFailureRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }
}
