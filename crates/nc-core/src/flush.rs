//! Flush pipeline: pending failures → one batched trigger update.
//!
//! A flush cycle:
//! 1. drains the [`FailureBuffer`] (nothing else happens if it is empty),
//! 2. asks the [`TriggerResolver`] which triggers depend on the failed checks,
//! 3. appends one conditional "state = unknown" update per trigger to a single
//!    [`StatementBatch`], skipping updates that would change nothing,
//! 4. submits the batch if at least one statement was appended.
//!
//! Appends are best-effort per trigger; the submitted batch is atomic. A
//! failed submission loses that batch only: the buffer was drained before
//! submission, and the next real failure of the same checks records them
//! again.

use nc_common::{Error, Result, StructuredError, TriggerState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::FailureBuffer;
use crate::logging::{event_names, generate_cycle_id, LogContext, Stage};
use crate::resolver::TriggerResolver;
use crate::store::{PersistentStore, StateChange, StatementBatch};

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    /// Failure records drained from the buffer.
    pub drained: usize,
    /// Distinct triggers the resolver returned.
    pub resolved: usize,
    /// Statements appended to the batch.
    pub appended: usize,
    /// Updates the batch skipped because they changed nothing.
    pub skipped: usize,
    /// Whether a batch was submitted.
    pub submitted: bool,
    /// Committed state changes, for downstream event generation.
    pub state_changes: Vec<StateChange>,
}

/// Converts buffered check failures into batched trigger updates.
pub struct FlushOrchestrator<R, S> {
    resolver: R,
    store: S,
    host_id: String,
}

impl<R: TriggerResolver, S: PersistentStore> FlushOrchestrator<R, S> {
    pub fn new(resolver: R, store: S) -> Self {
        FlushOrchestrator {
            resolver,
            store,
            host_id: crate::logging::get_host_id(),
        }
    }

    /// Override the host id attached to flush spans.
    pub fn with_host_id(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = host_id.into();
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_parts(self) -> (R, S) {
        (self.resolver, self.store)
    }

    /// Run one flush cycle over `buffer`.
    ///
    /// The buffer is empty when this returns, whatever the outcome. Only a
    /// failed batch submission is reported as an error.
    pub fn flush(&mut self, buffer: &mut FailureBuffer) -> Result<FlushReport> {
        if buffer.is_empty() {
            return Ok(FlushReport::default());
        }

        let ctx = LogContext::new(generate_cycle_id(), self.host_id.as_str());
        let _span = ctx.span().entered();
        debug!(
            event = event_names::FLUSH_STARTED,
            stage = %Stage::Drain,
            pending = buffer.len(),
            "flush started"
        );

        let report = self.run_cycle(buffer, &ctx)?;
        debug!(
            event = event_names::FLUSH_FINISHED,
            drained = report.drained,
            resolved = report.resolved,
            appended = report.appended,
            skipped = report.skipped,
            submitted = report.submitted,
            "flush finished"
        );
        Ok(report)
    }

    fn run_cycle(&mut self, buffer: &mut FailureBuffer, ctx: &LogContext) -> Result<FlushReport> {
        let records = buffer.drain_all();
        let mut report = FlushReport {
            drained: records.len(),
            ..FlushReport::default()
        };
        debug!(
            event = event_names::FLUSH_DRAINED,
            stage = %Stage::Drain,
            records = report.drained,
            "drained failure buffer"
        );

        let mut check_ids = Vec::with_capacity(records.len());
        let mut timestamps = Vec::with_capacity(records.len());
        let mut errors = Vec::with_capacity(records.len());
        for record in records {
            check_ids.push(record.check_id);
            timestamps.push(record.observed_at);
            errors.push(record.message);
        }

        let updates = self
            .resolver
            .resolve_affected_triggers(&check_ids, &timestamps, &errors);
        // The resolver keeps copies of what it needs.
        drop(errors);
        drop(timestamps);
        drop(check_ids);

        report.resolved = updates.len();
        debug!(
            event = event_names::FLUSH_RESOLVED,
            stage = %Stage::Resolve,
            triggers = report.resolved,
            "resolved affected triggers"
        );

        if updates.is_empty() {
            return Ok(report);
        }

        let mut batch = self.store.begin_batch();
        for update in updates {
            let appended = batch.append_trigger_update(
                &update.trigger,
                TriggerState::Unknown,
                &update.new_error,
                update.timestamp,
            );
            if appended {
                report.appended += 1;
            } else {
                report.skipped += 1;
                debug!(
                    event = event_names::FLUSH_STATEMENT_SKIPPED,
                    stage = %Stage::Batch,
                    trigger_id = %update.trigger.trigger_id,
                    "update would not change stored state"
                );
            }
            // `update` and its computed error are released here.
        }
        batch.finish();

        if !batch.has_statements() {
            return Ok(report);
        }

        let state_changes = batch.state_changes().to_vec();
        let statements = batch.statement_count();
        if let Err(e) = self.store.submit(batch) {
            let err = Error::SubmitFailed {
                statements,
                reason: e.to_string(),
            };
            let structured = StructuredError::from(&err).with_context("cycle_id", &ctx.cycle_id);
            warn!(
                event = event_names::FLUSH_SUBMIT_FAILED,
                stage = %Stage::Submit,
                error = %structured.to_json(),
                "dropping trigger update batch"
            );
            return Err(err);
        }

        report.submitted = true;
        report.state_changes = state_changes;
        info!(
            event = event_names::FLUSH_SUBMITTED,
            stage = %Stage::Submit,
            drained = report.drained,
            statements,
            state_changes = report.state_changes.len(),
            "marked triggers unknown"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{DependencyIndex, TriggerRecord};
    use crate::store::SqlStore;
    use crate::test_utils::{RecordingExecutor, RecordingStore, StaticResolver};
    use nc_common::{CheckId, Timestamp, TriggerId};
    use nc_config::{ResolverConfig, StoreConfig};

    #[test]
    fn test_empty_buffer_makes_no_calls() {
        let mut orchestrator =
            FlushOrchestrator::new(StaticResolver::new(), RecordingStore::new());
        let mut buffer = FailureBuffer::new();

        let report = orchestrator.flush(&mut buffer).unwrap();
        assert_eq!(report, FlushReport::default());
        assert_eq!(orchestrator.resolver().calls(), 0);
        assert_eq!(orchestrator.store().batches_begun(), 0);
    }

    #[test]
    fn test_resolver_receives_aligned_batch() {
        let mut orchestrator =
            FlushOrchestrator::new(StaticResolver::new(), RecordingStore::new());
        let mut buffer = FailureBuffer::new();
        buffer.record(CheckId(200), Timestamp(1000), "timeout");
        buffer.record(CheckId(100), Timestamp(1000), "timeout");
        buffer.record(CheckId(100), Timestamp(1005), "connection refused");

        orchestrator.flush(&mut buffer).unwrap();

        let seen = orchestrator.resolver().last_input();
        assert_eq!(
            seen,
            vec![
                (CheckId(100), Timestamp(1005), "connection refused".to_string()),
                (CheckId(200), Timestamp(1000), "timeout".to_string()),
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_end_to_end_with_sql_store() {
        let mut index = DependencyIndex::new(ResolverConfig::default());
        index.insert_trigger(TriggerRecord::new(TriggerId(1), "agent down", "{ping}=0"));
        index.link(CheckId(100), TriggerId(1)).unwrap();

        let store = SqlStore::new(RecordingExecutor::new(), StoreConfig::default());
        let mut orchestrator = FlushOrchestrator::new(&index, store).with_host_id("host-test");

        let mut buffer = FailureBuffer::new();
        buffer.record(CheckId(100), Timestamp(1005), "connection refused");

        let report = orchestrator.flush(&mut buffer).unwrap();
        assert!(report.submitted);
        assert_eq!(report.appended, 1);
        assert_eq!(report.state_changes.len(), 1);

        let (_, store) = orchestrator.into_parts();
        let executed = store.executor().executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("error='connection refused'"));
        assert!(executed[0].contains("lastchange=1005"));
    }
}
