//! SQL-text implementation of the batched store.
//!
//! Statements accumulate in chunks of at most `max_chunk_bytes`. Each chunk is
//! framed for the configured dialect (Oracle needs an anonymous
//! `begin ... end;` block to run several statements in one call). On submit
//! every chunk runs inside one transaction, so a batch is applied entirely or
//! not at all.

use nc_common::{Timestamp, TriggerState};
use nc_config::{SqlDialect, StoreConfig};
use tracing::{debug, warn};

use super::{PersistentStore, StateChange, StatementBatch, StoreError};
use crate::logging::{event_names, Stage};
use crate::resolver::TriggerRecord;

/// Executes SQL text against a database connection.
pub trait SqlExecutor {
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Run one chunk of statements, returning the affected row count.
    fn execute(&mut self, sql: &str) -> Result<u64, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Build the conditional update moving `trigger` to `new_state` / `new_error`.
///
/// Returns `None` when neither the state nor the error would change. A state
/// change also stamps `lastchange`. The `where` clause repeats the stored
/// state and `lastchange`, so the update is lost rather than misapplied if
/// another writer got there first.
pub fn trigger_update_sql(
    dialect: SqlDialect,
    trigger: &TriggerRecord,
    new_state: TriggerState,
    new_error: &str,
    timestamp: Timestamp,
) -> Option<String> {
    let state_changed = trigger.state != new_state;
    let error_changed = trigger.error != new_error;
    if !state_changed && !error_changed {
        return None;
    }

    let mut assignments = Vec::with_capacity(3);
    if state_changed {
        assignments.push(format!("state={}", new_state.as_db()));
        assignments.push(format!("lastchange={}", timestamp));
    }
    if error_changed {
        assignments.push(format!("error='{}'", escape_string(dialect, new_error)));
    }

    Some(format!(
        "update triggers set {} where triggerid={} and state={} and lastchange={}",
        assignments.join(","),
        trigger.trigger_id,
        trigger.state.as_db(),
        trigger.last_change,
    ))
}

/// Escape a value for a single-quoted SQL literal.
///
/// MySQL also treats backslash as an escape character inside literals.
fn escape_string(dialect: SqlDialect, value: &str) -> String {
    match dialect {
        SqlDialect::MySql => value.replace('\\', "\\\\").replace('\'', "\\'"),
        SqlDialect::Generic | SqlDialect::Oracle => value.replace('\'', "''"),
    }
}

/// Statement batch accumulating SQL text in dialect-framed chunks.
#[derive(Debug)]
pub struct SqlBatch {
    dialect: SqlDialect,
    max_chunk_bytes: usize,
    initial_capacity: usize,
    chunks: Vec<String>,
    current: String,
    current_statements: usize,
    statements: usize,
    state_changes: Vec<StateChange>,
    finished: bool,
}

impl SqlBatch {
    pub fn new(config: &StoreConfig) -> Self {
        let mut current = String::with_capacity(config.initial_capacity);
        current.push_str(config.dialect.block_begin());
        SqlBatch {
            dialect: config.dialect,
            max_chunk_bytes: config.max_chunk_bytes,
            initial_capacity: config.initial_capacity,
            chunks: Vec::new(),
            current,
            current_statements: 0,
            statements: 0,
            state_changes: Vec::new(),
            finished: false,
        }
    }

    /// Closed chunks, ready to execute in order.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn close_chunk(&mut self) {
        self.current.push_str(self.dialect.block_end());
        let mut next = String::with_capacity(self.initial_capacity);
        next.push_str(self.dialect.block_begin());
        let chunk = std::mem::replace(&mut self.current, next);
        self.chunks.push(chunk);
        self.current_statements = 0;
    }
}

impl StatementBatch for SqlBatch {
    fn append_trigger_update(
        &mut self,
        trigger: &TriggerRecord,
        new_state: TriggerState,
        new_error: &str,
        timestamp: Timestamp,
    ) -> bool {
        debug_assert!(!self.finished, "append after finish");
        if self.finished {
            return false;
        }

        let Some(statement) =
            trigger_update_sql(self.dialect, trigger, new_state, new_error, timestamp)
        else {
            return false;
        };

        self.current.push_str(&statement);
        self.current.push_str(";\n");
        self.current_statements += 1;
        self.statements += 1;

        self.state_changes.push(StateChange::for_update(trigger, new_state, new_error, timestamp));

        if self.current.len() + self.dialect.block_end().len() >= self.max_chunk_bytes {
            debug!(
                event = event_names::STORE_CHUNK_OVERFLOW,
                stage = %Stage::Batch,
                chunk_bytes = self.current.len(),
                chunk_statements = self.current_statements,
                "starting new sql chunk"
            );
            self.close_chunk();
        }

        true
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        if self.current_statements > 0 {
            self.close_chunk();
        }
        self.current.clear();
        self.finished = true;
    }

    fn statement_count(&self) -> usize {
        self.statements
    }

    fn state_changes(&self) -> &[StateChange] {
        &self.state_changes
    }
}

/// Persistent store writing trigger updates as SQL text.
#[derive(Debug)]
pub struct SqlStore<E> {
    executor: E,
    config: StoreConfig,
}

impl<E: SqlExecutor> SqlStore<E> {
    pub fn new(executor: E, config: StoreConfig) -> Self {
        SqlStore { executor, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn abort(&mut self) {
        if let Err(e) = self.executor.rollback() {
            warn!(
                event = event_names::STORE_ROLLBACK_FAILED,
                stage = %Stage::Submit,
                error = %e,
                "rollback after failed batch did not complete"
            );
        }
    }
}

impl<E: SqlExecutor> PersistentStore for SqlStore<E> {
    type Batch = SqlBatch;

    fn begin_batch(&mut self) -> SqlBatch {
        SqlBatch::new(&self.config)
    }

    fn submit(&mut self, batch: SqlBatch) -> Result<(), StoreError> {
        if !batch.is_finished() {
            return Err(StoreError::Unfinished);
        }
        if !batch.has_statements() {
            return Ok(());
        }

        self.executor.begin()?;
        let mut rows = 0u64;
        for chunk in batch.chunks() {
            match self.executor.execute(chunk) {
                Ok(affected) => rows += affected,
                Err(e) => {
                    self.abort();
                    return Err(e);
                }
            }
        }
        if let Err(e) = self.executor.commit() {
            self.abort();
            return Err(e);
        }

        debug!(
            stage = %Stage::Submit,
            chunks = batch.chunks().len(),
            statements = batch.statement_count(),
            rows,
            "sql batch committed"
        );
        Ok(())
    }
}
