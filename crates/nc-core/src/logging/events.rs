//! Structured event names and pipeline stages.
//!
//! Every flush event carries an `event` name from [`event_names`], a
//! [`Stage`], and the flush cycle id from its enclosing span.

use serde::{Deserialize, Serialize};

/// Stages of the flush pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Buffering a check failure.
    Record,
    /// Draining the failure buffer.
    Drain,
    /// Mapping checks to affected triggers.
    Resolve,
    /// Building the statement batch.
    Batch,
    /// Submitting the batch to the store.
    Submit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Record => "record",
            Stage::Drain => "drain",
            Stage::Resolve => "resolve",
            Stage::Batch => "batch",
            Stage::Submit => "submit",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Init
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const LOGGING_INITIALIZED: &str = "logging.initialized";

    // Buffer
    pub const RECORD_INSERTED: &str = "record.inserted";
    pub const RECORD_REPLACED: &str = "record.replaced";

    // Flush cycle
    pub const FLUSH_STARTED: &str = "flush.started";
    pub const FLUSH_DRAINED: &str = "flush.drained";
    pub const FLUSH_RESOLVED: &str = "flush.resolved";
    pub const FLUSH_STATEMENT_SKIPPED: &str = "flush.statement_skipped";
    pub const FLUSH_SUBMITTED: &str = "flush.submitted";
    pub const FLUSH_SUBMIT_FAILED: &str = "flush.submit_failed";
    pub const FLUSH_FINISHED: &str = "flush.finished";

    // Store
    pub const STORE_CHUNK_OVERFLOW: &str = "store.chunk_overflow";
    pub const STORE_ROLLBACK_FAILED: &str = "store.rollback_failed";
}

/// Correlation ids attached to one flush cycle.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique id of the flush cycle.
    pub cycle_id: String,
    /// Host identifier.
    pub host_id: String,
}

impl LogContext {
    pub fn new(cycle_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            cycle_id: cycle_id.into(),
            host_id: host_id.into(),
        }
    }

    /// Span that scopes every event of the cycle.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("flush", cycle_id = %self.cycle_id, host_id = %self.host_id)
    }
}
