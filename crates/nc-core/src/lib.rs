//! Nextcheck core library.
//!
//! Failed checks must eventually mark their dependent triggers unknown, but
//! not with one store write per failure. This crate provides:
//! - [`buffer`]: the sorted, deduplicating buffer of pending check failures
//! - [`flush`]: the pipeline turning the buffer into one batched update
//! - [`resolver`]: the check → trigger resolution seam and its in-memory index
//! - [`store`]: the batched-write contract and its SQL implementation
//! - [`logging`]: structured logging setup and event names
//! - [`config`]: loading `nextcheck.toml` and building pipeline parts from it
//!
//! Deciding *when* to flush belongs to the embedding scheduler.

pub mod buffer;
pub mod config;
pub mod flush;
pub mod logging;
pub mod resolver;
pub mod store;

// Re-export test doubles for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use buffer::{CheckFailureRecord, FailureBuffer, RecordOutcome};
pub use config::{load_config, ResolvedConfig};
pub use flush::{FlushOrchestrator, FlushReport};
pub use resolver::{DependencyIndex, TriggerRecord, TriggerResolver, TriggerUpdate};
pub use store::{PersistentStore, SqlStore, StateChange, StatementBatch, StoreError};
