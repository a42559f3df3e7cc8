//! Nextcheck common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the nextcheck crates:
//! - Check and trigger identity types
//! - Second-resolution timestamps
//! - Trigger state, value, and metadata enums
//! - Common error types

pub mod error;
pub mod id;
pub mod trigger;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use id::{CheckId, Timestamp, TriggerId};
pub use trigger::{TriggerPriority, TriggerState, TriggerStatus, TriggerType, TriggerValue};
