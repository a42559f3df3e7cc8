//! The unified nextcheck error.
//!
//! Every variant has a stable numeric code, a category, and a hint telling
//! the scheduler whether the next flush cycle can be expected to succeed.
//! [`StructuredError`] renders one for JSONL logs:
//! ```json
//! {
//!   "code": 20,
//!   "category": "store",
//!   "message": "batch submission failed (3 statements): connection reset",
//!   "recoverable": true,
//!   "suggested_action": "retry",
//!   "context": { "statements": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::id::TriggerId;

/// Result type alias for nextcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse grouping of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Persistent store and batch submission errors.
    Store,
    /// Trigger resolution errors.
    Resolver,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Store => "store",
            ErrorCategory::Resolver => "resolver",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the scheduler should do after a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Carry on; the next flush cycle tries again.
    Retry,
    /// Validate `nextcheck.toml` before restarting.
    RunCheck,
    /// Drop the rejected setting and use the default.
    ResetConfig,
    /// Ignore the item.
    Skip,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SuggestedAction::Retry => "retry",
            SuggestedAction::RunCheck => "run_check",
            SuggestedAction::ResetConfig => "reset_config",
            SuggestedAction::Skip => "skip",
        })
    }
}

/// Unified error type for nextcheck.
#[derive(Error, Debug)]
pub enum Error {
    // 10-19
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid flush configuration: {0}")]
    InvalidConfig(String),

    // 20-29
    #[error("batch submission failed ({statements} statements): {reason}")]
    SubmitFailed { statements: usize, reason: String },

    // 30-39
    #[error("trigger {trigger_id} not found")]
    TriggerNotFound { trigger_id: TriggerId },
}

impl Error {
    /// Stable code: 10-19 config, 20-29 store, 30-39 resolver.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::SubmitFailed { .. } => 20,
            Error::TriggerNotFound { .. } => 30,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::SubmitFailed { .. } => ErrorCategory::Store,
            Error::TriggerNotFound { .. } => ErrorCategory::Resolver,
        }
    }

    /// Whether a later cycle can succeed without operator action.
    ///
    /// A lost batch is not replayed, but the next real failure of the same
    /// checks records them again, so store errors count as recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::TriggerNotFound { .. })
    }

    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidConfig(_) => SuggestedAction::ResetConfig,
            Error::SubmitFailed { .. } => SuggestedAction::Retry,
            Error::TriggerNotFound { .. } => SuggestedAction::Skip,
        }
    }

    /// One-line operator hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check syntax in nextcheck.toml and rerun validation.",
            Error::InvalidConfig(_) => {
                "Fix the rejected field or remove it to fall back to the built-in default."
            }
            Error::SubmitFailed { .. } => {
                "The batch was dropped. Triggers are updated again on the next failure of the same checks."
            }
            Error::TriggerNotFound { .. } => {
                "The trigger was removed from the configuration cache. Reload the cache."
            }
        }
    }
}

/// [`Error`] flattened for a JSONL log field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,
    /// Variant fields plus anything the caller attached.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let context: HashMap<String, serde_json::Value> = match err {
            Error::SubmitFailed { statements, .. } => {
                HashMap::from([("statements".to_string(), serde_json::json!(statements))])
            }
            Error::TriggerNotFound { trigger_id } => {
                HashMap::from([("trigger_id".to_string(), serde_json::json!(trigger_id))])
            }
            _ => HashMap::new(),
        };

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Attach a context entry. Values that fail to serialize are dropped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
