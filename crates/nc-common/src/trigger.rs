//! Trigger state, value, and metadata enums.
//!
//! The numeric representations match the values stored in the `triggers`
//! table, so they can be written into SQL text directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation state of a trigger.
///
/// `Unknown` is the administrative state assigned when a check the trigger
/// depends on could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    #[default]
    Normal,
    Unknown,
}

impl TriggerState {
    pub fn as_db(&self) -> i32 {
        match self {
            TriggerState::Normal => 0,
            TriggerState::Unknown => 1,
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerState::Normal => write!(f, "normal"),
            TriggerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Last evaluated value of a trigger expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerValue {
    #[default]
    Ok,
    Problem,
}

impl TriggerValue {
    pub fn as_db(&self) -> i32 {
        match self {
            TriggerValue::Ok => 0,
            TriggerValue::Problem => 1,
        }
    }
}

impl fmt::Display for TriggerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerValue::Ok => write!(f, "ok"),
            TriggerValue::Problem => write!(f, "problem"),
        }
    }
}

/// Severity of a trigger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPriority {
    #[default]
    NotClassified,
    Information,
    Warning,
    Average,
    High,
    Disaster,
}

impl TriggerPriority {
    pub fn as_db(&self) -> i32 {
        *self as i32
    }
}

/// Whether a problem event is generated once or on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[default]
    Single,
    Multiple,
}

/// Administrative status of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    #[default]
    Enabled,
    Disabled,
}
