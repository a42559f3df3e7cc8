//! Logging configuration.
//!
//! Supports configuration via environment variables (`NC_LOG`,
//! `NC_LOG_FORMAT`) with explicit overrides from the embedding server.
//! `RUST_LOG` is consulted only when neither sets a level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

/// An `NC_LOG` / `NC_LOG_FORMAT` value that names no known setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised {kind} {value:?}")]
pub struct UnknownLogSetting {
    kind: &'static str,
    value: String,
}

/// Where flush events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact text on stderr.
    #[default]
    Human,
    /// One JSON object per event, span fields included.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = UnknownLogSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(UnknownLogSetting {
                kind: "log format",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity floor. `Debug` shows per-cycle counters, `Trace` per-record
/// buffer activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl FromStr for LogLevel {
    type Err = UnknownLogSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "warning" {
            return Ok(LogLevel::Warn);
        }
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| UnknownLogSetting {
                kind: "log level",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Subscriber settings for a process embedding the flush pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// `level` came from `NC_LOG` or the caller rather than the default, so
    /// it takes precedence over `RUST_LOG`.
    pub level_explicit: bool,
    /// Prefix human output with wall-clock time. JSONL always carries it.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::default(),
            level: LogLevel::default(),
            level_explicit: false,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Read `NC_LOG` and `NC_LOG_FORMAT`, then apply the caller's overrides.
    ///
    /// Unparseable environment values are ignored.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        let env_level = std::env::var("NC_LOG").ok();
        let env_format = std::env::var("NC_LOG_FORMAT").ok();
        Self::from_values(env_level.as_deref(), env_format.as_deref(), level, format)
    }

    pub(crate) fn from_values(
        env_level: Option<&str>,
        env_format: Option<&str>,
        level: Option<LogLevel>,
        format: Option<LogFormat>,
    ) -> Self {
        let defaults = LogConfig::default();
        let level = level.or_else(|| env_level.and_then(|v| v.parse().ok()));
        LogConfig {
            level: level.unwrap_or(defaults.level),
            level_explicit: level.is_some(),
            format: format
                .or_else(|| env_format.and_then(|v| v.parse().ok()))
                .unwrap_or(defaults.format),
            ..defaults
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self.level_explicit = true;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unrecognised log format \"xml\"");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" OFF ".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_env_values_then_overrides() {
        let config = LogConfig::from_values(Some("debug"), Some("jsonl"), None, None);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Jsonl);

        let config =
            LogConfig::from_values(Some("debug"), Some("jsonl"), Some(LogLevel::Error), None);
        assert_eq!(config.level, LogLevel::Error);

        let config = LogConfig::from_values(Some("garbage"), None, None, None);
        assert_eq!(config.level, LogLevel::Info);
        assert!(!config.level_explicit);

        let config = LogConfig::from_values(Some("warn"), None, None, None);
        assert!(config.level_explicit);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::default()
            .with_format(LogFormat::Jsonl)
            .with_level(LogLevel::Debug)
            .with_timestamps(false);

        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.level_explicit);
        assert!(!config.timestamps);
    }
}
