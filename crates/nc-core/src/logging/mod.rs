//! Structured logging for the flush pipeline.
//!
//! Provides dual-mode output on stderr:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for server deployments
//!
//! # Usage
//!
//! ```ignore
//! use nc_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! ```
//!
//! Every flush cycle runs inside a `flush` span carrying its cycle id, so
//! events from the buffer, resolver, and store correlate in JSONL output.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel, UnknownLogSetting};
pub use events::{event_names, LogContext, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// A level from `NC_LOG` or the caller wins; `RUST_LOG` directives apply
/// only when the level is the default. A subscriber already installed by the
/// host process is left in place.
pub fn init_logging(config: &LogConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(config, rust_log.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(crate_directives(config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };

    if result.is_ok() {
        tracing::debug!(
            event = event_names::LOGGING_INITIALIZED,
            stage = %Stage::Init,
            format = %config.format,
            level = %config.level,
            "logging initialized"
        );
    }
}

fn filter_directives(config: &LogConfig, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directives) if !config.level_explicit && !directives.is_empty() => {
            directives.to_string()
        }
        _ => crate_directives(config.level),
    }
}

fn crate_directives(level: LogLevel) -> String {
    format!("nc_core={level},nc_config={level}")
}

/// Generate a unique id for one flush cycle.
pub fn generate_cycle_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("cycle-{}", &uuid.simple().to_string()[..12])
}

/// Stable short id for this host, attached to every flush span.
///
/// Prefers `/etc/machine-id`, then a hash of `HOSTNAME`, then a random id.
pub fn get_host_id() -> String {
    let machine_id = std::fs::read_to_string("/etc/machine-id")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| id.len() >= 8 && id.is_ascii());
    let source = match machine_id {
        Some(id) => id,
        None => match std::env::var("HOSTNAME") {
            Ok(hostname) => hostname_digest(&hostname),
            Err(_) => uuid::Uuid::new_v4().simple().to_string(),
        },
    };
    format!("host-{}", &source[..8])
}

fn hostname_digest(hostname: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    hostname.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
