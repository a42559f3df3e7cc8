//! Nextcheck configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `nextcheck.toml`
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation

pub mod flush;
pub mod resolve;
pub mod validate;

pub use flush::{BufferConfig, FlushConfig, ResolverConfig, SqlDialect, StoreConfig};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use validate::{validate_flush_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
