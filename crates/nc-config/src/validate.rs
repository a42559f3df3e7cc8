//! Rejecting flush settings the pipeline cannot run with.

use thiserror::Error;

use crate::flush::FlushConfig;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Why a `nextcheck.toml` was refused.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("cannot read config: {0}")]
    IoError(String),

    #[error("malformed config: {0}")]
    ParseError(String),

    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("schema_version {actual} is not supported (expected {expected})")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Code in the configuration range (10-19) shared with `nc_common::Error`.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 12,
            ValidationError::ParseError(_) => 13,
            ValidationError::InvalidValue { .. } => 14,
            ValidationError::VersionMismatch { .. } => 15,
        }
    }
}

/// Validate the flush configuration semantically.
pub fn validate_flush_config(config: &FlushConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    require_positive("buffer.growth_step", config.buffer.growth_step)?;
    require_positive("resolver.error_max_len", config.resolver.error_max_len)?;
    require_positive("store.max_chunk_bytes", config.store.max_chunk_bytes)?;

    // A chunk must fit its own framing plus at least one byte of statement.
    let framing = config.store.dialect.framing_len();
    if config.store.max_chunk_bytes <= framing {
        return Err(ValidationError::InvalidValue {
            field: "store.max_chunk_bytes".to_string(),
            message: format!(
                "must exceed the {} dialect framing of {} bytes, got {}",
                config.store.dialect, framing, config.store.max_chunk_bytes
            ),
        });
    }

    Ok(())
}

fn require_positive(field: &str, value: usize) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must be positive, got 0".to_string(),
        });
    }
    Ok(())
}
