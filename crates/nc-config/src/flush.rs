//! Typed configuration for the failure buffer and flush pipeline.
//!
//! Every section is optional in `nextcheck.toml`; omitted fields take the
//! built-in defaults below.
//!
//! ```toml
//! schema_version = "1.0.0"
//!
//! [buffer]
//! growth_step = 64
//!
//! [resolver]
//! min_index_capacity = 100
//! error_max_len = 128
//!
//! [store]
//! dialect = "oracle"
//! max_chunk_bytes = 65536
//! initial_capacity = 4096
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::validate::{validate_flush_config, ValidationError, ValidationResult};

/// Root configuration for the flush pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Schema version of the file.
    pub schema_version: String,
    /// Failure buffer settings.
    pub buffer: BufferConfig,
    /// Trigger resolver settings.
    pub resolver: ResolverConfig,
    /// Batched store settings.
    pub store: StoreConfig,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            buffer: BufferConfig::default(),
            resolver: ResolverConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Failure buffer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Number of records the buffer grows by when it runs out of room.
    pub growth_step: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { growth_step: 64 }
    }
}

/// Trigger resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Lower bound for the per-flush dedupe set capacity.
    pub min_index_capacity: usize,
    /// Maximum characters kept from a check error in a trigger annotation.
    pub error_max_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_index_capacity: 100,
            error_max_len: 128,
        }
    }
}

/// SQL dialect of the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Statements separated by `;\n`, no block framing.
    #[default]
    Generic,
    /// Like `Generic`, but backslash is an escape character in literals.
    #[serde(alias = "mariadb")]
    MySql,
    /// Every chunk wrapped in an anonymous `begin ... end;` block.
    Oracle,
}

impl SqlDialect {
    /// Text opening a multi-statement chunk.
    pub fn block_begin(&self) -> &'static str {
        match self {
            SqlDialect::Generic | SqlDialect::MySql => "",
            SqlDialect::Oracle => "begin\n",
        }
    }

    /// Text closing a multi-statement chunk.
    pub fn block_end(&self) -> &'static str {
        match self {
            SqlDialect::Generic | SqlDialect::MySql => "",
            SqlDialect::Oracle => "end;",
        }
    }

    /// Bytes of framing every chunk carries.
    pub fn framing_len(&self) -> usize {
        self.block_begin().len() + self.block_end().len()
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "postgresql" | "sqlite" => Ok(SqlDialect::Generic),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "oracle" => Ok(SqlDialect::Oracle),
            _ => Err(format!("unknown sql dialect: {}", s)),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::Generic => write!(f, "generic"),
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Oracle => write!(f, "oracle"),
        }
    }
}

/// Batched store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Statement framing dialect.
    pub dialect: SqlDialect,
    /// Chunk size at which the batch starts a new chunk.
    pub max_chunk_bytes: usize,
    /// Initial capacity of the SQL text buffer.
    pub initial_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::Generic,
            max_chunk_bytes: 64 * 1024,
            initial_capacity: 4 * 1024,
        }
    }
}

impl FlushConfig {
    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        let config: FlushConfig =
            toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))?;
        validate_flush_config(&config)?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlushConfig::default();
        assert_eq!(config.buffer.growth_step, 64);
        assert_eq!(config.resolver.min_index_capacity, 100);
        assert_eq!(config.resolver.error_max_len, 128);
        assert_eq!(config.store.dialect, SqlDialect::Generic);
        assert!(validate_flush_config(&config).is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FlushConfig::from_toml_str(
            r#"
            [store]
            dialect = "oracle"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.dialect, SqlDialect::Oracle);
        assert_eq!(config.store.max_chunk_bytes, 64 * 1024);
        assert_eq!(config.buffer.growth_step, 64);
    }

    #[test]
    fn test_unknown_dialect_is_parse_error() {
        let err = FlushConfig::from_toml_str("[store]\ndialect = \"db2\"\n").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_dialect_framing() {
        assert_eq!(SqlDialect::Generic.framing_len(), 0);
        assert_eq!(SqlDialect::Oracle.block_begin(), "begin\n");
        assert_eq!(SqlDialect::Oracle.block_end(), "end;");
        assert_eq!(SqlDialect::MySql.framing_len(), 0);
        assert_eq!("ORACLE".parse::<SqlDialect>().unwrap(), SqlDialect::Oracle);
        assert_eq!("mariadb".parse::<SqlDialect>().unwrap(), SqlDialect::MySql);
        assert!("db2".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = FlushConfig::from_file(Path::new("/nonexistent/nextcheck.toml")).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }
}
