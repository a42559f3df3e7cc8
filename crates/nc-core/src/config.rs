//! Flush configuration for an embedding server.
//!
//! Wraps `nc_config` loading, converts its validation errors into the
//! unified [`nc_common::Error`], and builds the pipeline parts a config
//! describes.

use std::path::{Path, PathBuf};

use nc_common::{Error, Result};
use nc_config::{resolve_config, ConfigPath, ConfigSource, FlushConfig, ValidationError};
use tracing::info;

use crate::buffer::FailureBuffer;
use crate::logging::{event_names, Stage};
use crate::resolver::DependencyIndex;
use crate::store::{SqlExecutor, SqlStore};

/// Loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub flush: FlushConfig,
    /// File the configuration was read from, `None` for built-in defaults.
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

impl ResolvedConfig {
    /// Built-in defaults, no file involved.
    pub fn defaults() -> Self {
        ResolvedConfig {
            flush: FlushConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
        }
    }

    pub fn failure_buffer(&self) -> FailureBuffer {
        FailureBuffer::from_config(&self.flush.buffer)
    }

    pub fn dependency_index(&self) -> DependencyIndex {
        DependencyIndex::new(self.flush.resolver.clone())
    }

    pub fn sql_store<E: SqlExecutor>(&self, executor: E) -> SqlStore<E> {
        SqlStore::new(executor, self.flush.store.clone())
    }
}

/// Resolve, parse, and validate `nextcheck.toml`.
///
/// See [`nc_config::resolve_config`] for the search order. A missing file is
/// not an error; a present but invalid one is.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig> {
    let ConfigPath { path, source } = resolve_config(cli_path);
    let flush = match &path {
        Some(file) => FlushConfig::from_file(file).map_err(config_error)?,
        None => FlushConfig::default(),
    };

    info!(
        event = event_names::CONFIG_LOADED,
        stage = %Stage::Init,
        source = %source,
        path = ?path,
        dialect = %flush.store.dialect,
        "flush configuration loaded"
    );

    Ok(ResolvedConfig { flush, path, source })
}

fn config_error(err: ValidationError) -> Error {
    match err {
        ValidationError::IoError(_) | ValidationError::ParseError(_) => {
            Error::Config(err.to_string())
        }
        ValidationError::InvalidValue { .. } | ValidationError::VersionMismatch { .. } => {
            Error::InvalidConfig(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingExecutor;
    use nc_config::SqlDialect;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nextcheck.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_explicit_file() {
        let (_dir, path) = write_config(
            r#"
            [buffer]
            growth_step = 16

            [store]
            dialect = "oracle"
            max_chunk_bytes = 1024
            "#,
        );

        let resolved = load_config(Some(&path)).unwrap();
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(path.as_path()));
        assert_eq!(resolved.flush.store.dialect, SqlDialect::Oracle);

        assert!(resolved.failure_buffer().is_empty());
        let store = resolved.sql_store(RecordingExecutor::new());
        assert_eq!(store.config().max_chunk_bytes, 1024);
    }

    #[test]
    fn test_invalid_value_maps_to_invalid_config() {
        let (_dir, path) = write_config("[buffer]\ngrowth_step = 0\n");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(err.code(), 11);
        assert!(err.to_string().contains("buffer.growth_step"));
    }

    #[test]
    fn test_malformed_toml_maps_to_config() {
        let (_dir, path) = write_config("[buffer\n");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn test_defaults_build_pipeline_parts() {
        let resolved = ResolvedConfig::defaults();
        assert!(resolved.path.is_none());
        assert!(resolved.dependency_index().is_empty());
        assert_eq!(resolved.failure_buffer().capacity(), 0);
    }
}
