//! File-backed configuration loading tests.

use nc_config::{resolve_config, ConfigSource, FlushConfig, SqlDialect, ValidationError};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("nextcheck.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn loads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
schema_version = "1.0.0"

[buffer]
growth_step = 16

[resolver]
error_max_len = 255

[store]
dialect = "oracle"
max_chunk_bytes = 8192
"#,
    );

    let resolved = resolve_config(Some(&path));
    assert_eq!(resolved.source, ConfigSource::CliArgument);
    assert_eq!(resolved.path.as_deref(), Some(path.as_path()));

    let config = FlushConfig::from_file(&path).unwrap();
    assert_eq!(config.buffer.growth_step, 16);
    assert_eq!(config.resolver.error_max_len, 255);
    assert_eq!(config.resolver.min_index_capacity, 100);
    assert_eq!(config.store.dialect, SqlDialect::Oracle);
    assert_eq!(config.store.max_chunk_bytes, 8192);
}

#[test]
fn empty_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = FlushConfig::from_file(&path).unwrap();
    assert_eq!(config, FlushConfig::default());
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[store]\nmax_chunk_bytes = 0\n");

    match FlushConfig::from_file(&path) {
        Err(ValidationError::InvalidValue { field, .. }) => {
            assert_eq!(field, "store.max_chunk_bytes")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn malformed_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[buffer\ngrowth_step = ");

    let err = FlushConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ValidationError::ParseError(_)));
    assert_eq!(err.code(), 13);
}

#[test]
fn mysql_dialect_parses() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[store]\ndialect = \"mysql\"\n");

    let config = FlushConfig::from_file(&path).unwrap();
    assert_eq!(config.store.dialect, SqlDialect::MySql);
}
