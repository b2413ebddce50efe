//! Config loading tests: file discovery, parse errors, defaults,
//! validation of the shared section.

use rill_common::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct DiagConfig {
    shared: SharedConfig,
    #[serde(default)]
    scenario: Option<String>,
}

/// Write a config file into the given directory and return its path.
fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("rill.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
scenario = "callback"

[shared]
log_level = "debug"
service_name = "rill-diag-01"
"#,
    );

    let config = DiagConfig::load(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "rill-diag-01");
    assert_eq!(config.scenario.as_deref(), Some("callback"));
    assert!(config.shared.validate().is_ok());
}

#[test]
fn log_level_defaults_to_info_when_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[shared]
service_name = "rill-diag"
"#,
    );

    let config = DiagConfig::load(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Info);
}

#[test]
fn missing_file_is_file_not_found() {
    let dir = TempDir::new().unwrap();
    let err = DiagConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound));
}

#[test]
fn invalid_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "[shared\nservice_name = ");
    let err = DiagConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn missing_required_field_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "[shared]\nlog_level = \"warn\"\n");
    let err = DiagConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn empty_service_name_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "[shared]\nservice_name = \"\"\n");
    let config = DiagConfig::load(&path).unwrap();
    assert!(matches!(
        config.shared.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
