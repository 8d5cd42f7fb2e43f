//! Tests for service and runtime configuration
//!
//! # Test Coverage
//!
//! - YAML service config loading, partial files and defaults
//! - Unknown keys and bad serializer names are rejected
//! - CLI overrides take precedence over file values
//! - Runtime settings from an injected environment

use std::io::Write;

use pyre_router::runtime_config::{
    RuntimeConfig, ServiceConfig, ServiceOverrides, DEFAULT_ADDR, DEFAULT_MAX_BODY_BYTES,
};
use pyre_router::serializer::SerializerKind;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = yaml_file(
        "addr: 0.0.0.0:9090\ndefault_serializer: text\nhttp:\n  max_body_bytes: 2048\n",
    );
    let config = ServiceConfig::load(file.path()).unwrap();
    assert_eq!(config.addr, "0.0.0.0:9090");
    assert_eq!(config.default_serializer, SerializerKind::Text);
    assert_eq!(config.http.max_body_bytes, 2048);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let file = yaml_file("default_serializer: yaml\n");
    let config = ServiceConfig::load(file.path()).unwrap();
    assert_eq!(config.addr, DEFAULT_ADDR);
    assert_eq!(config.default_serializer, SerializerKind::Yaml);
    assert_eq!(config.http.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
}

#[test]
fn test_unknown_key_is_rejected() {
    let file = yaml_file("adress: 0.0.0.0:1\n");
    let err = ServiceConfig::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("adress"));
}

#[test]
fn test_unknown_serializer_is_rejected() {
    let file = yaml_file("default_serializer: xml\n");
    assert!(ServiceConfig::load(file.path()).is_err());
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = ServiceConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_load_or_default_without_path() {
    assert_eq!(
        ServiceConfig::load_or_default(None).unwrap(),
        ServiceConfig::default()
    );
}

#[test]
fn test_overrides_win_over_file() {
    let file = yaml_file("addr: 0.0.0.0:9090\nhttp:\n  max_body_bytes: 2048\n");
    let config = ServiceConfig::load_or_default(Some(file.path()))
        .unwrap()
        .with_overrides(&ServiceOverrides {
            addr: Some("127.0.0.1:1".to_string()),
            default_serializer: None,
            max_body_bytes: Some(10),
        });
    assert_eq!(config.addr, "127.0.0.1:1");
    assert_eq!(config.default_serializer, SerializerKind::Json);
    assert_eq!(config.http.max_body_bytes, 10);
}

#[test]
fn test_runtime_config_from_lookup() {
    let config = RuntimeConfig::from_lookup(|key| match key {
        "PYRE_STACK_SIZE" => Some("0x10000".to_string()),
        "PYRE_WORKERS" => Some("3".to_string()),
        _ => None,
    });
    assert_eq!(config.stack_size, 0x10000);
    assert_eq!(config.workers, 3);
}

#[test]
fn test_runtime_config_ignores_garbage() {
    let config = RuntimeConfig::from_lookup(|key| match key {
        "PYRE_STACK_SIZE" => Some("lots".to_string()),
        "PYRE_WORKERS" => Some("0".to_string()),
        _ => None,
    });
    let defaults = RuntimeConfig::default();
    assert_eq!(config.stack_size, defaults.stack_size);
    assert_eq!(config.workers, defaults.workers);
}
