//! Tests for configuration file loading and setting resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate STASH_API_KEY or VROOM_TEST_* are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::TempDir;
use vroom_common::config::{
    read_stash_config_api_key, resolve_api_key, resolve_setting, TomlConfig, ENV_API_KEY,
};
use vroom_common::Error;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "config.toml",
        r#"
        bind = "127.0.0.1:5001"
        public_url = "http://quest.lan:5001"

        [logging]
        level = "debug"

        [catalog]
        ignored_filters = ["VR | Old"]
        "#,
    );

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.bind, "127.0.0.1:5001");
    assert_eq!(config.public_url.as_deref(), Some("http://quest.lan:5001"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.catalog.ignored_filters, vec!["VR | Old"]);
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = TomlConfig::load_or_default(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.toml", "stash_url = [unterminated");

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_resolve_setting_priority() {
    env::set_var("VROOM_TEST_SETTING", "env-value");

    assert_eq!(
        resolve_setting(Some("cli-value"), "VROOM_TEST_SETTING", Some("toml-value"), "default"),
        "cli-value"
    );
    assert_eq!(
        resolve_setting(None, "VROOM_TEST_SETTING", Some("toml-value"), "default"),
        "env-value"
    );

    env::remove_var("VROOM_TEST_SETTING");

    assert_eq!(
        resolve_setting(None, "VROOM_TEST_SETTING", Some("toml-value"), "default"),
        "toml-value"
    );
    assert_eq!(
        resolve_setting(Some("  "), "VROOM_TEST_SETTING", None, "default"),
        "default"
    );
}

#[test]
#[serial]
fn test_api_key_cli_overrides_env_and_toml() {
    env::set_var(ENV_API_KEY, "env-key");
    let config = TomlConfig {
        api_key: Some("toml-key".to_string()),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_api_key(Some("cli-key"), &config).as_deref(), Some("cli-key"));
    assert_eq!(resolve_api_key(None, &config).as_deref(), Some("env-key"));

    env::remove_var(ENV_API_KEY);
    assert_eq!(resolve_api_key(None, &config).as_deref(), Some("toml-key"));
}

#[test]
fn test_read_stash_config_api_key() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "config.yml",
        "host: 0.0.0.0\nport: 9999\napi_key: eyJhbGciOi.abc.def\njwt_secret_key: xyz\n",
    );

    let key = read_stash_config_api_key(&path).unwrap();
    assert_eq!(key.as_deref(), Some("eyJhbGciOi.abc.def"));
}

#[test]
fn test_read_stash_config_without_key() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "config.yml", "host: 0.0.0.0\napi_key: \n");

    assert_eq!(read_stash_config_api_key(&path).unwrap(), None);
}
