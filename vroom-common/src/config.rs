//! Bootstrap configuration loading and resolution
//!
//! Settings are resolved once at startup with the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! A missing config file is not fatal: the service logs a warning and starts
//! with defaults. An explicitly requested file that is missing or malformed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default Stash GraphQL endpoint
pub const DEFAULT_STASH_URL: &str = "http://127.0.0.1:9999/graphql";

/// Default listen address for the service boundary
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Environment variable holding the Stash API key
pub const ENV_API_KEY: &str = "STASH_API_KEY";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes to the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Stash GraphQL endpoint URL
    #[serde(default = "default_stash_url")]
    pub stash_url: String,

    /// Stash API key (sent as the `ApiKey` header)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Session cookie as `Name=Value`, used when no API key is configured
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Listen address for the HTTP boundary
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Public base URL used to build absolute item URLs (optional)
    ///
    /// When absent the request `Host` header is used.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Saved-filter catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Synchronization pass settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Filename classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Saved-filter catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Name prefixes marking a saved filter as an active view, e.g. `VR | Favorites`
    #[serde(default = "default_active_prefixes")]
    pub active_prefixes: Vec<String>,

    /// Filter names skipped even when they carry an active prefix
    #[serde(default)]
    pub ignored_filters: Vec<String>,

    /// Filter modes loaded from upstream, in load order
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,

    /// Explicit ordered id lists keyed by view key (e.g. `"s:42"`)
    ///
    /// A view with an override is always fetched by id instead of by criteria.
    #[serde(default)]
    pub id_overrides: BTreeMap<String, Vec<String>>,
}

/// Synchronization pass configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Run a pass every N seconds (disabled when absent)
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Upstream HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Filename classifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Video file extensions stripped before matching (without dots)
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

fn default_stash_url() -> String {
    DEFAULT_STASH_URL.to_string()
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_active_prefixes() -> Vec<String> {
    vec!["VR".to_string(), "HereSphere".to_string()]
}

fn default_modes() -> Vec<String> {
    vec!["SCENES".to_string(), "IMAGES".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "m4v", "mkv", "avi", "webm", "wmv", "mov"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            stash_url: default_stash_url(),
            api_key: None,
            session_cookie: None,
            bind: default_bind(),
            public_url: None,
            logging: LoggingConfig::default(),
            catalog: CatalogConfig::default(),
            sync: SyncConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            active_prefixes: default_active_prefixes(),
            ignored_filters: Vec::new(),
            modes: default_modes(),
            id_overrides: BTreeMap::new(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            video_extensions: default_video_extensions(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded TOML config");
        Ok(config)
    }

    /// Load the explicit file if given, else the default location, else defaults
    ///
    /// An explicit path must exist. A missing default file only produces a warning.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Default configuration file path for the platform
///
/// `<config_dir>/vroom/config.toml`, e.g. `~/.config/vroom/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vroom").join("config.toml"))
}

/// Resolve a string setting: CLI → ENV → TOML → default
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
    default: &str,
) -> String {
    if let Some(value) = cli_arg.filter(|v| is_valid_value(v)) {
        return value.to_string();
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if is_valid_value(&value) {
            return value;
        }
    }

    if let Some(value) = toml_value.filter(|v| is_valid_value(v)) {
        return value.to_string();
    }

    default.to_string()
}

/// Resolve the Stash API key
///
/// **Priority:** CLI → `STASH_API_KEY` → TOML → `~/.stash/config.yml`
///
/// Returns `None` when no source has a key; an unauthenticated Stash is valid.
pub fn resolve_api_key(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Option<String> {
    if let Some(key) = cli_arg.filter(|k| is_valid_value(k)) {
        info!("Stash API key loaded from command line");
        return Some(key.to_string());
    }

    if let Ok(key) = std::env::var(ENV_API_KEY) {
        if is_valid_value(&key) {
            if toml_config.api_key.is_some() {
                warn!("Stash API key found in environment and TOML. Using environment.");
            }
            info!("Stash API key loaded from environment variable");
            return Some(key);
        }
    }

    if let Some(key) = toml_config.api_key.as_deref().filter(|k| is_valid_value(k)) {
        info!("Stash API key loaded from TOML config");
        return Some(key.to_string());
    }

    let stash_config = dirs::home_dir()?.join(".stash").join("config.yml");
    match read_stash_config_api_key(&stash_config) {
        Ok(Some(key)) => {
            info!(path = %stash_config.display(), "Stash API key loaded from Stash config");
            Some(key)
        }
        Ok(None) => None,
        Err(e) => {
            debug!("No Stash config API key: {}", e);
            None
        }
    }
}

/// Read the `api_key:` line from a Stash `config.yml`
///
/// Only the one line is needed, so the file is scanned rather than parsed as YAML.
pub fn read_stash_config_api_key(path: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path)?;

    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("api_key:") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if is_valid_value(value) {
                return Ok(Some(value.to_string()));
            }
        }
    }

    Ok(None)
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
