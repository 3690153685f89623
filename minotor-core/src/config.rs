//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/minotor/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/minotor/` (~/.config/minotor/)
//! - Data: `$XDG_DATA_HOME/minotor/` (~/.local/share/minotor/)
//! - State/Logs: `$XDG_STATE_HOME/minotor/` (~/.local/state/minotor/)

use crate::auth::Role;
use crate::error::{Error, Result};
use crate::repository::{DEFAULT_COLLECTIONS, MAX_EVENTS_PER_READ};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Document store and event repository settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Identity service settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Database path override (defaults to [`Config::database_path`])
    pub path: Option<PathBuf>,

    /// Collection names probed in order; the first non-empty one is read
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,

    /// Maximum raw documents read per repository call
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            collections: default_collections(),
            max_events: default_max_events(),
        }
    }
}

impl StoreConfig {
    /// Resolved database path
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Config::database_path)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(Error::Config(
                "store.collections must name at least one collection".to_string(),
            ));
        }
        if self.collections.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config(
                "store.collections must not contain empty names".to_string(),
            ));
        }
        if self.max_events == 0 {
            return Err(Error::Config(
                "store.max_events must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_collections() -> Vec<String> {
    DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect()
}

fn default_max_events() -> usize {
    MAX_EVENTS_PER_READ
}

/// Identity service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Base URL of the identity API (e.g., `http://localhost:8000`)
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Roles allowed to open reports
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            allowed_roles: default_allowed_roles(),
        }
    }
}

impl AuthConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("auth.base_url must not be empty".to_string()));
        }
        if self.allowed_roles.is_empty() {
            return Err(Error::Config(
                "auth.allowed_roles must name at least one role".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_auth_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_allowed_roles() -> Vec<String> {
    vec![Role::SALES.to_string(), Role::ADMIN.to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.auth.validate()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/minotor/config.toml` (~/.config/minotor/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("minotor").join("config.toml")
    }

    /// Returns the data directory path (for the document store)
    ///
    /// `$XDG_DATA_HOME/minotor/` (~/.local/share/minotor/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("minotor")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/minotor/` (~/.local/state/minotor/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("minotor")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/minotor/data.db` (~/.local/share/minotor/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
