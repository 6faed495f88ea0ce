//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::MAX_FEED_ROWS;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted table backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project base URL (e.g., "http://localhost:54321")
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Path of the table API below `url`
    #[serde(default = "default_rest_path")]
    pub rest_path: String,

    /// Public API key; sent as `apikey` and bearer token when non-empty
    #[serde(default)]
    pub api_key: String,

    /// Request timeout; unset means the transport default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_rest_path() -> String {
    "/rest/v1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            rest_path: default_rest_path(),
            api_key: String::new(),
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    /// Base URL of the table API, without a trailing slash
    pub fn rest_base(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.rest_path.trim_matches('/')
        )
        .trim_end_matches('/')
        .to_string()
    }
}

/// Activity feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Rows requested per feed read (never more than 150)
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

fn default_feed_limit() -> usize {
    MAX_FEED_ROWS
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
        }
    }
}

impl FeedConfig {
    /// The configured limit, clamped to the feed's hard cap
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_FEED_ROWS)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("runhunt").join("config.toml")),
            Some(PathBuf::from("/etc/runhunt/config.toml")),
            Some(PathBuf::from("./runhunt.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RUNHUNT_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Ok(key) = std::env::var("RUNHUNT_API_KEY") {
            self.backend.api_key = key;
        }

        if let Ok(limit) = std::env::var("RUNHUNT_FEED_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.feed.limit = n;
            }
        }

        if let Ok(level) = std::env::var("RUNHUNT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RUNHUNT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# RunHNT Configuration
#
# Environment variables override these settings:
# - RUNHUNT_BACKEND_URL
# - RUNHUNT_API_KEY
# - RUNHUNT_FEED_LIMIT
# - RUNHUNT_LOG_LEVEL
# - RUNHUNT_LOG_FORMAT

[backend]
# Project base URL of the hosted database
url = "http://localhost:54321"

# Path of the table API below the base URL
rest_path = "/rest/v1"

# Public (anon) API key
api_key = ""

# Request timeout in seconds (unset: transport default)
# request_timeout_secs = 30

[feed]
# Rows per feed read, at most 150
limit = 150

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
