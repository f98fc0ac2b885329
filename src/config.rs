//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub polls: PollConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Unset means the transport default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

/// Local client state configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_state_file() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("streamer-hub")
                .join("state.json")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./streamer_hub_state.json".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

/// Which endpoint the public poll section reads from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollScope {
    /// `GET /votes`, every poll including ended ones
    #[default]
    All,
    /// `GET /votes/active`, unexpired polls only
    Active,
}

impl PollScope {
    pub fn path(self) -> &'static str {
        match self {
            PollScope::All => "/votes",
            PollScope::Active => "/votes/active",
        }
    }
}

impl std::str::FromStr for PollScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(PollScope::All),
            "active" => Ok(PollScope::Active),
            other => Err(format!("unknown poll scope: {}", other)),
        }
    }
}

/// Poll display configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default)]
    pub scope: PollScope,

    /// How long the "vote submitted" toast stays visible
    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,
}

fn default_toast_duration() -> u64 {
    3000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            scope: PollScope::default(),
            toast_duration_ms: default_toast_duration(),
        }
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

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
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
            dirs::config_dir().map(|p| p.join("streamer-hub").join("config.toml")),
            Some(PathBuf::from("./streamer-hub.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("STREAMER_HUB_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(secs) = std::env::var("STREAMER_HUB_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.api.request_timeout_secs = Some(s);
            }
        }

        if let Ok(path) = std::env::var("STREAMER_HUB_STATE_FILE") {
            self.storage.state_file = path;
        }

        if let Ok(scope) = std::env::var("STREAMER_HUB_POLL_SCOPE") {
            match scope.parse() {
                Ok(s) => self.polls.scope = s,
                Err(e) => tracing::warn!("Ignoring STREAMER_HUB_POLL_SCOPE: {}", e),
            }
        }

        if let Ok(level) = std::env::var("STREAMER_HUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STREAMER_HUB_LOG_FORMAT") {
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
    r#"# Streamer Hub Configuration
#
# Environment variables override these settings:
# - STREAMER_HUB_API_URL
# - STREAMER_HUB_TIMEOUT_SECS
# - STREAMER_HUB_STATE_FILE
# - STREAMER_HUB_POLL_SCOPE
# - STREAMER_HUB_LOG_LEVEL
# - STREAMER_HUB_LOG_FORMAT

[api]
# Base URL of the profile/poll/schedule REST API
base_url = "http://localhost:3000"

# Request timeout in seconds (omit to use the transport default)
# request_timeout_secs = 30

[storage]
# File holding the login token and the list of polls voted on from here
# state_file = "~/.local/share/streamer-hub/state.json"

[polls]
# Public poll listing: "all" (GET /votes) or "active" (GET /votes/active)
scope = "all"

# How long the vote confirmation stays visible (ms)
toast_duration_ms = 3000

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for machine consumption)
format = "pretty"
"#
    .to_string()
}
