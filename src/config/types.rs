//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_activity_log, default_admin_username, default_server_name, default_sweep_interval_secs,
};
use super::limits::LimitsConfig;
use super::listen::ListenConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
///
/// Every table is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity and administrator.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Line, queue, and mute limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Background moderation maintenance.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Activity log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    ///
    /// Any other I/O or parse error is still reported.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, attached to connection and listener logs.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Username that holds server administrator rights (exact match).
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            admin_username: default_admin_username(),
        }
    }
}

/// Moderation maintenance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Seconds between expired-mute sweeps. 0 disables the sweeper.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Activity log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Append-only activity log file. Empty disables it.
    #[serde(default = "default_activity_log")]
    pub activity_log: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log: default_activity_log(),
        }
    }
}

impl LoggingConfig {
    /// The configured activity log path, if logging to a file is enabled.
    pub fn activity_log_path(&self) -> Option<&str> {
        self.activity_log
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
