//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SolarLogError};
use crate::telemetry::is_daily_log_name;

/// Accepted values for `logging.level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Daily log storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// Operational logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// File name (inside `storage.log_dir`) used in background mode
    #[serde(default = "default_server_log")]
    pub server_log: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 4545 }

fn default_log_dir() -> String { "solar_logs".to_string() }

fn default_level() -> String { "info".to_string() }
fn default_server_log() -> String { "server.log".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { log_dir: default_log_dir() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), server_log: default_server_log() }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use solar_log::config::Config;
    ///
    /// let config = Config::load("config/server.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding the daily log files
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.log_dir)
    }

    /// Validate configuration values
    ///
    /// Called by [`Config::load`]; callers that patch values afterwards (CLI
    /// overrides) should call it again.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(invalid("server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(invalid("server port must be between 1 and 65535"));
        }

        if self.storage.log_dir.trim().is_empty() {
            return Err(invalid("storage log_dir cannot be empty"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        let server_log = self.logging.server_log.as_str();
        if server_log.is_empty() || server_log.contains('/') || server_log.contains('\\') {
            return Err(invalid("logging server_log must be a plain file name"));
        }

        // The catalog would otherwise list the operational log as a day file
        if is_daily_log_name(server_log) {
            return Err(invalid("logging server_log must not match solar_log_*.txt"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> SolarLogError {
    SolarLogError::Config(toml::de::Error::custom(msg))
}
