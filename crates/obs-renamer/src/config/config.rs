//! Configuration management for obs-renamer.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{ConnectionConfig, SupervisionConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use obs_renamer_core::{Endpoint, SupervisorConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// obs-websocket connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Liveness supervision settings.
    #[serde(default)]
    pub supervision: SupervisionConfig,
}

impl Config {
    /// Load configuration from `config_path`, creating a default file there
    /// if none exists.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!(config_path = ?config_path, "No config found, creating default");
            return Self::create_default(config_path);
        }

        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.validate()?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Reject settings the monitor cannot run with.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        let invalid = |reason: &str| AppError::ConfigError {
            reason: reason.to_string(),
            location: ErrorLocation::from(Location::caller()),
        };

        if self.connection.host.trim().is_empty() {
            return Err(invalid("connection.host must not be empty"));
        }
        if self.connection.port == 0 {
            return Err(invalid("connection.port must be between 1 and 65535"));
        }

        let supervision = &self.supervision;
        if supervision.max_reconnect_attempts == 0 {
            return Err(invalid("supervision.max_reconnect_attempts must be at least 1"));
        }
        if supervision.poll_interval_ms == 0
            || supervision.reconnect_delay_ms == 0
            || supervision.connect_timeout_ms == 0
        {
            return Err(invalid("supervision durations must be greater than zero"));
        }

        Ok(())
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                debug!(config_dir = ?config_dir, "Created config directory");
            }
        }

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Replace the connection settings. An empty password clears it.
    pub fn set_connection(&mut self, host: String, port: u16, password: Option<String>) {
        self.connection = ConnectionConfig {
            host,
            port,
            password: password.filter(|p| !p.is_empty()),
        };
    }

    /// Endpoint for the core monitor.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.connection.host.clone(),
            self.connection.port,
            self.connection.password.clone(),
        )
    }

    /// Supervision settings for the core monitor.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            poll_interval: Duration::from_millis(self.supervision.poll_interval_ms),
            reconnect_delay: Duration::from_millis(self.supervision.reconnect_delay_ms),
            max_reconnect_attempts: self.supervision.max_reconnect_attempts,
            connect_timeout: Duration::from_millis(self.supervision.connect_timeout_ms),
        }
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(project_dirs()?.data_dir().join("logs"))
    }

    /// Location of `config.toml` in the platform config directory.
    #[track_caller]
    pub fn default_path() -> AppResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let config = Config::default();

        config.save_to(config_path)?;

        warn!(
            config_path = ?config_path,
            endpoint = %config.endpoint(),
            "Default config created. Set the OBS host and password with the settings command."
        );

        Ok(config)
    }
}

#[track_caller]
fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from("com", "obs-renamer", "OBS-Renamer").ok_or_else(|| AppError::ConfigError {
        reason: "Failed to get project directories".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}
