//! Service configuration.
//!
//! Loaded from a TOML file; every field has a default, so a partial file (or
//! none at all) is valid. Environment variables override file values:
//!
//! - `BIOSCAN_DATABASE_PATH`: `database.path`
//! - `BIOSCAN_LOG_LEVEL`: `logging.level`
//! - `BIOSCAN_LOCK_TIMEOUT_MS`: `device.lock_timeout_ms`
//!
//! ```toml
//! [device]
//! lock_timeout_ms = 30000
//! simulated_latency_ms = 0
//!
//! [database]
//! path = "bioscan.db"
//! max_connections = 10
//! auto_migrate = true
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use bioscan_core::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_CONNECTIONS,
};
use bioscan_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const VALID_LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub device: DeviceSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// How long an operation waits for the device lock. Zero waits forever.
    pub lock_timeout_ms: u64,

    /// Latency of each simulated finger read.
    pub simulated_latency_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            simulated_latency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
    pub max_connections: u32,
    pub auto_migrate: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Defaults with environment overrides, for running without a file.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content without overrides or validation.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source. Environment lookups go
    /// through here.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BIOSCAN_DATABASE_PATH") {
            self.database.path = path;
        }

        if let Some(level) = lookup("BIOSCAN_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(timeout) = lookup("BIOSCAN_LOCK_TIMEOUT_MS") {
            self.device.lock_timeout_ms = timeout.trim().parse().map_err(|_| {
                anyhow::anyhow!("Invalid BIOSCAN_LOCK_TIMEOUT_MS value: {}", timeout)
            })?;
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("Database path cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("Database max_connections cannot be 0"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                VALID_LOG_FORMATS.join(", ")
            ));
        }

        Ok(())
    }

    /// Device lock timeout, `None` when configured to wait forever.
    pub fn lock_timeout(&self) -> Option<Duration> {
        match self.device.lock_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.device.simulated_latency_ms)
    }

    /// Store connection settings.
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .auto_migrate(self.database.auto_migrate)
    }
}
