//! Configuration types for sessiondeck.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Directory name used under the platform cache dir.
const APP_DIR_NAME: &str = "sessiondeck";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Filesystem locations
    pub paths: PathSettings,
    /// Session monitor settings
    pub monitor: MonitorSettings,
    /// Terminal launcher settings
    pub launcher: LauncherSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.poll_interval_ms == 0 {
            return Err(Error::Config(
                "monitor.poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.launcher.pid_timeout_ms == 0 {
            return Err(Error::Config(
                "launcher.pid_timeout_ms must be > 0".to_string(),
            ));
        }

        if let Some(terminal) = &self.launcher.terminal {
            if terminal.trim().is_empty() {
                return Err(Error::Config(
                    "launcher.terminal cannot be empty when set".to_string(),
                ));
            }
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Root directory for all persisted state.
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(default_data_dir)
    }

    /// Directory holding one record per tracked session.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir().join("sessions")
    }

    /// Directory holding launch scripts and PID marker files.
    pub fn run_dir(&self) -> PathBuf {
        self.data_dir().join("run")
    }
}

/// Default data directory: `<cache dir>/sessiondeck`, or the temp dir when
/// the platform reports no cache dir.
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathSettings {
    /// Override for the data directory
    pub data_dir: Option<PathBuf>,
}

/// Session monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Delay between liveness checks for a running session
    pub poll_interval_ms: u64,
}

impl MonitorSettings {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

/// Terminal launcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// How long to wait for a launched process to write its pid
    pub pid_timeout_ms: u64,
    /// Preferred terminal emulator name (auto-detect when unset)
    pub terminal: Option<String>,
}

impl LauncherSettings {
    /// PID marker timeout as a [`Duration`].
    pub fn pid_timeout(&self) -> Duration {
        Duration::from_millis(self.pid_timeout_ms)
    }
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            pid_timeout_ms: 10_000,
            terminal: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
