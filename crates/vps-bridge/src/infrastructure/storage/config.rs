//! TOML configuration for the bridge.
//!
//! The file lives at `/etc/vps-bridge/config.toml` unless `--config` (or
//! `VPS_CONFIG`) names another path.  Every field is optional:
//!
//! ```toml
//! log_level = "info"
//!
//! [recorder]
//! base_url = "http://0.0.0.0:8000/api/v1/liteunit"
//! request_timeout_ms = 2000
//!
//! [commands]
//! timeout_ms = 10000
//! settle_delay_ms = 300
//!
//! [telemetry]
//! command = ["dbus-send", "--system", "--print-reply", "..."]
//! timeout_ms = 1000
//!
//! [notify]
//! device_status_interval_ms = 5000
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so a missing or
//! partial file still yields a complete configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::recorder::DEFAULT_BASE_URL;
use crate::infrastructure::system::telemetry::default_battery_command;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vps-bridge/config.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    /// `tracing` filter used when `LOG_LEVEL` is unset, e.g. `"info"` or
    /// `"vps_bridge=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Recorder service endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RecorderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Local command execution.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommandsConfig {
    /// Upper bound on one command's run time.
    #[serde(default = "default_command_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause after every command.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Battery telemetry IPC.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Argument vector of the IPC query; the reply must contain `uint16 <n>`.
    #[serde(default = "default_battery_command")]
    pub command: Vec<String>,
    #[serde(default = "default_telemetry_timeout_ms")]
    pub timeout_ms: u64,
}

/// Notification schedules.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NotifyConfig {
    #[serde(default = "default_device_status_interval_ms")]
    pub device_status_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_request_timeout_ms() -> u64 {
    2_000
}
fn default_command_timeout_ms() -> u64 {
    10_000
}
fn default_settle_delay_ms() -> u64 {
    300
}
fn default_telemetry_timeout_ms() -> u64 {
    1_000
}
fn default_device_status_interval_ms() -> u64 {
    5_000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            recorder: RecorderConfig::default(),
            commands: CommandsConfig::default(),
            telemetry: TelemetryConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_command_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            command: default_battery_command(),
            timeout_ms: default_telemetry_timeout_ms(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            device_status_interval_ms: default_device_status_interval_ms(),
        }
    }
}

impl BridgeConfig {
    /// Rejects values the bridge cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty telemetry command or a
    /// zero notification interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.command.is_empty() {
            return Err(ConfigError::Invalid("telemetry.command is empty".into()));
        }
        if self.notify.device_status_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "notify.device_status_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn device_status_interval(&self) -> Duration {
        Duration::from_millis(self.notify.device_status_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.commands.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.commands.settle_delay_ms)
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry.timeout_ms)
    }

    pub fn recorder_timeout(&self) -> Duration {
        Duration::from_millis(self.recorder.request_timeout_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads and validates the config at `path`, returning defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if validation fails.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BridgeConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    config.validate()?;
    Ok(config)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
