//! Ports: the traits the dispatch engine depends on.
//!
//! Infrastructure adapters implement these against the real host (processes,
//! NetworkManager, D-Bus, HTTP, the peripheral stack); tests substitute the
//! recording fakes from `infrastructure::mock` or `mockall` mocks.
//!
//! Every port that talks to something outside the process is bounded by a
//! timeout in its adapter and reports failure as a value, never as a panic.

use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use vps_core::protocol::recorder::{MiscSettings, RecorderRequest, RecorderResponse, RecordingSettings};
use vps_core::{BatteryReading, BridgeError, ServiceDescriptor};

// ── Command execution ─────────────────────────────────────────────────────────

/// A host command as an argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Runs `line` through `sh -c`.
    pub fn shell(line: &str) -> Self {
        Self::new("sh", vec!["-c".to_string(), line.to_string()])
    }

    /// Builds a command from a configured argument vector.
    ///
    /// Returns `None` if `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of one command.
///
/// `success` is `false` for a non-zero exit, a spawn error, or a timeout; in
/// the last two cases `exit_code` is `None` and `stderr` describes the cause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that never produced an exit status.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: detail.into(),
        }
    }

    /// Returns stdout on success, otherwise a [`BridgeError::CommandFailure`]
    /// labelled with `command`.
    ///
    /// `command` is passed separately so callers can redact secrets.
    pub fn into_stdout(self, command: impl Into<String>) -> Result<String, BridgeError> {
        if self.success {
            return Ok(self.stdout);
        }
        Err(BridgeError::CommandFailure {
            command: command.into(),
            code: self.exit_code,
            detail: self.stderr.trim().to_string(),
        })
    }
}

/// Runs host commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `command` to completion (or timeout) and reports the outcome.
    async fn execute(&self, command: &CommandLine) -> CommandResult;
}

// ── Network identity ──────────────────────────────────────────────────────────

/// Reports the host's network identity.
#[async_trait]
pub trait NetworkInfoProvider: Send + Sync {
    /// SSID of the active Wi-Fi connection, `Ok(None)` when not connected.
    async fn active_ssid(&self) -> Result<Option<String>, BridgeError>;

    async fn hostname(&self) -> Result<String, BridgeError>;

    /// Address the host name resolves to, IPv4 preferred.
    async fn ip_address(&self) -> Result<IpAddr, BridgeError>;
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Reads battery telemetry over local IPC.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// # Errors
    ///
    /// [`BridgeError::TelemetryParseFailure`] when the IPC call fails or its
    /// reply carries no battery value.
    async fn read_battery_percentage(&self) -> Result<BatteryReading, BridgeError>;
}

// ── Recorder service ──────────────────────────────────────────────────────────

/// Client for the recorder service's HTTP API.
///
/// Only [`send`](RecorderClient::send) is required; the convenience methods
/// report whether the recorder accepted the request.
#[async_trait]
pub trait RecorderClient: Send + Sync {
    /// Issues one request, without retries.
    async fn send(&self, request: &RecorderRequest) -> RecorderResponse;

    async fn start(&self) -> bool {
        self.send(&RecorderRequest::StartRecording).await.accepted()
    }

    async fn stop(&self) -> bool {
        self.send(&RecorderRequest::StopRecording).await.accepted()
    }

    async fn push_recording_settings(&self, settings: RecordingSettings) -> bool {
        self.send(&RecorderRequest::RecordingSettings(settings))
            .await
            .accepted()
    }

    async fn push_misc_settings(&self, settings: MiscSettings) -> bool {
        self.send(&RecorderRequest::MiscSettings(settings))
            .await
            .accepted()
    }
}

// ── Notification delivery ─────────────────────────────────────────────────────

/// Delivers pushed values to the subscribed controller.
///
/// `notify` is called while the characteristic's state lock is held, so
/// implementations must not block or await; a channel send is the expected
/// shape.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, characteristic: Uuid, value: Vec<u8>);
}

// ── Peripheral transport ──────────────────────────────────────────────────────

/// Error type for peripheral transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("service registration failed: {0}")]
    Registration(String),
    #[error("advertising failed: {0}")]
    Advertising(String),
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The wireless peripheral stack (GATT server and advertiser).
#[async_trait]
pub trait PeripheralTransport: Send + Sync {
    /// Publishes the service table.
    async fn register(&self, service: &ServiceDescriptor) -> Result<(), TransportError>;

    /// Starts advertising under `local_name`.
    async fn advertise(&self, local_name: &str) -> Result<(), TransportError>;
}
