//! Battery telemetry over a local IPC command.
//!
//! The battery daemon is queried with a configurable command line (by
//! default a `dbus-send --print-reply` call).  The reply is free text; the
//! value follows the `uint16` type marker:
//!
//! ```text
//! method return time=1700000000.123 sender=:1.8 -> destination=:1.42 serial=7
//!    variant       uint16 87
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use vps_core::{BatteryReading, BridgeError};

use crate::application::ports::{CommandExecutor, CommandLine, TelemetryProvider};

/// Default IPC query for the battery state of charge.
pub fn default_battery_command() -> Vec<String> {
    [
        "dbus-send",
        "--system",
        "--print-reply",
        "--dest=com.vps.Power",
        "/com/vps/Power",
        "org.freedesktop.DBus.Properties.Get",
        "string:com.vps.Power.Battery",
        "string:StateOfCharge",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// [`TelemetryProvider`] that runs an IPC command and parses its reply.
pub struct CommandTelemetry {
    executor: Arc<dyn CommandExecutor>,
    command: CommandLine,
}

impl CommandTelemetry {
    pub fn new(executor: Arc<dyn CommandExecutor>, command: CommandLine) -> Self {
        Self { executor, command }
    }
}

#[async_trait]
impl TelemetryProvider for CommandTelemetry {
    async fn read_battery_percentage(&self) -> Result<BatteryReading, BridgeError> {
        let reply = self
            .executor
            .execute(&self.command)
            .await
            .into_stdout(self.command.program.clone())
            .map_err(|e| BridgeError::TelemetryParseFailure(e.to_string()))?;
        trace!(reply = %reply.trim(), "telemetry reply");
        BatteryReading::parse_reply(&reply)
    }
}
