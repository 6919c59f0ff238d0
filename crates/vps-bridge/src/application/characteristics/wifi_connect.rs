//! WifiConnect: join a Wi-Fi network with NetworkManager.

use std::sync::Arc;

use tracing::info;

use vps_core::{BridgeError, WifiCredentials};

use crate::application::ports::{CommandExecutor, CommandLine};

pub struct WifiConnect {
    executor: Arc<dyn CommandExecutor>,
}

impl WifiConnect {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Joins the network named in `payload` (`"<ssid>,<password>"`).
    ///
    /// The command runs as an argument vector, so SSIDs and passwords with
    /// spaces or shell metacharacters reach `nmcli` unchanged.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::MalformedInput`] before any command runs.
    /// - [`BridgeError::CommandFailure`] if `nmcli` fails.  The password is
    ///   not part of the reported command.
    pub async fn write(&self, payload: &[u8]) -> Result<(), BridgeError> {
        let credentials = WifiCredentials::parse(payload)?;
        info!(ssid = %credentials.ssid, "joining wifi network");

        let command = CommandLine::new("nmcli", credentials.nmcli_args());
        self.executor
            .execute(&command)
            .await
            .into_stdout(format!("nmcli device wifi connect {}", credentials.ssid))?;

        info!(ssid = %credentials.ssid, "wifi network joined");
        Ok(())
    }
}
