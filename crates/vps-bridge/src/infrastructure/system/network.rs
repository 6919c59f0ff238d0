//! Network identity from NetworkManager and the resolver.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vps_core::protocol::network::parse_active_ssid;
use vps_core::BridgeError;

use crate::application::ports::{CommandExecutor, CommandLine, NetworkInfoProvider};

/// Kernel host name, the same value `gethostname(2)` returns.
const KERNEL_HOSTNAME: &str = "/proc/sys/kernel/hostname";

/// [`NetworkInfoProvider`] backed by `nmcli` and host name resolution.
pub struct HostNetworkInfo {
    executor: Arc<dyn CommandExecutor>,
    hostname_path: PathBuf,
}

impl HostNetworkInfo {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_hostname_path(executor, KERNEL_HOSTNAME)
    }

    /// Reads the host name from `path` instead of the kernel.
    pub fn with_hostname_path(executor: Arc<dyn CommandExecutor>, path: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            hostname_path: path.into(),
        }
    }
}

#[async_trait]
impl NetworkInfoProvider for HostNetworkInfo {
    async fn active_ssid(&self) -> Result<Option<String>, BridgeError> {
        let command = CommandLine::new(
            "nmcli",
            vec!["connection".into(), "show".into(), "--active".into()],
        );
        let output = self
            .executor
            .execute(&command)
            .await
            .into_stdout(command.to_string())
            .map_err(|e| BridgeError::NetworkQueryFailure(e.to_string()))?;
        Ok(parse_active_ssid(&output))
    }

    async fn hostname(&self) -> Result<String, BridgeError> {
        let raw = tokio::fs::read_to_string(&self.hostname_path)
            .await
            .map_err(|e| {
                BridgeError::NetworkQueryFailure(format!(
                    "reading {}: {e}",
                    self.hostname_path.display()
                ))
            })?;
        let name = raw.trim();
        if name.is_empty() {
            return Err(BridgeError::NetworkQueryFailure("host name is empty".into()));
        }
        Ok(name.to_string())
    }

    async fn ip_address(&self) -> Result<IpAddr, BridgeError> {
        let hostname = self.hostname().await?;
        let addresses: Vec<IpAddr> = tokio::net::lookup_host((hostname.as_str(), 0))
            .await
            .map_err(|e| BridgeError::NetworkQueryFailure(format!("resolving {hostname}: {e}")))?
            .map(|addr| addr.ip())
            .collect();
        debug!(%hostname, ?addresses, "resolved host name");

        addresses
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addresses.first())
            .copied()
            .ok_or_else(|| BridgeError::NetworkQueryFailure(format!("{hostname} has no address")))
    }
}
