//! CurrentSSID, IP, and LocalName: read-only network identity.

use std::sync::Arc;

use vps_core::protocol::network::NOT_CONNECTED;
use vps_core::BridgeError;

use crate::application::ports::NetworkInfoProvider;

pub struct NetworkIdentity {
    network: Arc<dyn NetworkInfoProvider>,
}

impl NetworkIdentity {
    pub fn new(network: Arc<dyn NetworkInfoProvider>) -> Self {
        Self { network }
    }

    /// The active SSID, or `"Not connected"`.
    ///
    /// Not being connected is a valid answer, not an error.  A failing query
    /// is returned as an error so the engine can record it before falling
    /// back to [`NOT_CONNECTED`].
    pub async fn current_ssid(&self) -> Result<String, BridgeError> {
        Ok(self
            .network
            .active_ssid()
            .await?
            .unwrap_or_else(|| NOT_CONNECTED.to_string()))
    }

    pub async fn ip(&self) -> Result<String, BridgeError> {
        Ok(self.network.ip_address().await?.to_string())
    }

    pub async fn local_name(&self) -> Result<String, BridgeError> {
        self.network.hostname().await
    }
}
