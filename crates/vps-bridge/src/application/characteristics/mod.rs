//! Characteristic handlers.
//!
//! Each handler owns the ports it needs and implements the side effects of
//! one (or, for network identity, three) characteristic kinds.  Handlers
//! return external failures as [`vps_core::BridgeError`] values; deciding
//! whether a failure reaches the controller or is absorbed is the dispatch
//! engine's job.

pub mod device_status;
pub mod network_identity;
pub mod remote_control;
pub mod terminal;
pub mod wifi_connect;

use std::sync::Arc;

use super::ports::{CommandExecutor, NetworkInfoProvider, RecorderClient, TelemetryProvider};

pub use device_status::DeviceStatusSource;
pub use network_identity::NetworkIdentity;
pub use remote_control::RemoteControl;
pub use terminal::Terminal;
pub use wifi_connect::WifiConnect;

/// The ports every handler is built from.
#[derive(Clone)]
pub struct Ports {
    pub executor: Arc<dyn CommandExecutor>,
    pub network: Arc<dyn NetworkInfoProvider>,
    pub telemetry: Arc<dyn TelemetryProvider>,
    pub recorder: Arc<dyn RecorderClient>,
}

/// One handler per characteristic kind.
pub struct Handlers {
    pub wifi_connect: WifiConnect,
    pub network: NetworkIdentity,
    pub terminal: Terminal,
    pub remote_control: RemoteControl,
    pub device_status: Arc<DeviceStatusSource>,
}

impl Handlers {
    pub fn new(ports: Ports) -> Self {
        Self {
            wifi_connect: WifiConnect::new(Arc::clone(&ports.executor)),
            network: NetworkIdentity::new(ports.network),
            terminal: Terminal::new(ports.executor),
            remote_control: RemoteControl::new(ports.recorder),
            device_status: Arc::new(DeviceStatusSource::new(ports.telemetry)),
        }
    }
}
