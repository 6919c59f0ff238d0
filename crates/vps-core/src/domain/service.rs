//! The VPS GATT service descriptor.

use uuid::Uuid;

use super::characteristic::{CharacteristicKind, SERVICE_UUID};

/// An ordered collection of characteristics exposed under one service UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<CharacteristicKind>,
}

impl ServiceDescriptor {
    /// The primary VPS service with every characteristic in registration order.
    pub fn vps() -> Self {
        Self {
            uuid: SERVICE_UUID,
            primary: true,
            characteristics: CharacteristicKind::ALL.to_vec(),
        }
    }

    /// Returns the kind registered under `uuid`, if it belongs to this service.
    pub fn find(&self, uuid: Uuid) -> Option<CharacteristicKind> {
        self.characteristics.iter().copied().find(|k| k.uuid() == uuid)
    }
}

/// Advertised BLE local name for a host.
pub fn local_name(hostname: &str) -> String {
    format!("VPS_{hostname}")
}
