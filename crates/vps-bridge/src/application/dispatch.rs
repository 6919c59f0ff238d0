//! DispatchEngine: routes protocol events to characteristic handlers.
//!
//! The engine is the only component that knows which characteristic kind
//! supports which operation.  For every call it:
//!
//! 1. Resolves the UUID to a [`Characteristic`] (`UnknownCharacteristic`
//!    otherwise).
//! 2. Checks the kind's static capability set (`UnsupportedOperation`
//!    otherwise).
//! 3. Takes the characteristic's serial lock, so calls on one characteristic
//!    never overlap while calls on different characteristics run
//!    concurrently.
//! 4. Dispatches through an exhaustive `match` on the kind.
//!
//! # Failure policy
//!
//! Request errors (`MalformedInput`, `UnknownCharacteristic`,
//! `UnsupportedOperation`) are returned to the controller.  External failures
//! on the write and subscribe paths are logged, recorded as the
//! characteristic's last failure, and absorbed: the write completes.  On the
//! read path, CurrentSSID and DeviceStatus fall back to a documented value;
//! IP and LocalName return `NetworkQueryFailure`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use vps_core::protocol::network::NOT_CONNECTED;
use vps_core::{
    BridgeError, Capability, CharacteristicKind, DeviceStatus, ErrorKind, Operation,
    ServiceDescriptor,
};

use super::characteristics::{Handlers, Ports};
use super::ports::NotificationSink;
use super::scheduler::{NotificationScheduler, NotifyPolicy};
use super::slot::Characteristic;

/// Default DeviceStatus push interval.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub device_status_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

/// The characteristic dispatch and notification engine.
pub struct DispatchEngine {
    service: ServiceDescriptor,
    slots: HashMap<Uuid, Arc<Characteristic>>,
    handlers: Handlers,
    scheduler: NotificationScheduler,
    config: EngineConfig,
}

impl DispatchEngine {
    /// Builds an engine serving the VPS service.
    pub fn new(ports: Ports, sink: Arc<dyn NotificationSink>, config: EngineConfig) -> Self {
        Self::with_service(ServiceDescriptor::vps(), ports, sink, config)
    }

    /// Builds an engine serving only the characteristics in `service`.
    pub fn with_service(
        service: ServiceDescriptor,
        ports: Ports,
        sink: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        let slots = service
            .characteristics
            .iter()
            .map(|&kind| (kind.uuid(), Arc::new(Characteristic::new(kind, initial_value(kind)))))
            .collect();
        Self {
            service,
            slots,
            handlers: Handlers::new(ports),
            scheduler: NotificationScheduler::new(sink),
            config,
        }
    }

    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    // ── Protocol operations ───────────────────────────────────────────────────

    /// Serves a read.
    pub async fn handle_read(&self, id: Uuid) -> Result<Vec<u8>, BridgeError> {
        let slot = self.resolve(id, Operation::Read, Capability::Read)?;
        let _serial = slot.serialize().await;

        let value = match slot.kind() {
            CharacteristicKind::CurrentSsid => {
                match self.handlers.network.current_ssid().await {
                    Ok(ssid) => ssid.into_bytes(),
                    Err(err) => {
                        self.absorb(slot, Operation::Read, &err);
                        NOT_CONNECTED.as_bytes().to_vec()
                    }
                }
            }
            CharacteristicKind::Ip => self
                .handlers
                .network
                .ip()
                .await
                .map_err(|err| self.report(slot, Operation::Read, err))?
                .into_bytes(),
            CharacteristicKind::LocalName => self
                .handlers
                .network
                .local_name()
                .await
                .map_err(|err| self.report(slot, Operation::Read, err))?
                .into_bytes(),
            CharacteristicKind::Terminal => return Ok(slot.value()),
            CharacteristicKind::DeviceStatus => {
                let sample = self.handlers.device_status.current().await;
                if let Some(err) = &sample.degraded {
                    self.absorb(slot, Operation::Read, err);
                }
                sample.value
            }
            CharacteristicKind::WifiConnect | CharacteristicKind::RemoteControl => {
                return Err(unsupported(slot, Operation::Read));
            }
        };

        slot.set_value(value.clone());
        Ok(value)
    }

    /// Serves a write.
    pub async fn handle_write(&self, id: Uuid, payload: &[u8]) -> Result<(), BridgeError> {
        let slot = self.resolve(id, Operation::Write, Capability::Write)?;
        let _serial = slot.serialize().await;

        let result = match slot.kind() {
            CharacteristicKind::WifiConnect => self.handlers.wifi_connect.write(payload).await,
            CharacteristicKind::Terminal => {
                self.handlers.terminal.run(payload).await.map(|output| {
                    let pushed = slot.update_and_notify(output, self.scheduler.sink());
                    debug!(pushed, "terminal output updated");
                })
            }
            CharacteristicKind::RemoteControl => self.handlers.remote_control.write(payload).await,
            CharacteristicKind::CurrentSsid
            | CharacteristicKind::Ip
            | CharacteristicKind::LocalName
            | CharacteristicKind::DeviceStatus => {
                return Err(unsupported(slot, Operation::Write));
            }
        };

        match result {
            Err(err) if err.is_external() => {
                self.absorb(slot, Operation::Write, &err);
                Ok(())
            }
            other => other,
        }
    }

    /// Opens a subscription.  Subscribing twice is a no-op.
    pub async fn handle_subscribe(&self, id: Uuid) -> Result<(), BridgeError> {
        let slot = self.resolve(id, Operation::Subscribe, Capability::Notify)?;
        let _serial = slot.serialize().await;

        let policy = match slot.kind() {
            CharacteristicKind::Terminal => NotifyPolicy::OnChange,
            CharacteristicKind::DeviceStatus => NotifyPolicy::Periodic {
                interval: self.config.device_status_interval,
                source: self.handlers.device_status.clone(),
            },
            CharacteristicKind::WifiConnect
            | CharacteristicKind::CurrentSsid
            | CharacteristicKind::Ip
            | CharacteristicKind::LocalName
            | CharacteristicKind::RemoteControl => {
                return Err(unsupported(slot, Operation::Subscribe));
            }
        };

        if self.scheduler.start(slot, policy) {
            info!(characteristic = %slot.kind(), "notifications enabled");
        } else {
            debug!(characteristic = %slot.kind(), "already notifying");
        }
        Ok(())
    }

    /// Cancels a subscription.  When this returns, no further push for the
    /// characteristic will be delivered.  Unsubscribing while idle is a no-op.
    pub async fn handle_unsubscribe(&self, id: Uuid) -> Result<(), BridgeError> {
        let slot = self.resolve(id, Operation::Unsubscribe, Capability::Notify)?;
        let _serial = slot.serialize().await;

        if self.scheduler.stop(slot) {
            info!(characteristic = %slot.kind(), "notifications disabled");
        } else {
            debug!(characteristic = %slot.kind(), "not notifying");
        }
        Ok(())
    }

    /// Cancels every active subscription.
    pub fn shutdown(&self) {
        for slot in self.slots.values() {
            self.scheduler.stop(slot);
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// Kind of the last failure absorbed on characteristic `id`.
    pub fn last_failure(&self, id: Uuid) -> Option<ErrorKind> {
        self.slots.get(&id).and_then(|slot| slot.last_failure())
    }

    pub fn is_notifying(&self, id: Uuid) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.is_notifying())
    }

    /// Current value of characteristic `id`, without side effects.
    pub fn value(&self, id: Uuid) -> Option<Vec<u8>> {
        self.slots.get(&id).map(|slot| slot.value())
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn resolve(
        &self,
        id: Uuid,
        operation: Operation,
        capability: Capability,
    ) -> Result<&Arc<Characteristic>, BridgeError> {
        let slot = self
            .slots
            .get(&id)
            .ok_or(BridgeError::UnknownCharacteristic(id))?;
        if !slot.kind().capabilities().contains(capability) {
            return Err(unsupported(slot, operation));
        }
        Ok(slot)
    }

    fn absorb(&self, slot: &Characteristic, operation: Operation, err: &BridgeError) {
        warn!(characteristic = %slot.kind(), %operation, error = %err, "external call failed");
        slot.record_failure(err.kind());
    }

    fn report(&self, slot: &Characteristic, operation: Operation, err: BridgeError) -> BridgeError {
        self.absorb(slot, operation, &err);
        err
    }
}

fn unsupported(slot: &Characteristic, operation: Operation) -> BridgeError {
    BridgeError::UnsupportedOperation {
        characteristic: slot.uuid(),
        operation,
    }
}

fn initial_value(kind: CharacteristicKind) -> Vec<u8> {
    match kind {
        CharacteristicKind::DeviceStatus => DeviceStatus { battery: None }.to_bytes(),
        CharacteristicKind::CurrentSsid => NOT_CONNECTED.as_bytes().to_vec(),
        CharacteristicKind::WifiConnect
        | CharacteristicKind::Ip
        | CharacteristicKind::LocalName
        | CharacteristicKind::Terminal
        | CharacteristicKind::RemoteControl => Vec::new(),
    }
}
