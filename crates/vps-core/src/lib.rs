//! # vps-core
//!
//! Shared library for the VPS peripheral bridge containing the characteristic
//! catalogue, the service descriptor, the error taxonomy, and the payload
//! codecs used by every characteristic handler.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge runs on a headset host and exposes a handful of BLE GATT
//! "characteristics" to a companion controller (usually a phone).  Each
//! characteristic is a small remotely addressable value slot: the controller
//! can read it, write to it, or subscribe to pushed updates.
//!
//! This crate (`vps-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – What exists: the seven characteristic kinds, their UUIDs
//!   and capability sets, the service that groups them, and the error
//!   taxonomy every handler reports through.
//!
//! - **`protocol`** – What travels over the air: parsers for the payloads the
//!   controller writes (Wi-Fi credentials, terminal command lines, remote
//!   control codes, settings documents) and formatters for the values the
//!   bridge sends back (device status, SSID).

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `vps_core::CharacteristicKind` instead of the full module path.
pub use domain::characteristic::{Capabilities, Capability, CharacteristicKind};
pub use domain::error::{BridgeError, ErrorKind, Operation};
pub use domain::service::ServiceDescriptor;
pub use protocol::remote::{RemoteCommand, RemotePayload};
pub use protocol::status::{BatteryReading, DeviceStatus};
pub use protocol::wifi::WifiCredentials;
