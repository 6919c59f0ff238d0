//! Payload codecs for the bytes exchanged with the controller and with the
//! bridge's local collaborators.
//!
//! Every function here is pure: it takes bytes or text and returns a typed
//! value or a [`BridgeError`](crate::BridgeError).  Handlers in `vps-bridge`
//! call these before touching any external system, so a malformed payload is
//! rejected without side effects.

pub mod network;
pub mod recorder;
pub mod remote;
pub mod status;
pub mod terminal;
pub mod wifi;
