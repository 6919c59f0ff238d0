//! Domain entities for the VPS peripheral bridge.
//!
//! This module contains pure definitions with no infrastructure dependencies:
//! nothing here talks to BlueZ, runs a process, or opens a socket.
//!
//! - [`characteristic`] – the closed set of characteristic kinds, their UUIDs
//!   and the capabilities each one advertises.
//! - [`service`] – the primary GATT service that groups the characteristics
//!   in registration order.
//! - [`error`] – the failure taxonomy shared by every handler.

pub mod characteristic;
pub mod error;
pub mod service;
