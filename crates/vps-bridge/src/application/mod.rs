//! Application layer: the characteristic dispatch and notification engine.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `vps-core`) and the infrastructure (processes, sockets,
//! HTTP, files).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain types to serve a controller request (e.g. "the
//!   controller wrote `1` to RemoteControl, start the recorder").
//! - **Depends on abstractions** (the traits in [`ports`]) rather than on
//!   concrete adapters, so every handler is testable with fakes.
//! - **Contains no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`ports`** – Traits the engine consumes: command execution, network
//!   identity, telemetry, the recorder service, notification delivery, and
//!   the peripheral transport.
//!
//! - **`slot`** – Runtime state of one characteristic: current value,
//!   subscription, last absorbed failure, and the per-characteristic locks.
//!
//! - **`scheduler`** – Arms and cancels notification schedules.
//!
//! - **`characteristics`** – One handler per characteristic kind.
//!
//! - **`dispatch`** – The [`dispatch::DispatchEngine`] that resolves a UUID,
//!   checks capabilities, and routes to the right handler.
//!
//! - **`event_loop`** – Feeds transport events to the engine, one ordered
//!   lane per characteristic.

pub mod characteristics;
pub mod dispatch;
pub mod event_loop;
pub mod ports;
pub mod scheduler;
pub mod slot;
