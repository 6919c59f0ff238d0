//! Infrastructure layer for the bridge.
//!
//! Contains OS-facing adapters: child processes and host queries, the HTTP
//! recorder client, the peripheral transport, config file storage, and
//! logging setup.
//!
//! **Dependency rule**: this layer may depend on `application` and `vps_core`,
//! but MUST NOT be imported by the `application` or domain layers (tests
//! excepted, which use the fakes in [`mock`]).

pub mod logging;
pub mod mock;
pub mod recorder;
pub mod storage;
pub mod system;
pub mod transport;
