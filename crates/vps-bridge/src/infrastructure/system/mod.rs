//! Host adapters: child processes, NetworkManager, and battery telemetry.
//!
//! Everything that touches the host operating system lives here.  The
//! network and telemetry adapters run their queries through a
//! [`CommandExecutor`](crate::application::ports::CommandExecutor), so tests
//! can script the host's answers with
//! [`FakeCommandExecutor`](crate::infrastructure::mock::FakeCommandExecutor).

pub mod command;
pub mod network;
pub mod telemetry;
