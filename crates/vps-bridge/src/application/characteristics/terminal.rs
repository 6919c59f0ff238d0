//! Terminal: run a diagnostic command line and serve its output.

use std::sync::Arc;

use tracing::debug;

use vps_core::protocol::terminal::decode_command_line;
use vps_core::BridgeError;

use crate::application::ports::{CommandExecutor, CommandLine};

pub struct Terminal {
    executor: Arc<dyn CommandExecutor>,
}

impl Terminal {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Runs the command line in `payload` through the shell and returns its
    /// stdout, which becomes the characteristic's new value.
    pub async fn run(&self, payload: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let line = decode_command_line(payload)?;
        debug!(command = %line, "running terminal command");

        let stdout = self
            .executor
            .execute(&CommandLine::shell(&line))
            .await
            .into_stdout(line)?;
        Ok(stdout.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CommandResult;
    use crate::infrastructure::mock::FakeCommandExecutor;
    use vps_core::ErrorKind;

    #[tokio::test]
    async fn test_run_returns_stdout_of_shell_command() {
        // Arrange
        let executor = Arc::new(FakeCommandExecutor::new());
        executor.push_result(CommandResult::ok("hi\n"));
        let terminal = Terminal::new(executor.clone());

        // Act
        let output = terminal.run(b"echo hi").await.unwrap();

        // Assert
        assert_eq!(output, b"hi\n");
        assert_eq!(executor.calls(), vec![CommandLine::shell("echo hi")]);
    }

    #[tokio::test]
    async fn test_run_reports_failing_command() {
        let executor = Arc::new(FakeCommandExecutor::new());
        executor.push_result(CommandResult {
            success: false,
            exit_code: Some(127),
            stdout: String::new(),
            stderr: "sh: 1: nosuch: not found".into(),
        });
        let terminal = Terminal::new(executor);

        let err = terminal.run(b"nosuch").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CommandFailure);
    }

    #[tokio::test]
    async fn test_run_rejects_blank_command() {
        let executor = Arc::new(FakeCommandExecutor::new());
        let terminal = Terminal::new(executor.clone());

        assert!(terminal.run(b"\n").await.is_err());
        assert!(executor.calls().is_empty());
    }
}
