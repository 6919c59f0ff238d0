//! Host command execution with `tokio::process`.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::application::ports::{CommandExecutor, CommandLine, CommandResult};

/// Default upper bound on one command's run time.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause after each command, giving NetworkManager and friends time
/// to settle before the next request is served.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// How long output is still read once the child has exited.
const PIPE_GRACE: Duration = Duration::from_millis(100);

/// Runs commands as child processes.
///
/// A command that cannot be spawned or outlives `timeout` is reported as a
/// failed [`CommandResult`]; the child is killed when its future is dropped.
#[derive(Debug, Clone)]
pub struct SystemCommandExecutor {
    timeout: Duration,
    settle_delay: Duration,
}

impl SystemCommandExecutor {
    pub fn new(timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            timeout,
            settle_delay,
        }
    }

    async fn run(&self, command: &CommandLine) -> CommandResult {
        let spawned = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return CommandResult::failed(format!("spawn {} failed: {e}", command.program))
            }
        };

        match tokio::time::timeout(self.timeout, collect(&mut child)).await {
            Ok(Ok((status, stdout, stderr))) => CommandResult {
                success: status.success(),
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            },
            Ok(Err(e)) => CommandResult::failed(format!("wait on {} failed: {e}", command.program)),
            Err(_) => CommandResult::failed(format!(
                "{} timed out after {:?}",
                command.program, self.timeout
            )),
        }
    }
}

/// Waits for `child` to exit while reading its output.
///
/// A process the child leaves running in the background inherits its pipes
/// and can keep them open long after the child is gone.  Reading stops
/// [`PIPE_GRACE`] after the exit, so such a command completes with the output
/// produced so far instead of running into the timeout.
async fn collect(child: &mut Child) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let status = {
        let pipes = async {
            tokio::join!(
                drain(stdout_pipe.as_mut(), &mut stdout),
                drain(stderr_pipe.as_mut(), &mut stderr)
            )
        };
        tokio::pin!(pipes);
        let exited = child.wait();
        tokio::pin!(exited);

        tokio::select! {
            _ = &mut pipes => exited.await?,
            status = &mut exited => {
                let status = status?;
                if tokio::time::timeout(PIPE_GRACE, &mut pipes).await.is_err() {
                    debug!("output still open after exit, reading stopped");
                }
                status
            }
        }
    };

    Ok((status, stdout, stderr))
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) {
    if let Some(pipe) = pipe {
        if let Err(e) = pipe.read_to_end(buf).await {
            debug!(error = %e, "reading command output failed");
        }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT, DEFAULT_SETTLE_DELAY)
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn execute(&self, command: &CommandLine) -> CommandResult {
        debug!(program = %command.program, "executing command");
        let result = self.run(command).await;
        if !result.success {
            warn!(
                program = %command.program,
                code = ?result.exit_code,
                stderr = %result.stderr.trim(),
                "command failed"
            );
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> SystemCommandExecutor {
        SystemCommandExecutor::new(Duration::from_secs(5), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let result = executor().execute(&CommandLine::shell("echo hi")).await;

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "hi\n");
    }

    #[tokio::test]
    async fn test_execute_reports_non_zero_exit() {
        let result = executor()
            .execute(&CommandLine::shell("echo oops >&2; exit 3"))
            .await;

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_execute_reports_spawn_failure() {
        let result = executor()
            .execute(&CommandLine::new("/nonexistent/vps-test-binary", Vec::new()))
            .await;

        assert!(!result.success);
        assert_eq!(result.exit_code, None);
        assert!(result.stderr.contains("spawn"));
    }

    #[tokio::test]
    async fn test_execute_times_out_long_command() {
        // Arrange
        let executor = SystemCommandExecutor::new(Duration::from_millis(100), Duration::ZERO);

        // Act
        let result = executor.execute(&CommandLine::shell("sleep 5")).await;

        // Assert
        assert!(!result.success);
        assert!(result.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_execute_passes_arguments_without_shell_expansion() {
        let result = executor()
            .execute(&CommandLine::new("echo", vec!["$HOME".into(), "a b".into()]))
            .await;

        assert_eq!(result.stdout, "$HOME a b\n");
    }

    #[tokio::test]
    async fn test_background_child_does_not_hold_the_command_open() {
        // Arrange: the backgrounded sleep inherits the shell's stdout
        let executor = SystemCommandExecutor::new(Duration::from_secs(2), Duration::ZERO);
        let started = std::time::Instant::now();

        // Act
        let result = executor
            .execute(&CommandLine::shell("echo hi; sleep 3 &"))
            .await;

        // Assert
        assert!(result.success, "stderr: {}", result.stderr);
        assert_eq!(result.stdout, "hi\n");
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
