//! Host process operations implementation
//!
//! Runs commands with `tokio::process`, never attaches stdin, and records the
//! outcome of every invocation through `tracing`.

use async_trait::async_trait;
use lockcheck_errors::{Error, PlatformError};
use std::convert::TryFrom;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::process::{CommandOutput, PlatformCommand, ProcessOperations};

/// Process operations for the host the harness runs on
#[derive(Debug, Clone, Copy)]
pub struct NativeProcessOperations;

impl NativeProcessOperations {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeProcessOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn build_command(cmd: &PlatformCommand) -> Command {
    let mut command = Command::new(cmd.program());
    command
        .args(cmd.get_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = cmd.get_current_dir() {
        command.current_dir(dir);
    }

    for key in cmd.get_env_removals() {
        command.env_remove(key);
    }

    for (key, value) in cmd.get_env_vars() {
        command.env(key, value);
    }

    command
}

#[async_trait]
impl ProcessOperations for NativeProcessOperations {
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error> {
        let start = Instant::now();
        let line = cmd.to_string();
        debug!(
            command = %line,
            cwd = ?cmd.get_current_dir(),
            "process started"
        );

        let mut command = build_command(&cmd);
        let pending = command.output();

        let result = match cmd.get_timeout() {
            // Dropping the future on timeout kills the child (kill_on_drop).
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(output) => output,
                Err(_) => {
                    warn!(command = %line, timeout_secs = limit.as_secs(), "process timed out");
                    return Err(PlatformError::Timeout {
                        command: line,
                        seconds: limit.as_secs(),
                    }
                    .into());
                }
            },
            None => pending.await,
        };

        let duration_ms = duration_to_millis(start.elapsed());
        match result {
            Ok(output) => {
                debug!(
                    command = %line,
                    exit_code = ?output.status.code(),
                    duration_ms,
                    stdout_bytes = output.stdout.len(),
                    stderr_bytes = output.stderr.len(),
                    "process completed"
                );
                Ok(CommandOutput {
                    status: output.status,
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            Err(e) => {
                warn!(command = %line, duration_ms, error = %e, "process failed to start");
                let error = if e.kind() == std::io::ErrorKind::NotFound {
                    PlatformError::CommandNotFound {
                        command: cmd.program().to_string(),
                    }
                } else {
                    PlatformError::ProcessExecutionFailed {
                        command: line,
                        message: e.to_string(),
                    }
                };
                Err(error.into())
            }
        }
    }

    async fn which(&self, program: &str) -> Result<PathBuf, Error> {
        let program = program.to_string();
        // `which` walks PATH synchronously
        let lookup = tokio::task::spawn_blocking(move || {
            let found = which::which(&program);
            (program, found)
        })
        .await
        .map_err(|e| Error::internal(format!("which task failed: {e}")))?;

        match lookup {
            (_, Ok(path)) => Ok(path),
            (program, Err(_)) => Err(PlatformError::CommandNotFound { command: program }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_output_and_env() {
        let ops = NativeProcessOperations::new();
        let mut cmd = ops.create_command("sh");
        cmd.args(["-c", "echo \"$LOCKCHECK_PROBE\"; echo oops >&2; exit 3"])
            .env("LOCKCHECK_PROBE", "hello");

        let output = ops.execute_command(cmd).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.return_code(), Some(3));
        assert_eq!(output.stdout_lossy().trim(), "hello");
        assert_eq!(output.stderr_lossy().trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_current_dir_is_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let ops = NativeProcessOperations::new();
        let mut cmd = ops.create_command("pwd");
        cmd.current_dir(dir.path());

        let output = ops.execute_command(cmd).await.unwrap();
        let reported = PathBuf::from(output.stdout_lossy().trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_command() {
        let ops = NativeProcessOperations::new();
        let mut cmd = ops.create_command("sleep");
        cmd.arg("5").timeout(Some(Duration::from_millis(100)));

        let err = ops.execute_command(cmd).await.unwrap_err();
        match err {
            Error::Platform(PlatformError::Timeout { command, seconds }) => {
                assert_eq!(command, "sleep 5");
                assert_eq!(seconds, 0);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let ops = NativeProcessOperations::new();
        let cmd = ops.create_command("lockcheck-definitely-not-installed");
        let err = ops.execute_command(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::CommandNotFound { .. })
        ));

        let err = ops
            .which("lockcheck-definitely-not-installed")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::CommandNotFound { .. })
        ));
    }
}
