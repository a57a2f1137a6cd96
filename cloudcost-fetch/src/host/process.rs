//! Subprocess execution for vendor CLI tools.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ProcessError;

/// Default command timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Process Output
// ============================================================================

/// Output from a process execution.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output content.
    pub stdout: String,
    /// Standard error content.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// How long the command took to execute.
    pub duration: Duration,
}

impl ProcessOutput {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the stdout if successful, otherwise an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::NonZeroExit`] carrying stderr.
    pub fn stdout_if_success(&self) -> Result<&str, ProcessError> {
        if self.success() {
            Ok(&self.stdout)
        } else {
            Err(ProcessError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

// ============================================================================
// Process Runner
// ============================================================================

/// Runs vendor CLIs with captured output and a timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a runner with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The timeout applied to every command.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a command and capture output.
    #[instrument(skip(self), fields(cmd = %cmd))]
    pub async fn run(&self, cmd: &str, args: &[&str]) -> Result<ProcessOutput, ProcessError> {
        self.run_internal(cmd, args, &[]).await
    }

    /// Run a command with extra environment variables.
    ///
    /// Values are never logged since they usually carry credentials.
    #[instrument(skip(self, env), fields(cmd = %cmd))]
    pub async fn run_with_env(
        &self,
        cmd: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ProcessOutput, ProcessError> {
        self.run_internal(cmd, args, env).await
    }

    async fn run_internal(
        &self,
        cmd: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(args = ?args, env_keys = ?env.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "Running command");

        let cmd_path = self.which(cmd).ok_or_else(|| {
            warn!(cmd = %cmd, "Command not found");
            ProcessError::NotFound(cmd.to_string())
        })?;

        let start = Instant::now();

        let mut command = Command::new(&cmd_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in env {
            command.env(key, value);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(cmd = %cmd, timeout = ?self.timeout, "Command timed out");
                return Err(ProcessError::Timeout(self.timeout));
            }
        };

        let duration = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            duration,
        };

        debug!(
            exit_code = exit_code,
            duration = ?duration,
            stdout_len = result.stdout.len(),
            "Command completed"
        );

        Ok(result)
    }

    /// Check if a command exists on PATH.
    pub fn command_exists(&self, cmd: &str) -> bool {
        self.which(cmd).is_some()
    }

    /// Find the path to a command.
    pub fn which(&self, cmd: &str) -> Option<PathBuf> {
        which::which(cmd).ok()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_output_success() {
        let output = ProcessOutput {
            stdout: "hello".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(100),
        };
        assert!(output.success());
        assert_eq!(output.stdout_if_success().unwrap(), "hello");
    }

    #[test]
    fn test_process_output_failure() {
        let output = ProcessOutput {
            stdout: String::new(),
            stderr: "Unable to locate credentials\n".to_string(),
            exit_code: 255,
            duration: Duration::from_millis(100),
        };
        match output.stdout_if_success() {
            Err(ProcessError::NonZeroExit { code, stderr }) => {
                assert_eq!(code, 255);
                assert_eq!(stderr, "Unable to locate credentials");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_command() {
        let runner = ProcessRunner::new();
        let result = runner.run("definitely-not-a-real-cloud-cli", &[]).await;
        assert!(matches!(result, Err(ProcessError::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_env_passes_variables() {
        let runner = ProcessRunner::new();
        let output = runner
            .run_with_env("sh", &["-c", "printf %s \"$CLOUDCOST_TEST_VAR\""], &[("CLOUDCOST_TEST_VAR", "xyz")])
            .await
            .unwrap();
        assert_eq!(output.stdout_if_success().unwrap(), "xyz");
    }
}
