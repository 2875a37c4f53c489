/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Process-based command execution adapter

use crate::domain::CommandError;
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Command executor built on `tokio::process` that enforces timeouts
///
/// A command that outlives its timeout is killed. Retries apply only to
/// spawn failures; a timeout is final so the ceiling stays fixed.
pub struct ProcessCommandExecutor {
    /// Default timeout for commands
    default_timeout: Duration,
    /// Number of retry attempts for commands that fail to start
    retry_count: u32,
}

impl ProcessCommandExecutor {
    /// Create a new command executor
    ///
    /// # Arguments
    /// * `default_timeout` - Timeout for commands that do not set their own
    /// * `retry_count` - Number of retry attempts after a spawn failure
    pub fn new(default_timeout: Duration, retry_count: u32) -> Self {
        Self {
            default_timeout,
            retry_count,
        }
    }

    /// Create a command executor with default settings
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(30), 0)
    }

    /// Execute a command once
    async fn execute_once(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let command_timeout = command.timeout.unwrap_or(self.default_timeout);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Executing: {}", command.display());

        match timeout(command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let success = output.status.success();
                let exit_code = output.status.code();

                if !success {
                    debug!("{} exited with {exit_code:?}: {}", command.program, stderr.trim());
                }

                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                    success,
                })
            }
            Ok(Err(e)) => Err(match e.kind() {
                ErrorKind::NotFound => CommandError::NotFound(command.program.clone()),
                ErrorKind::PermissionDenied => {
                    CommandError::PermissionDenied(command.program.clone())
                }
                _ => CommandError::SpawnFailed {
                    command: command.program.clone(),
                    message: e.to_string(),
                },
            }),
            Err(_) => Err(CommandError::Timeout {
                command: command.program.clone(),
                timeout_ms: command_timeout.as_millis(),
            }),
        }
    }
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let mut attempt = 0;
        loop {
            match self.execute_once(command).await {
                Err(CommandError::SpawnFailed { .. }) if attempt < self.retry_count => {
                    attempt += 1;
                    debug!("{} failed to start, retry {attempt}", command.program);
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_process_executor_basic() {
        let executor = ProcessCommandExecutor::with_defaults();

        let cmd = SystemCommand::new("echo").args(&["hello", "world"]);

        let result = executor.execute(&cmd).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let executor = ProcessCommandExecutor::with_defaults();
        let cmd = SystemCommand::new("definitely_not_a_real_command_12345");

        let result = executor.execute(&cmd).await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_output() {
        let executor = ProcessCommandExecutor::with_defaults();
        let cmd = SystemCommand::new("sh").args(&["-c", "echo oops >&2; exit 3"]);

        let result = executor.execute(&cmd).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let executor = ProcessCommandExecutor::new(Duration::from_secs(30), 3);

        let cmd = SystemCommand::new("sleep")
            .args(&["10"])
            .timeout(Duration::from_millis(100));

        let started = Instant::now();
        let result = executor.execute(&cmd).await;
        assert!(matches!(result, Err(CommandError::Timeout { .. })));
        assert!(result.unwrap_err().to_string().contains("timed out"));
        // Timeouts are not retried
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
