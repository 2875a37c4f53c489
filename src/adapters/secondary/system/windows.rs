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

//! Windows domain services queried through external commands

use crate::domain::parsers::parse_computer_system_json;
use crate::domain::{CommandError, DomainDescriptor, ProbeError};
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

const COMPUTER_SYSTEM_QUERY: &str = "Get-CimInstance -ClassName Win32_ComputerSystem \
     | Select-Object Domain,Workgroup,PartOfDomain | ConvertTo-Json -Compress";

/// Domain and managed identity queries for Windows hosts
pub struct WindowsDomainServices {
    command_executor: Arc<dyn CommandExecutor>,
    /// Bound for the computer system query
    query_timeout: Duration,
}

impl WindowsDomainServices {
    pub fn new(command_executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            command_executor,
            query_timeout: Duration::from_secs(15),
        }
    }

    /// Execute `cmd`, treating a non-zero exit as a failed query
    async fn run(&self, cmd: &SystemCommand) -> Result<CommandOutput, ProbeError> {
        let output = self.command_executor.execute(cmd).await?;
        if !output.success {
            return Err(CommandError::NonZeroExit {
                command: cmd.program.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(output)
    }

    /// Read domain/workgroup membership from `Win32_ComputerSystem`
    pub async fn query_domain_info(&self) -> Result<DomainDescriptor, ProbeError> {
        let cmd = SystemCommand::new("powershell")
            .args(&["-NoProfile", "-NonInteractive", "-Command", COMPUTER_SYSTEM_QUERY])
            .timeout(self.query_timeout);

        let output = self.run(&cmd).await?;
        debug!("Computer system query returned {} bytes", output.stdout.len());
        parse_computer_system_json(&output.stdout).map_err(ProbeError::Unavailable)
    }

    /// Run `dsregcmd /status` and return its raw output
    pub async fn query_join_status(&self, timeout: Duration) -> Result<String, ProbeError> {
        let cmd = SystemCommand::new("dsregcmd")
            .args(&["/status"])
            .timeout(timeout);

        Ok(self.run(&cmd).await?.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Executor that replays one scripted result and records the command line
    struct ScriptedExecutor {
        result: Result<CommandOutput, CommandError>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn ok(stdout: &str) -> Self {
            Self::with(Ok(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                success: true,
            }))
        }

        fn with(result: Result<CommandOutput, CommandError>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
            self.seen.lock().unwrap().push(command.display());
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_domain_info_from_json() {
        let executor = Arc::new(ScriptedExecutor::ok(
            r#"{"Domain":"corp.example.com","Workgroup":null,"PartOfDomain":true}"#,
        ));
        let services = WindowsDomainServices::new(executor.clone());

        let info = services.query_domain_info().await.unwrap();
        assert_eq!(info.domain.as_deref(), Some("corp.example.com"));
        assert!(executor.seen.lock().unwrap()[0].starts_with("powershell"));
    }

    #[tokio::test]
    async fn test_domain_info_malformed_output() {
        let services = WindowsDomainServices::new(Arc::new(ScriptedExecutor::ok("not json")));
        let err = services.query_domain_info().await.unwrap_err();
        assert!(matches!(err, ProbeError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_join_status_passes_timeout_error_through() {
        let executor = Arc::new(ScriptedExecutor::with(Err(CommandError::Timeout {
            command: "dsregcmd".to_string(),
            timeout_ms: 500,
        })));
        let services = WindowsDomainServices::new(executor);

        let err = services
            .query_join_status(Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_join_status_non_zero_exit() {
        let executor = Arc::new(ScriptedExecutor::with(Ok(CommandOutput {
            stdout: String::new(),
            stderr: "access denied".to_string(),
            exit_code: Some(1),
            success: false,
        })));
        let services = WindowsDomainServices::new(executor);

        let err = services
            .query_join_status(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access denied"));
    }
}
