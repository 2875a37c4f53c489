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

//! Dependency injection container for snapshot collection services

use crate::adapters::{
    ConfigFile, FileConfigurationProvider, FileReportPublisher, HostPlatformProbe, HtmlRenderer,
    JsonRenderer, ProcessCommandExecutor, StaticConfigurationProvider, TextRenderer,
    TomlRenderer,
};
use crate::domain::{CollectionConfig, SnapshotAssembler};
use crate::ports::{
    CommandExecutor, ConfigurationProvider, OutputFormat, PlatformProbe, ReportPublisher,
    ReportRenderer, SnapshotService,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the dependency injection container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Default timeout for external commands without their own bound
    pub command_timeout: Duration,
    /// Extra attempts when an external command fails to start
    pub retry_count: u32,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            retry_count: 1,
        }
    }
}

/// Dependency injection container
pub struct ServiceContainer {
    config: ContainerConfig,
}

impl ServiceContainer {
    /// Create a new service container with configuration
    pub fn new(config: ContainerConfig) -> Self {
        Self { config }
    }

    /// Create the command executor
    pub fn create_command_executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::new(ProcessCommandExecutor::new(
            self.config.command_timeout,
            self.config.retry_count,
        ))
    }

    /// Create the probe for the host this process runs on
    pub fn create_platform_probe(&self) -> Arc<dyn PlatformProbe> {
        Arc::new(HostPlatformProbe::new(self.create_command_executor()))
    }

    /// Create the snapshot service over the host probe
    pub fn create_snapshot_service(&self) -> Arc<dyn SnapshotService> {
        Arc::new(SnapshotAssembler::new(self.create_platform_probe()))
    }

    /// Create the configuration provider
    ///
    /// Reads `config_path` when given; `overrides` always apply last.
    pub fn create_configuration_provider(
        &self,
        config_path: Option<&Path>,
        overrides: ConfigFile,
    ) -> Arc<dyn ConfigurationProvider> {
        match config_path {
            Some(path) => {
                Arc::new(FileConfigurationProvider::new(path).with_overrides(overrides))
            }
            None => Arc::new(StaticConfigurationProvider::new(
                overrides.apply(CollectionConfig::default()),
            )),
        }
    }

    /// Create the renderer for an output format
    pub fn create_renderer(&self, format: OutputFormat) -> Box<dyn ReportRenderer> {
        match format {
            OutputFormat::Text => Box::new(TextRenderer),
            OutputFormat::Json => Box::new(JsonRenderer),
            OutputFormat::Toml => Box::new(TomlRenderer),
            OutputFormat::Html => Box::new(HtmlRenderer),
        }
    }

    /// Create the report publisher
    pub fn create_report_publisher(&self) -> Arc<dyn ReportPublisher> {
        Arc::new(FileReportPublisher::new())
    }

    /// Get platform name for logging
    pub fn get_platform_name(&self) -> String {
        self.create_platform_probe().platform_name()
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

/// Builder pattern for container configuration
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set retry count
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
