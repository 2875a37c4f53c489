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

//! Configuration providers for collection options

use crate::domain::{CollectionConfig, ConfigError};
use crate::ports::ConfigurationProvider;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Collection options as written in a TOML file or given on the command line
///
/// Every key is optional; absent keys keep the value underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub sample_interval_ms: Option<u64>,
    pub sample_ceiling_ms: Option<u64>,
    pub primary_interface: Option<String>,
    pub domain_status_timeout_ms: Option<u64>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay the keys present here onto `config`
    pub fn apply(&self, mut config: CollectionConfig) -> CollectionConfig {
        if let Some(ms) = self.sample_interval_ms {
            config.sample_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.sample_ceiling_ms {
            config.sample_ceiling = Duration::from_millis(ms);
        }
        if let Some(name) = &self.primary_interface {
            let name = name.trim();
            config.primary_interface_hint = (!name.is_empty()).then(|| name.to_string());
        }
        if let Some(ms) = self.domain_status_timeout_ms {
            config.domain_status_timeout = Duration::from_millis(ms);
        }
        config
    }
}

/// Configuration provider serving a fixed, in-memory configuration
pub struct StaticConfigurationProvider {
    config: CollectionConfig,
}

impl StaticConfigurationProvider {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }
}

impl Default for StaticConfigurationProvider {
    fn default() -> Self {
        Self::new(CollectionConfig::default())
    }
}

#[async_trait]
impl ConfigurationProvider for StaticConfigurationProvider {
    async fn get_collection_config(&self) -> Result<CollectionConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config.clone())
    }
}

/// Configuration provider reading a TOML file, with optional overrides on top
pub struct FileConfigurationProvider {
    path: PathBuf,
    overrides: ConfigFile,
}

impl FileConfigurationProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            overrides: ConfigFile::default(),
        }
    }

    /// Keys applied after the file, e.g. from command-line flags
    pub fn with_overrides(mut self, overrides: ConfigFile) -> Self {
        self.overrides = overrides;
        self
    }
}

#[async_trait]
impl ConfigurationProvider for FileConfigurationProvider {
    async fn get_collection_config(&self) -> Result<CollectionConfig, ConfigError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!("Loaded configuration from {}", self.path.display());

        let file = ConfigFile::parse(&text)?;
        let config = self.overrides.apply(file.apply(CollectionConfig::default()));
        config.validate()?;
        Ok(config)
    }
}
