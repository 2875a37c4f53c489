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

//! Host Facts Library
//!
//! This library collects a best-effort snapshot of facts about the local
//! host (network, domain membership, storage and hardware) using a Ports and
//! Adapters (Hexagonal) architecture.
//!
//! A snapshot is always produced. Any section or field the host cannot
//! answer for is recorded as unavailable together with the reason.
//!
//! # Architecture
//!
//! - **Domain**: Snapshot entities, collectors and the assembler
//! - **Ports**: Interfaces for the platform probe, commands, config and reports
//! - **Adapters**: Host, simulated and Windows probes, renderers, file output
//!
//! # Usage
//!
//! ```rust,no_run
//! use host_facts::{collect_snapshot, CollectionConfig, Collected};
//!
//! #[tokio::main]
//! async fn main() {
//!     let snapshot = collect_snapshot(&CollectionConfig::default()).await;
//!
//!     match snapshot.network() {
//!         Collected::Value(network) => println!("Hostname: {:?}", network.hostname.value()),
//!         Collected::Unavailable(err) => println!("No network facts: {err}"),
//!     }
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

pub use adapters::{
    ConfigFile, FileConfigurationProvider, FileReportPublisher, HostPlatformProbe, HtmlRenderer,
    JsonRenderer, ProcessCommandExecutor, SimulatedPlatformProbe, StaticConfigurationProvider,
    TextRenderer, TomlRenderer,
};
pub use container::{ContainerConfig, ContainerConfigBuilder, ServiceContainer};
pub use domain::{
    Collected, CollectionConfig, CollectionError, ConfigError, FailureReason, RenderError,
    SectionKind, Snapshot, SnapshotAssembler,
};
pub use ports::{
    CommandExecutor, ConfigurationProvider, OutputFormat, PlatformProbe, ReportPublisher,
    ReportRenderer, SnapshotService,
};

use std::sync::Arc;

/// Create a snapshot service with the adapters for this host
///
/// # Example
///
/// ```rust,no_run
/// use host_facts::{create_service, CollectionConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let service = create_service();
///     let snapshot = service.collect(&CollectionConfig::default()).await;
///     println!("{} sections unavailable", snapshot.failures().len());
/// }
/// ```
pub fn create_service() -> Arc<dyn SnapshotService> {
    ServiceContainer::default().create_snapshot_service()
}

/// Create a snapshot service with custom container configuration
pub fn create_service_with_config(container_config: ContainerConfig) -> Arc<dyn SnapshotService> {
    ServiceContainer::new(container_config).create_snapshot_service()
}

/// Collect one snapshot of this host
pub async fn collect_snapshot(config: &CollectionConfig) -> Snapshot {
    create_service().collect(config).await
}
