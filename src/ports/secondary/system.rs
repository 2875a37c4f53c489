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

use crate::domain::{
    CollectionConfig, DomainDescriptor, InterfaceDescriptor, MemoryTotals, PlatformCapabilities,
    ProbeError, VolumeDescriptor, VolumeUsage,
};
use async_trait::async_trait;
use std::time::Duration;

/// Secondary port - Platform probe
///
/// Thin accessor to the OS facilities behind each snapshot section.
/// Every call re-reads live state; implementations must not cache.
/// Different adapters can implement this for real hosts or simulated ones.
#[async_trait]
pub trait PlatformProbe: Send + Sync {
    /// Name of the operating system being probed
    fn platform_name(&self) -> String;

    /// Facilities available beyond the baseline (checked once per pass)
    fn capabilities(&self) -> PlatformCapabilities;

    /// Get system hostname
    async fn query_hostname(&self) -> Result<String, ProbeError>;

    /// Enumerate network interfaces
    ///
    /// # Returns
    /// * `Ok(Vec<InterfaceDescriptor>)` - Interfaces in a stable order
    /// * `Err(ProbeError::Unavailable)` - The OS network API cannot be reached
    async fn query_network_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, ProbeError>;

    /// Enumerate mounted volumes
    async fn query_volumes(&self) -> Result<Vec<VolumeDescriptor>, ProbeError>;

    /// Query usage for one previously enumerated volume
    ///
    /// # Returns
    /// * `Ok(VolumeUsage)` - Figures from the OS usage call
    /// * `Err(ProbeError::Transient)` - Volume vanished since enumeration
    /// * `Err(ProbeError)` - Volume unreadable for another reason
    async fn query_volume_usage(&self, volume: &VolumeDescriptor)
        -> Result<VolumeUsage, ProbeError>;

    /// Query domain/workgroup membership
    ///
    /// # Returns
    /// * `Err(ProbeError::Unsupported)` - Platform has no domain service
    async fn query_domain_info(&self) -> Result<DomainDescriptor, ProbeError>;

    /// Run the external managed identity status check and return its raw output
    ///
    /// # Arguments
    /// * `timeout` - Ceiling for the external command
    async fn query_managed_identity_status(&self, timeout: Duration)
        -> Result<String, ProbeError>;

    /// Count physical CPU cores
    async fn query_physical_cores(&self) -> Result<usize, ProbeError>;

    /// Count logical CPU cores
    async fn query_logical_cores(&self) -> Result<usize, ProbeError>;

    /// Sample per-logical-core utilization
    ///
    /// This is the one intentionally blocking query: it waits for
    /// `sample_interval` between two counter reads.
    async fn query_cpu_usage(&self, sample_interval: Duration) -> Result<Vec<f32>, ProbeError>;

    /// Read memory totals
    async fn query_memory(&self) -> Result<MemoryTotals, ProbeError>;
}

/// Secondary port - Configuration provider abstraction
///
/// This interface abstracts how collection options are loaded,
/// allowing for different sources (files, CLI args, in-memory).
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Get collection configuration
    ///
    /// # Returns
    /// * `Ok(CollectionConfig)` - Validated configuration
    /// * `Err(ConfigError)` - Error loading or validating configuration
    async fn get_collection_config(&self)
        -> Result<CollectionConfig, crate::domain::ConfigError>;
}
