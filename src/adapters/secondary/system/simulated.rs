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

//! Scripted platform probe for tests, demos and offline rendering

use crate::adapters::secondary::system::host::usage_percent;
use crate::domain::{
    DomainDescriptor, InterfaceAddress, InterfaceDescriptor, MemoryTotals, PlatformCapabilities,
    ProbeError, VolumeDescriptor, VolumeUsage,
};
use crate::ports::PlatformProbe;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
struct SimulatedVolume {
    descriptor: VolumeDescriptor,
    usage: Result<VolumeUsage, ProbeError>,
}

/// Platform probe that answers from a script instead of the OS
///
/// `SimulatedPlatformProbe::new()` describes a healthy host without
/// domain services; builder methods replace individual answers.
#[derive(Debug, Clone)]
pub struct SimulatedPlatformProbe {
    platform: String,
    domain_services: bool,
    hostname: Result<String, ProbeError>,
    interfaces: Result<Vec<InterfaceDescriptor>, ProbeError>,
    volumes: Result<Vec<SimulatedVolume>, ProbeError>,
    domain: Result<DomainDescriptor, ProbeError>,
    join_status: Result<String, ProbeError>,
    join_status_delay: Duration,
    physical_cores: Result<usize, ProbeError>,
    logical_cores: Result<usize, ProbeError>,
    cpu_usage: Result<Vec<f32>, ProbeError>,
    cpu_stall: Duration,
    minimum_sample_interval: Duration,
    memory: Result<MemoryTotals, ProbeError>,
}

impl Default for SimulatedPlatformProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a volume descriptor for the simulated volume table
pub fn simulated_volume(device: &str, mount_point: &str) -> VolumeDescriptor {
    VolumeDescriptor {
        device: device.to_string(),
        mount_point: mount_point.to_string(),
        file_system: "ext4".to_string(),
        removable: false,
    }
}

/// Build usage figures the way the host's usage call reports them
pub fn simulated_usage(total_bytes: u64, used_bytes: u64) -> VolumeUsage {
    let free_bytes = total_bytes.saturating_sub(used_bytes);
    VolumeUsage {
        total_bytes,
        used_bytes,
        free_bytes,
        percent: usage_percent(used_bytes, free_bytes),
    }
}

impl SimulatedPlatformProbe {
    /// A healthy host with one addressed interface, one volume and no domain services
    pub fn new() -> Self {
        Self {
            platform: "simulated".to_string(),
            domain_services: false,
            hostname: Ok("sim-host".to_string()),
            interfaces: Ok(vec![
                InterfaceDescriptor::new(
                    "eth0",
                    vec![InterfaceAddress {
                        address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                        prefix: 24,
                    }],
                ),
                InterfaceDescriptor::new(
                    "lo",
                    vec![InterfaceAddress {
                        address: IpAddr::V4(Ipv4Addr::LOCALHOST),
                        prefix: 8,
                    }],
                ),
            ]),
            volumes: Ok(vec![SimulatedVolume {
                descriptor: simulated_volume("/dev/sda1", "/"),
                usage: Ok(simulated_usage(100 * GIB, 40 * GIB)),
            }]),
            domain: Err(ProbeError::Unsupported("no domain service".to_string())),
            join_status: Err(ProbeError::Unsupported(
                "no managed identity status".to_string(),
            )),
            join_status_delay: Duration::ZERO,
            physical_cores: Ok(4),
            logical_cores: Ok(8),
            cpu_usage: Ok(vec![12.5, 3.0, 0.0, 55.5, 7.25, 1.0, 0.5, 99.0]),
            cpu_stall: Duration::ZERO,
            minimum_sample_interval: Duration::ZERO,
            memory: Ok(MemoryTotals {
                total_bytes: 16 * GIB,
                available_bytes: 9 * GIB,
            }),
        }
    }

    /// A host where no OS facility answers at all
    pub fn unreachable() -> Self {
        let down = |what: &str| ProbeError::Unavailable(format!("{what} unreachable"));
        Self {
            platform: "simulated".to_string(),
            domain_services: false,
            hostname: Err(down("hostname")),
            interfaces: Err(down("network stack")),
            volumes: Err(down("volume table")),
            domain: Err(down("domain service")),
            join_status: Err(down("identity status")),
            join_status_delay: Duration::ZERO,
            physical_cores: Err(down("cpu topology")),
            logical_cores: Err(down("cpu topology")),
            cpu_usage: Err(down("cpu counters")),
            cpu_stall: Duration::ZERO,
            minimum_sample_interval: Duration::ZERO,
            memory: Err(down("memory counters")),
        }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn with_hostname(mut self, hostname: Result<String, ProbeError>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn with_interfaces(
        mut self,
        interfaces: Result<Vec<InterfaceDescriptor>, ProbeError>,
    ) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Replace the volume table with an empty one
    pub fn without_volumes(mut self) -> Self {
        self.volumes = Ok(Vec::new());
        self
    }

    /// Append a volume whose usage query answers with `usage`
    pub fn with_volume(
        mut self,
        descriptor: VolumeDescriptor,
        usage: Result<VolumeUsage, ProbeError>,
    ) -> Self {
        let mut volumes =
            std::mem::replace(&mut self.volumes, Ok(Vec::new())).unwrap_or_default();
        volumes.push(SimulatedVolume { descriptor, usage });
        self.volumes = Ok(volumes);
        self
    }

    /// Make volume enumeration itself fail
    pub fn with_volume_table_error(mut self, err: ProbeError) -> Self {
        self.volumes = Err(err);
        self
    }

    /// Expose domain services answering with `domain`
    pub fn with_domain(mut self, domain: Result<DomainDescriptor, ProbeError>) -> Self {
        self.domain_services = true;
        self.domain = domain;
        self
    }

    pub fn with_join_status(mut self, status: Result<String, ProbeError>) -> Self {
        self.join_status = status;
        self
    }

    /// Delay the join status answer, ignoring the requested timeout
    pub fn with_join_status_delay(mut self, delay: Duration) -> Self {
        self.join_status_delay = delay;
        self
    }

    pub fn with_core_counts(
        mut self,
        physical: Result<usize, ProbeError>,
        logical: Result<usize, ProbeError>,
    ) -> Self {
        self.physical_cores = physical;
        self.logical_cores = logical;
        self
    }

    pub fn with_cpu_usage(mut self, usage: Result<Vec<f32>, ProbeError>) -> Self {
        self.cpu_usage = usage;
        self
    }

    /// Keep the CPU sample running for `stall` past its interval
    pub fn with_cpu_stall(mut self, stall: Duration) -> Self {
        self.cpu_stall = stall;
        self
    }

    /// Refuse CPU sample windows shorter than `minimum`, like real counters do
    pub fn with_minimum_sample_interval(mut self, minimum: Duration) -> Self {
        self.minimum_sample_interval = minimum;
        self
    }

    pub fn with_memory(mut self, memory: Result<MemoryTotals, ProbeError>) -> Self {
        self.memory = memory;
        self
    }
}

#[async_trait]
impl PlatformProbe for SimulatedPlatformProbe {
    fn platform_name(&self) -> String {
        self.platform.clone()
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            domain_services: self.domain_services,
            minimum_sample_interval: self.minimum_sample_interval,
        }
    }

    async fn query_hostname(&self) -> Result<String, ProbeError> {
        self.hostname.clone()
    }

    async fn query_network_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, ProbeError> {
        self.interfaces.clone()
    }

    async fn query_volumes(&self) -> Result<Vec<VolumeDescriptor>, ProbeError> {
        self.volumes
            .clone()
            .map(|volumes| volumes.into_iter().map(|v| v.descriptor).collect())
    }

    async fn query_volume_usage(
        &self,
        volume: &VolumeDescriptor,
    ) -> Result<VolumeUsage, ProbeError> {
        let volumes = self.volumes.as_ref().map_err(|e| e.clone())?;
        volumes
            .iter()
            .find(|v| v.descriptor == *volume)
            .map(|v| v.usage.clone())
            .unwrap_or_else(|| {
                Err(ProbeError::Transient(format!(
                    "{} is no longer mounted",
                    volume.mount_point
                )))
            })
    }

    async fn query_domain_info(&self) -> Result<DomainDescriptor, ProbeError> {
        if !self.domain_services {
            return Err(ProbeError::Unsupported(format!(
                "no domain service on {}",
                self.platform
            )));
        }
        self.domain.clone()
    }

    async fn query_managed_identity_status(
        &self,
        _timeout: Duration,
    ) -> Result<String, ProbeError> {
        if !self.join_status_delay.is_zero() {
            tokio::time::sleep(self.join_status_delay).await;
        }
        self.join_status.clone()
    }

    async fn query_physical_cores(&self) -> Result<usize, ProbeError> {
        self.physical_cores.clone()
    }

    async fn query_logical_cores(&self) -> Result<usize, ProbeError> {
        self.logical_cores.clone()
    }

    async fn query_cpu_usage(&self, sample_interval: Duration) -> Result<Vec<f32>, ProbeError> {
        let window = sample_interval.max(self.minimum_sample_interval);
        tokio::time::sleep(window + self.cpu_stall).await;
        self.cpu_usage.clone()
    }

    async fn query_memory(&self) -> Result<MemoryTotals, ProbeError> {
        self.memory.clone()
    }
}
