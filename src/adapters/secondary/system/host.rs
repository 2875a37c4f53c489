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

//! Host platform probe backed by sysinfo and the OS volume usage call

use super::windows::WindowsDomainServices;
use crate::domain::{
    DomainDescriptor, InterfaceAddress, InterfaceDescriptor, MemoryTotals, PlatformCapabilities,
    ProbeError, VolumeDescriptor, VolumeUsage,
};
use crate::ports::{CommandExecutor, PlatformProbe};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System,
    MINIMUM_CPU_UPDATE_INTERVAL,
};

/// Percentage of user-visible capacity in use, rounded to one decimal
///
/// Matches the usual `df` convention: reserved blocks count neither as
/// used nor as free. Zero-capacity volumes report 0.
pub fn usage_percent(used_bytes: u64, free_bytes: u64) -> f64 {
    let visible = used_bytes as f64 + free_bytes as f64;
    if visible <= 0.0 {
        return 0.0;
    }
    (used_bytes as f64 / visible * 1000.0).round() / 10.0
}

/// Run a blocking OS read off the async runtime
async fn blocking<T, F>(what: &str, f: F) -> Result<T, ProbeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProbeError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProbeError::Unavailable(format!("{what} query aborted: {e}")))?
}

#[cfg(unix)]
fn volume_usage(mount_point: &str) -> Result<VolumeUsage, ProbeError> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let path = CString::new(mount_point).map_err(|_| {
        ProbeError::Unavailable(format!("mount point {mount_point:?} contains a NUL byte"))
    })?;

    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: `path` is NUL-terminated and `stat` points to writable storage
    // of the right type for the duration of the call.
    let rc = unsafe { libc::statvfs(path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Err(match err.raw_os_error() {
            Some(code) if code == libc::ENOTDIR || code == libc::ESTALE || code == libc::ENODEV => {
                ProbeError::Transient(format!("{mount_point}: {err}"))
            }
            _ => ProbeError::from_io(mount_point, &err),
        });
    }
    // SAFETY: statvfs succeeded, so it fully initialised the struct.
    let stat = unsafe { stat.assume_init() };

    let fragment = stat.f_frsize as u64;
    let total_bytes = (stat.f_blocks as u64).saturating_mul(fragment);
    let free_bytes = (stat.f_bavail as u64).saturating_mul(fragment);
    let used_bytes = (stat.f_blocks as u64)
        .saturating_sub(stat.f_bfree as u64)
        .saturating_mul(fragment);

    Ok(VolumeUsage {
        total_bytes,
        used_bytes,
        free_bytes,
        percent: usage_percent(used_bytes, free_bytes),
    })
}

#[cfg(not(unix))]
fn volume_usage(mount_point: &str) -> Result<VolumeUsage, ProbeError> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point().to_string_lossy() == mount_point)
        .ok_or_else(|| ProbeError::Transient(format!("{mount_point} is no longer mounted")))?;

    let total_bytes = disk.total_space();
    let free_bytes = disk.available_space();
    let used_bytes = total_bytes.saturating_sub(free_bytes);

    Ok(VolumeUsage {
        total_bytes,
        used_bytes,
        free_bytes,
        percent: usage_percent(used_bytes, free_bytes),
    })
}

/// Platform probe for the local host
///
/// Network, volume, CPU and memory facts come from sysinfo; per-volume
/// usage comes from `statvfs` on Unix. Domain services exist only on
/// Windows and are queried through external commands.
pub struct HostPlatformProbe {
    domain_services: WindowsDomainServices,
}

impl HostPlatformProbe {
    /// Create a new host probe
    ///
    /// # Arguments
    /// * `command_executor` - Executor for the external domain status commands
    pub fn new(command_executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            domain_services: WindowsDomainServices::new(command_executor),
        }
    }
}

#[async_trait]
impl PlatformProbe for HostPlatformProbe {
    fn platform_name(&self) -> String {
        System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string())
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            domain_services: cfg!(windows),
            minimum_sample_interval: MINIMUM_CPU_UPDATE_INTERVAL,
        }
    }

    async fn query_hostname(&self) -> Result<String, ProbeError> {
        System::host_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProbeError::Unavailable("hostname not reported by the OS".to_string()))
    }

    async fn query_network_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, ProbeError> {
        blocking("network interface", || {
            let networks = Networks::new_with_refreshed_list();
            let mut interfaces: Vec<InterfaceDescriptor> = networks
                .iter()
                .map(|(name, data)| {
                    let addresses = data
                        .ip_networks()
                        .iter()
                        .map(|net| InterfaceAddress {
                            address: net.addr,
                            prefix: net.prefix,
                        })
                        .collect();
                    InterfaceDescriptor::new(name, addresses)
                })
                .collect();
            // sysinfo keys interfaces by name in a hash map; sort for a stable "first"
            interfaces.sort_by(|a, b| a.name.cmp(&b.name));
            debug!("Enumerated {} network interface(s)", interfaces.len());
            Ok(interfaces)
        })
        .await
    }

    async fn query_volumes(&self) -> Result<Vec<VolumeDescriptor>, ProbeError> {
        blocking("volume", || {
            let disks = Disks::new_with_refreshed_list();
            let volumes: Vec<VolumeDescriptor> = disks
                .list()
                .iter()
                .map(|disk| VolumeDescriptor {
                    device: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    file_system: disk.file_system().to_string_lossy().to_string(),
                    removable: disk.is_removable(),
                })
                .collect();
            debug!("Enumerated {} volume(s)", volumes.len());
            Ok(volumes)
        })
        .await
    }

    async fn query_volume_usage(
        &self,
        volume: &VolumeDescriptor,
    ) -> Result<VolumeUsage, ProbeError> {
        let mount_point = volume.mount_point.clone();
        blocking("volume usage", move || volume_usage(&mount_point)).await
    }

    async fn query_domain_info(&self) -> Result<DomainDescriptor, ProbeError> {
        if !cfg!(windows) {
            return Err(ProbeError::Unsupported(format!(
                "no domain service on {}",
                std::env::consts::OS
            )));
        }
        self.domain_services.query_domain_info().await
    }

    async fn query_managed_identity_status(
        &self,
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        if !cfg!(windows) {
            return Err(ProbeError::Unsupported(format!(
                "no managed identity status on {}",
                std::env::consts::OS
            )));
        }
        self.domain_services.query_join_status(timeout).await
    }

    async fn query_physical_cores(&self) -> Result<usize, ProbeError> {
        let sys = System::new();
        sys.physical_core_count()
            .filter(|&count| count > 0)
            .ok_or_else(|| ProbeError::Unavailable("physical core count not reported".to_string()))
    }

    async fn query_logical_cores(&self) -> Result<usize, ProbeError> {
        let sys =
            System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
        match sys.cpus().len() {
            0 => Err(ProbeError::Unavailable(
                "logical core count not reported".to_string(),
            )),
            count => Ok(count),
        }
    }

    async fn query_cpu_usage(&self, sample_interval: Duration) -> Result<Vec<f32>, ProbeError> {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::new().with_cpu_usage()),
        );
        // sysinfo needs two reads at least MINIMUM_CPU_UPDATE_INTERVAL apart
        tokio::time::sleep(sample_interval.max(MINIMUM_CPU_UPDATE_INTERVAL)).await;
        sys.refresh_cpu_usage();

        let usage: Vec<f32> = sys.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
        if usage.is_empty() {
            return Err(ProbeError::Unavailable(
                "CPU usage counters not reported".to_string(),
            ));
        }
        Ok(usage)
    }

    async fn query_memory(&self) -> Result<MemoryTotals, ProbeError> {
        let sys = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
        );
        match sys.total_memory() {
            0 => Err(ProbeError::Unavailable(
                "memory totals not reported".to_string(),
            )),
            total_bytes => Ok(MemoryTotals {
                total_bytes,
                available_bytes: sys.available_memory(),
            }),
        }
    }
}
