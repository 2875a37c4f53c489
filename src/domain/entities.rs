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

use crate::domain::{CollectionError, ConfigError};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Either a collected value or the reason it could not be collected
///
/// Used for whole snapshot sections and for fields that are queried
/// independently of their siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Collected<T> {
    Value(T),
    Unavailable(CollectionError),
}

impl<T> Collected<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Collected::Value(value) => Some(value),
            Collected::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CollectionError> {
        match self {
            Collected::Value(_) => None,
            Collected::Unavailable(err) => Some(err),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Collected::Value(_))
    }
}

/// Represents one complete collection pass (root aggregate)
///
/// Sections are fixed at assembly; the snapshot only exposes read access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    platform: String,
    collected_at_unix_ms: u64,
    elapsed_ms: u64,
    network: Collected<NetworkFacts>,
    identity: Collected<IdentityFacts>,
    storage: Collected<StorageFacts>,
    hardware: Collected<HardwareFacts>,
}

impl Snapshot {
    pub(crate) fn new(
        platform: String,
        collected_at_unix_ms: u64,
        elapsed_ms: u64,
        network: Collected<NetworkFacts>,
        identity: Collected<IdentityFacts>,
        storage: Collected<StorageFacts>,
        hardware: Collected<HardwareFacts>,
    ) -> Self {
        Self {
            platform,
            collected_at_unix_ms,
            elapsed_ms,
            network,
            identity,
            storage,
            hardware,
        }
    }

    /// Operating system the snapshot was taken on
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Wall clock time the collection pass started, in ms since the epoch
    pub fn collected_at_unix_ms(&self) -> u64 {
        self.collected_at_unix_ms
    }

    /// How long the collection pass took
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn network(&self) -> &Collected<NetworkFacts> {
        &self.network
    }

    pub fn identity(&self) -> &Collected<IdentityFacts> {
        &self.identity
    }

    pub fn storage(&self) -> &Collected<StorageFacts> {
        &self.storage
    }

    pub fn hardware(&self) -> &Collected<HardwareFacts> {
        &self.hardware
    }

    /// Section-level failures, in section order
    pub fn failures(&self) -> Vec<&CollectionError> {
        [
            self.network.error(),
            self.identity.error(),
            self.storage.error(),
            self.hardware.error(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// True when every section carries a value
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}

/// One IP network assigned to an interface, as the OS reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub address: IpAddr,
    /// Network prefix length in bits
    pub prefix: u8,
}

/// Raw network interface as enumerated by the probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub addresses: Vec<InterfaceAddress>,
}

impl InterfaceDescriptor {
    pub fn new(name: &str, addresses: Vec<InterfaceAddress>) -> Self {
        Self {
            name: name.to_string(),
            addresses,
        }
    }

    /// Loopback by name, or because every assigned address is loopback
    pub fn is_loopback(&self) -> bool {
        let lower = self.name.to_lowercase();
        if lower == "lo" || lower.starts_with("lo0") || lower.contains("loopback") {
            return true;
        }
        !self.addresses.is_empty() && self.addresses.iter().all(|a| a.address.is_loopback())
    }
}

/// How the primary interface was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Named by the configured primary interface hint
    Hint,
    /// First non-loopback interface carrying an address
    FirstAddressed,
}

/// Address and mask of the selected interface, always together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAssignment {
    pub address: IpAddr,
    pub prefix: u8,
    pub netmask: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryInterface {
    pub name: String,
    pub selected_by: SelectionMethod,
    pub address: Option<AddressAssignment>,
}

/// Network section of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFacts {
    pub hostname: Collected<String>,
    /// `None` when no interface qualifies (e.g. an offline host)
    pub primary: Option<PrimaryInterface>,
    /// Every interface the probe enumerated
    pub interfaces: Vec<InterfaceDescriptor>,
}

/// Domain membership as the platform's domain service reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDescriptor {
    pub domain: Option<String>,
    pub workgroup: Option<String>,
    pub part_of_domain: Option<bool>,
}

/// Tri-state managed identity (cloud directory) join status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinState {
    Yes,
    No,
    Unknown,
}

impl JoinState {
    pub fn display_name(&self) -> &'static str {
        match self {
            JoinState::Yes => "Yes",
            JoinState::No => "No",
            JoinState::Unknown => "Unknown",
        }
    }
}

/// Identity section of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityFacts {
    pub domain: Option<String>,
    pub workgroup: Option<String>,
    pub part_of_domain: Option<bool>,
    pub managed_identity_joined: JoinState,
    /// Why domain, workgroup and membership are all unset
    pub domain_error: Option<CollectionError>,
    /// Why the join check could not produce a yes/no answer
    pub join_check_error: Option<CollectionError>,
}

/// Mounted volume as enumerated by the probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Device identifier (e.g. `/dev/sda1`, `C:`)
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub removable: bool,
}

/// Usage figures returned by the OS usage call for one volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeFacts {
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub removable: bool,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub percent: f64,
}

impl VolumeFacts {
    pub fn from_parts(volume: VolumeDescriptor, usage: VolumeUsage) -> Self {
        Self {
            device: volume.device,
            mount_point: volume.mount_point,
            file_system: volume.file_system,
            removable: volume.removable,
            total_bytes: usage.total_bytes,
            used_bytes: usage.used_bytes,
            free_bytes: usage.free_bytes,
            percent: usage.percent,
        }
    }
}

/// A volume that was enumerated but could not be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedVolume {
    pub device: String,
    pub mount_point: String,
    pub error: CollectionError,
}

/// Storage section of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageFacts {
    /// Readable volumes, in the order the OS enumerated them
    pub volumes: Vec<VolumeFacts>,
    pub skipped: Vec<SkippedVolume>,
}

impl StorageFacts {
    /// Look up a volume by device identifier
    pub fn volume(&self, device: &str) -> Option<&VolumeFacts> {
        self.volumes.iter().find(|v| v.device == device)
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Volumes the probe reported, readable or not
    pub fn enumerated_count(&self) -> usize {
        self.volumes.len() + self.skipped.len()
    }
}

/// Memory totals in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTotals {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Hardware section of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareFacts {
    pub physical_cores: Collected<usize>,
    pub logical_cores: Collected<usize>,
    /// Utilization percentage per logical core over the sample window
    pub per_core_utilization: Collected<Vec<f32>>,
    pub sample_interval_ms: u64,
    pub memory: Collected<MemoryTotals>,
}

/// Facilities a platform exposes beyond the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// Classic domain/workgroup membership service is present
    pub domain_services: bool,
    /// Shortest CPU sample window the platform counters can resolve
    pub minimum_sample_interval: Duration,
}

/// Options for a collection pass
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    /// Length of the CPU utilization sample window
    pub sample_interval: Duration,
    /// Ceiling above which CPU sampling is recorded as timed out
    pub sample_ceiling: Duration,
    /// Interface to prefer as primary, by name
    pub primary_interface_hint: Option<String>,
    /// Bound for the external managed identity status check
    pub domain_status_timeout: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            sample_ceiling: Duration::from_secs(5),
            primary_interface_hint: None,
            domain_status_timeout: Duration::from_secs(10),
        }
    }
}

impl CollectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sample interval must be greater than zero".to_string(),
            ));
        }
        if self.sample_interval > self.sample_ceiling {
            return Err(ConfigError::Invalid(format!(
                "sample interval {:?} exceeds sample ceiling {:?}",
                self.sample_interval, self.sample_ceiling
            )));
        }
        if self.domain_status_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "domain status timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureReason, SectionKind};
    use std::net::Ipv4Addr;

    fn unavailable<T>(section: SectionKind) -> Collected<T> {
        Collected::Unavailable(CollectionError::new(
            section,
            FailureReason::ProbeUnavailable,
            "test",
        ))
    }

    #[test]
    fn test_loopback_detection() {
        let lo = InterfaceDescriptor::new(
            "lo",
            vec![InterfaceAddress {
                address: IpAddr::V4(Ipv4Addr::LOCALHOST),
                prefix: 8,
            }],
        );
        assert!(lo.is_loopback());

        let windows_lo = InterfaceDescriptor::new("Loopback Pseudo-Interface 1", vec![]);
        assert!(windows_lo.is_loopback());

        let eth = InterfaceDescriptor::new(
            "eth0",
            vec![InterfaceAddress {
                address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                prefix: 24,
            }],
        );
        assert!(!eth.is_loopback());

        // An interface without addresses is not loopback just by being empty
        assert!(!InterfaceDescriptor::new("eth1", vec![]).is_loopback());
    }

    #[test]
    fn test_snapshot_failures() {
        let snapshot = Snapshot::new(
            "linux".to_string(),
            0,
            0,
            unavailable(SectionKind::Network),
            unavailable(SectionKind::Identity),
            Collected::Value(StorageFacts::default()),
            unavailable(SectionKind::Hardware),
        );

        let sections: Vec<SectionKind> = snapshot.failures().iter().map(|e| e.section).collect();
        assert_eq!(
            sections,
            vec![SectionKind::Network, SectionKind::Identity, SectionKind::Hardware]
        );
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn test_storage_counts() {
        let facts = StorageFacts {
            volumes: vec![VolumeFacts {
                device: "/dev/sda1".to_string(),
                mount_point: "/".to_string(),
                file_system: "ext4".to_string(),
                removable: false,
                total_bytes: 100,
                used_bytes: 40,
                free_bytes: 60,
                percent: 40.0,
            }],
            skipped: vec![SkippedVolume {
                device: "/dev/sdb1".to_string(),
                mount_point: "/media/usb".to_string(),
                error: CollectionError::new(SectionKind::Storage, FailureReason::Transient, "gone"),
            }],
        };

        assert_eq!(facts.skipped_count(), 1);
        assert_eq!(facts.enumerated_count(), 2);
        assert!(facts.volume("/dev/sda1").is_some());
        assert!(facts.volume("/dev/sdb1").is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CollectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_interval_above_ceiling() {
        let config = CollectionConfig {
            sample_interval: Duration::from_secs(10),
            sample_ceiling: Duration::from_secs(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectionConfig {
            sample_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_collected_serializes_with_status_tag() {
        let value: Collected<usize> = Collected::Value(8);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["status"], "value");
        assert_eq!(json["data"], 8);

        let missing: Collected<usize> = unavailable(SectionKind::Hardware);
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["data"]["reason"], "probe_unavailable");
    }
}
