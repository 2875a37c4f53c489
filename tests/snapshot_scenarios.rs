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

//! End-to-end collection scenarios against a simulated host

use host_facts::adapters::{simulated_usage, simulated_volume};
use host_facts::domain::{
    DomainDescriptor, InterfaceDescriptor, JoinState, ProbeError, SelectionMethod,
};
use host_facts::{
    Collected, CollectionConfig, FailureReason, SectionKind, SimulatedPlatformProbe, Snapshot,
    SnapshotAssembler, SnapshotService,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const GIB: u64 = 1024 * 1024 * 1024;

fn config(sample_interval_ms: u64) -> CollectionConfig {
    CollectionConfig {
        sample_interval: Duration::from_millis(sample_interval_ms),
        ..Default::default()
    }
}

async fn collect(probe: SimulatedPlatformProbe, config: &CollectionConfig) -> Snapshot {
    SnapshotAssembler::new(Arc::new(probe)).collect(config).await
}

fn domain_host() -> SimulatedPlatformProbe {
    SimulatedPlatformProbe::new()
        .with_platform("Windows 11 Pro")
        .with_domain(Ok(DomainDescriptor {
            domain: Some("corp.example.com".to_string()),
            workgroup: None,
            part_of_domain: Some(true),
        }))
        .with_join_status(Ok("AzureAdJoined : YES\nDomainJoined : YES\n".to_string()))
}

#[tokio::test]
async fn test_scenario_one_unreadable_volume_is_skipped() {
    let probe = SimulatedPlatformProbe::new()
        .without_volumes()
        .with_volume(simulated_volume("/dev/sda1", "/"), Ok(simulated_usage(100 * GIB, 40 * GIB)))
        .with_volume(
            simulated_volume("/dev/sdb1", "/media/usb"),
            Err(ProbeError::Transient("/media/usb was unmounted".to_string())),
        );

    let snapshot = collect(probe, &config(10)).await;
    let storage = snapshot.storage().value().expect("storage present");

    assert_eq!(storage.volumes.len(), 1);
    assert_eq!(storage.skipped_count(), 1);
    assert_eq!(storage.enumerated_count(), 2);
    assert_eq!(storage.skipped[0].device, "/dev/sdb1");
    assert_eq!(storage.skipped[0].error.reason, FailureReason::Transient);

    let root = storage.volume("/dev/sda1").expect("root volume");
    assert_eq!(root.total_bytes, 100 * GIB);
    assert_eq!(root.used_bytes + root.free_bytes, root.total_bytes);
    assert_eq!(root.percent, 40.0);
}

#[tokio::test]
async fn test_scenario_no_interfaces_has_no_primary() {
    let probe = SimulatedPlatformProbe::new().with_interfaces(Ok(vec![]));

    let snapshot = collect(probe, &config(10)).await;
    let network = snapshot.network().value().expect("network present");

    assert!(network.primary.is_none());
    assert!(network.interfaces.is_empty());
    assert_eq!(network.hostname.value().map(String::as_str), Some("sim-host"));
}

#[tokio::test]
async fn test_offline_host_has_no_address_or_mask() {
    let offline = || {
        Ok(vec![
            InterfaceDescriptor::new("eth0", vec![]),
            InterfaceDescriptor::new("wlan0", vec![]),
        ])
    };

    let probe = SimulatedPlatformProbe::new().with_interfaces(offline());
    let snapshot = collect(probe, &config(10)).await;
    let network = snapshot.network().value().expect("network present");
    assert!(network.primary.is_none());
    assert_eq!(network.interfaces.len(), 2);

    let hinted = CollectionConfig {
        primary_interface_hint: Some("wlan0".to_string()),
        ..config(10)
    };
    let probe = SimulatedPlatformProbe::new().with_interfaces(offline());
    let snapshot = collect(probe, &hinted).await;
    let primary = snapshot
        .network()
        .value()
        .and_then(|n| n.primary.clone())
        .expect("hinted interface");
    assert_eq!(primary.name, "wlan0");
    assert!(primary.address.is_none());
}

#[tokio::test]
async fn test_scenario_non_domain_platform() {
    let snapshot = collect(SimulatedPlatformProbe::new(), &config(10)).await;

    let err = snapshot.identity().error().expect("identity absent");
    assert_eq!(err.section, SectionKind::Identity);
    assert_eq!(err.reason, FailureReason::PlatformUnsupported);
    assert!(snapshot.storage().is_value());
    assert!(snapshot.hardware().is_value());
    assert!(snapshot.network().is_value());
}

#[tokio::test]
async fn test_unreachable_host_still_yields_snapshot() {
    let snapshot = collect(SimulatedPlatformProbe::unreachable(), &config(10)).await;

    let sections: Vec<SectionKind> = snapshot.failures().iter().map(|e| e.section).collect();
    assert_eq!(
        sections,
        vec![
            SectionKind::Network,
            SectionKind::Identity,
            SectionKind::Storage,
            SectionKind::Hardware,
        ]
    );
    assert!(!snapshot.is_complete());
}

#[tokio::test]
async fn test_each_section_is_value_or_error() {
    for probe in [
        SimulatedPlatformProbe::new(),
        SimulatedPlatformProbe::unreachable(),
        domain_host(),
    ] {
        let snapshot = collect(probe, &config(10)).await;
        assert!(snapshot.network().is_value() != snapshot.network().error().is_some());
        assert!(snapshot.identity().is_value() != snapshot.identity().error().is_some());
        assert!(snapshot.storage().is_value() != snapshot.storage().error().is_some());
        assert!(snapshot.hardware().is_value() != snapshot.hardware().error().is_some());
    }
}

#[tokio::test]
async fn test_domain_host_is_fully_collected() {
    let snapshot = collect(domain_host(), &config(10)).await;
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.platform(), "Windows 11 Pro");

    let identity = snapshot.identity().value().expect("identity present");
    assert_eq!(identity.domain.as_deref(), Some("corp.example.com"));
    assert_eq!(identity.part_of_domain, Some(true));
    assert_eq!(identity.managed_identity_joined, JoinState::Yes);
    assert!(identity.join_check_error.is_none());
}

#[tokio::test]
async fn test_failed_join_check_keeps_domain_values() {
    let probe = domain_host().with_join_status(Err(ProbeError::Unavailable(
        "dsregcmd not found".to_string(),
    )));

    let snapshot = collect(probe, &config(10)).await;
    let identity = snapshot.identity().value().expect("identity present");

    assert_eq!(identity.domain.as_deref(), Some("corp.example.com"));
    assert_eq!(identity.managed_identity_joined, JoinState::Unknown);
    assert_eq!(
        identity.join_check_error.as_ref().map(|e| e.reason),
        Some(FailureReason::ProbeUnavailable)
    );
}

#[tokio::test]
async fn test_hanging_join_check_is_bounded() {
    let probe = domain_host().with_join_status_delay(Duration::from_secs(5));
    let config = CollectionConfig {
        sample_interval: Duration::from_millis(10),
        domain_status_timeout: Duration::from_millis(100),
        ..Default::default()
    };

    let started = Instant::now();
    let snapshot = collect(probe, &config).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    let identity = snapshot.identity().value().expect("identity present");
    assert_eq!(identity.domain.as_deref(), Some("corp.example.com"));
    assert_eq!(identity.managed_identity_joined, JoinState::Unknown);
    assert_eq!(
        identity.join_check_error.as_ref().map(|e| e.reason),
        Some(FailureReason::Timeout)
    );
    assert!(snapshot.storage().is_value());
}

#[tokio::test]
async fn test_collection_latency_follows_sample_window() {
    let started = Instant::now();
    let snapshot = collect(SimulatedPlatformProbe::new(), &config(200)).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(700), "took {elapsed:?}");

    let hardware = snapshot.hardware().value().expect("hardware present");
    assert_eq!(hardware.sample_interval_ms, 200);
    assert_eq!(hardware.per_core_utilization.value().map(Vec::len), Some(8));
}

#[tokio::test]
async fn test_stalled_cpu_sample_times_out_at_ceiling() {
    let probe = SimulatedPlatformProbe::new().with_cpu_stall(Duration::from_secs(5));
    let config = CollectionConfig {
        sample_interval: Duration::from_millis(50),
        sample_ceiling: Duration::from_millis(150),
        ..Default::default()
    };

    let started = Instant::now();
    let snapshot = collect(probe, &config).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    let hardware = snapshot.hardware().value().expect("hardware present");
    assert_eq!(
        hardware.per_core_utilization.error().map(|e| e.reason),
        Some(FailureReason::Timeout)
    );
    assert_eq!(hardware.logical_cores, Collected::Value(8));
    assert!(hardware.memory.is_value());
}

#[tokio::test]
async fn test_unknown_physical_cores_keep_logical_count() {
    let probe = SimulatedPlatformProbe::new().with_core_counts(
        Err(ProbeError::Unsupported("no topology in this VM".to_string())),
        Ok(2),
    );

    let snapshot = collect(probe, &config(10)).await;
    let hardware = snapshot.hardware().value().expect("hardware present");

    assert!(hardware.physical_cores.error().is_some());
    assert_eq!(hardware.logical_cores, Collected::Value(2));
}

#[tokio::test]
async fn test_hint_selects_primary_interface() {
    let probe = SimulatedPlatformProbe::new();
    let config = CollectionConfig {
        sample_interval: Duration::from_millis(10),
        primary_interface_hint: Some("lo".to_string()),
        ..Default::default()
    };

    let snapshot = collect(probe, &config).await;
    let primary = snapshot
        .network()
        .value()
        .and_then(|n| n.primary.clone())
        .expect("primary interface");

    assert_eq!(primary.name, "lo");
    assert_eq!(primary.selected_by, SelectionMethod::Hint);
    assert_eq!(
        primary.address.map(|a| a.netmask.to_string()),
        Some("255.0.0.0".to_string())
    );
}
