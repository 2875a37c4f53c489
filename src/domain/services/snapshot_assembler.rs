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

use super::{HardwareCollector, IdentityCollector, NetworkCollector, StorageCollector};
use crate::domain::{Collected, CollectionConfig, CollectionError, FailureReason, SectionKind, Snapshot};
use crate::ports::{PlatformProbe, SnapshotService};
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::task::JoinError;

/// Domain service that assembles a snapshot from the four collectors
///
/// Collectors run as independent tasks and each writes only its own
/// section, so the merge is a plain join-then-construct. A collector that
/// panics is recorded as an unavailable section like any other failure.
pub struct SnapshotAssembler {
    probe: Arc<dyn PlatformProbe>,
    network: Arc<NetworkCollector>,
    identity: Arc<IdentityCollector>,
    storage: Arc<StorageCollector>,
    hardware: Arc<HardwareCollector>,
}

impl SnapshotAssembler {
    /// Create a new assembler over a platform probe
    ///
    /// # Arguments
    /// * `probe` - Platform-specific (or simulated) probe shared by all collectors
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self {
            network: Arc::new(NetworkCollector::new(probe.clone())),
            identity: Arc::new(IdentityCollector::new(probe.clone())),
            storage: Arc::new(StorageCollector::new(probe.clone())),
            hardware: Arc::new(HardwareCollector::new(probe.clone())),
            probe,
        }
    }
}

fn joined<T>(section: SectionKind, result: Result<Collected<T>, JoinError>) -> Collected<T> {
    result.unwrap_or_else(|e| {
        error!("The {section} collector did not complete: {e}");
        Collected::Unavailable(CollectionError::new(
            section,
            FailureReason::ProbeUnavailable,
            format!("collector aborted: {e}"),
        ))
    })
}

#[async_trait]
impl SnapshotService for SnapshotAssembler {
    async fn collect(&self, config: &CollectionConfig) -> Snapshot {
        let started = Instant::now();
        let collected_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let network = self.network.clone();
        let hint = config.primary_interface_hint.clone();
        let network_task = tokio::spawn(async move { network.collect(hint.as_deref()).await });

        let identity = self.identity.clone();
        let status_timeout = config.domain_status_timeout;
        let identity_task = tokio::spawn(async move { identity.collect(status_timeout).await });

        let storage = self.storage.clone();
        let storage_task = tokio::spawn(async move { storage.collect().await });

        let hardware = self.hardware.clone();
        let (interval, ceiling) = (config.sample_interval, config.sample_ceiling);
        let hardware_task =
            tokio::spawn(async move { hardware.collect(interval, ceiling).await });

        let (network, identity, storage, hardware) =
            tokio::join!(network_task, identity_task, storage_task, hardware_task);

        let snapshot = Snapshot::new(
            self.probe.platform_name(),
            collected_at_unix_ms,
            started.elapsed().as_millis() as u64,
            joined(SectionKind::Network, network),
            joined(SectionKind::Identity, identity),
            joined(SectionKind::Storage, storage),
            joined(SectionKind::Hardware, hardware),
        );

        let failures = snapshot.failures();
        if failures.is_empty() {
            info!("Snapshot complete in {} ms", snapshot.elapsed_ms());
        } else {
            for failure in &failures {
                warn!("Section unavailable: {failure}");
            }
            info!(
                "Snapshot finished in {} ms with {} unavailable section(s)",
                snapshot.elapsed_ms(),
                failures.len()
            );
        }

        snapshot
    }

    fn platform_name(&self) -> String {
        self.probe.platform_name()
    }
}
