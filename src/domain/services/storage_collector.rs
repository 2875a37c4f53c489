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
    Collected, CollectionError, SectionKind, SkippedVolume, StorageFacts, VolumeFacts,
};
use crate::ports::PlatformProbe;
use log::{info, warn};
use std::sync::Arc;

/// Collects the storage section
///
/// Volumes that cannot be read after enumeration (ejected media, a race
/// with unmount, permissions) are skipped and recorded, never fatal.
pub struct StorageCollector {
    probe: Arc<dyn PlatformProbe>,
}

impl StorageCollector {
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self { probe }
    }

    pub async fn collect(&self) -> Collected<StorageFacts> {
        let volumes = match self.probe.query_volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!("Volume enumeration failed: {e}");
                return Collected::Unavailable(CollectionError::from_probe(SectionKind::Storage, &e));
            }
        };

        let mut facts = StorageFacts::default();
        for volume in volumes {
            match self.probe.query_volume_usage(&volume).await {
                Ok(usage) => facts.volumes.push(VolumeFacts::from_parts(volume, usage)),
                Err(e) => {
                    warn!(
                        "Skipping volume {} at {}: {e}",
                        volume.device, volume.mount_point
                    );
                    facts.skipped.push(SkippedVolume {
                        device: volume.device,
                        mount_point: volume.mount_point,
                        error: CollectionError::from_probe(SectionKind::Storage, &e),
                    });
                }
            }
        }

        info!(
            "Storage: {} volume(s) read, {} skipped",
            facts.volumes.len(),
            facts.skipped_count()
        );
        Collected::Value(facts)
    }
}
