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

use crate::domain::{CollectionConfig, Snapshot};
use async_trait::async_trait;

/// Primary port - Main interface offered by the collection domain
///
/// This is what external systems (CLI, renderers, library consumers) use
/// to take a snapshot of the local host.
#[async_trait]
pub trait SnapshotService: Send + Sync {
    /// Take one snapshot of the local host
    ///
    /// Never fails: sections that cannot be collected are recorded as
    /// unavailable with a reason.
    ///
    /// # Arguments
    /// * `config` - Options for this collection pass
    async fn collect(&self, config: &CollectionConfig) -> Snapshot;

    /// Name of the platform being collected from
    fn platform_name(&self) -> String;
}
