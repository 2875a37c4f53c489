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

//! Collector services, one per snapshot section, and the assembler

pub mod hardware_collector;
pub mod identity_collector;
pub mod network_collector;
pub mod snapshot_assembler;
pub mod storage_collector;

pub use hardware_collector::HardwareCollector;
pub use identity_collector::IdentityCollector;
pub use network_collector::{select_primary, NetworkCollector};
pub use snapshot_assembler::SnapshotAssembler;
pub use storage_collector::StorageCollector;
