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

use crate::domain::parsers::{preferred_address, to_assignment};
use crate::domain::{
    Collected, CollectionError, InterfaceDescriptor, NetworkFacts, PrimaryInterface,
    SectionKind, SelectionMethod,
};
use crate::ports::PlatformProbe;
use log::{debug, info, warn};
use std::sync::Arc;

/// Select the primary interface from an enumerated list
///
/// Total over any input: an interface named by `hint` wins, otherwise the
/// first non-loopback interface with an assigned address, otherwise none.
/// A hinted interface is selected even without an address, in which case
/// address and mask are both absent.
pub fn select_primary(
    interfaces: &[InterfaceDescriptor],
    hint: Option<&str>,
) -> Option<PrimaryInterface> {
    if let Some(hint) = hint {
        match interfaces.iter().find(|iface| iface.name == hint) {
            Some(iface) => {
                debug!("Using hinted primary interface {}", iface.name);
                return Some(PrimaryInterface {
                    name: iface.name.clone(),
                    selected_by: SelectionMethod::Hint,
                    address: preferred_address(&iface.addresses).map(to_assignment),
                });
            }
            None => warn!("Primary interface hint '{hint}' matches no interface, falling back"),
        }
    }

    interfaces
        .iter()
        .filter(|iface| !iface.is_loopback())
        .find_map(|iface| {
            preferred_address(&iface.addresses).map(|address| PrimaryInterface {
                name: iface.name.clone(),
                selected_by: SelectionMethod::FirstAddressed,
                address: Some(to_assignment(address)),
            })
        })
}

/// Collects the network section
pub struct NetworkCollector {
    probe: Arc<dyn PlatformProbe>,
}

impl NetworkCollector {
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self { probe }
    }

    pub async fn collect(&self, hint: Option<&str>) -> Collected<NetworkFacts> {
        let (hostname_result, interfaces_result) = tokio::join!(
            self.probe.query_hostname(),
            self.probe.query_network_interfaces(),
        );

        let interfaces = match interfaces_result {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!("Network interface enumeration failed: {e}");
                return Collected::Unavailable(CollectionError::from_probe(SectionKind::Network, &e));
            }
        };

        let hostname = match hostname_result {
            Ok(name) => Collected::Value(name),
            Err(e) => {
                warn!("Hostname lookup failed: {e}");
                Collected::Unavailable(CollectionError::from_probe(SectionKind::Network, &e))
            }
        };

        let primary = select_primary(&interfaces, hint);
        match &primary {
            Some(p) => info!("Primary interface: {}", p.name),
            None => info!(
                "No primary interface candidate among {} interface(s)",
                interfaces.len()
            ),
        }

        Collected::Value(NetworkFacts {
            hostname,
            primary,
            interfaces,
        })
    }
}
