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

//! Report renderers
//!
//! Human-readable renderers share one section model built here, so every
//! renderer marks unavailable sections and fields the same way.

pub mod html;
pub mod structured;
pub mod text;

pub use html::HtmlRenderer;
pub use structured::{JsonRenderer, TomlRenderer};
pub use text::TextRenderer;

use crate::domain::parsers::bytes_to_gib;
use crate::domain::{
    Collected, CollectionError, HardwareFacts, IdentityFacts, NetworkFacts, Snapshot,
    StorageFacts,
};

/// One labelled line of a report, possibly with nested lines
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportItem {
    pub label: String,
    pub value: String,
    pub children: Vec<ReportItem>,
}

impl ReportItem {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    fn with_children(mut self, children: Vec<ReportItem>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReportBody {
    Items(Vec<ReportItem>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportSection {
    pub title: &'static str,
    pub body: ReportBody,
}

fn unknown(err: &CollectionError) -> String {
    if err.detail.is_empty() {
        format!("unknown ({})", err.reason)
    } else {
        format!("unknown ({}: {})", err.reason, err.detail)
    }
}

fn fact<T>(collected: &Collected<T>, show: impl Fn(&T) -> String) -> String {
    match collected {
        Collected::Value(value) => show(value),
        Collected::Unavailable(err) => unknown(err),
    }
}

fn gib(bytes: u64) -> String {
    format!("{:.2}", bytes_to_gib(bytes))
}

fn section<T>(
    title: &'static str,
    collected: &Collected<T>,
    items: impl Fn(&T) -> Vec<ReportItem>,
) -> ReportSection {
    let body = match collected {
        Collected::Value(value) => ReportBody::Items(items(value)),
        Collected::Unavailable(err) => ReportBody::Unavailable(unknown(err)),
    };
    ReportSection { title, body }
}

fn network_items(facts: &NetworkFacts) -> Vec<ReportItem> {
    const NO_CANDIDATE: &str = "none (no interface with an assigned address)";

    let mut items = vec![ReportItem::new("Hostname", fact(&facts.hostname, String::clone))];
    match &facts.primary {
        Some(primary) => {
            items.push(ReportItem::new("Primary Interface", primary.name.clone()));
            match &primary.address {
                Some(assignment) => {
                    items.push(ReportItem::new("IP Address", assignment.address.to_string()));
                    items.push(ReportItem::new("Subnet Mask", assignment.netmask.to_string()));
                }
                None => {
                    items.push(ReportItem::new("IP Address", "none (no address assigned)"));
                    items.push(ReportItem::new("Subnet Mask", "none (no address assigned)"));
                }
            }
        }
        None => {
            items.push(ReportItem::new("Primary Interface", NO_CANDIDATE));
            items.push(ReportItem::new("IP Address", NO_CANDIDATE));
            items.push(ReportItem::new("Subnet Mask", NO_CANDIDATE));
        }
    }

    let interfaces = facts
        .interfaces
        .iter()
        .map(|iface| {
            let addresses = if iface.addresses.is_empty() {
                "no addresses".to_string()
            } else {
                iface
                    .addresses
                    .iter()
                    .map(|a| format!("{}/{}", a.address, a.prefix))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            ReportItem::new(&iface.name, addresses)
        })
        .collect();
    items.push(
        ReportItem::new("Interfaces", facts.interfaces.len().to_string())
            .with_children(interfaces),
    );
    items
}

fn identity_items(facts: &IdentityFacts) -> Vec<ReportItem> {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "not set".to_string());
    let joined = match &facts.join_check_error {
        Some(err) => format!("{} ({})", facts.managed_identity_joined.display_name(), err),
        None => facts.managed_identity_joined.display_name().to_string(),
    };

    if let Some(err) = &facts.domain_error {
        return vec![
            ReportItem::new("Domain", unknown(err)),
            ReportItem::new("Workgroup", unknown(err)),
            ReportItem::new("Part Of Domain", unknown(err)),
            ReportItem::new("Azure AD Joined", joined),
        ];
    }

    vec![
        ReportItem::new("Domain", text(&facts.domain)),
        ReportItem::new("Workgroup", text(&facts.workgroup)),
        ReportItem::new(
            "Part Of Domain",
            match facts.part_of_domain {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "Unknown",
            },
        ),
        ReportItem::new("Azure AD Joined", joined),
    ]
}

fn storage_items(facts: &StorageFacts) -> Vec<ReportItem> {
    let mut items: Vec<ReportItem> = facts
        .volumes
        .iter()
        .map(|volume| {
            ReportItem::new(&volume.device, format!("mounted on {}", volume.mount_point))
                .with_children(vec![
                    ReportItem::new("File System", volume.file_system.clone()),
                    ReportItem::new("Total Size (GB)", gib(volume.total_bytes)),
                    ReportItem::new("Used Space (GB)", gib(volume.used_bytes)),
                    ReportItem::new("Free Space (GB)", gib(volume.free_bytes)),
                    ReportItem::new("Usage Percentage", format!("{}", volume.percent)),
                ])
        })
        .collect();

    if !facts.skipped.is_empty() {
        let skipped = facts
            .skipped
            .iter()
            .map(|s| ReportItem::new(&s.device, unknown(&s.error)))
            .collect();
        items.push(
            ReportItem::new("Skipped Volumes", facts.skipped_count().to_string())
                .with_children(skipped),
        );
    }
    if items.is_empty() {
        items.push(ReportItem::new("Volumes", "none mounted"));
    }
    items
}

fn hardware_items(facts: &HardwareFacts) -> Vec<ReportItem> {
    vec![
        ReportItem::new("CPU Cores", fact(&facts.physical_cores, usize::to_string)),
        ReportItem::new("Logical CPUs", fact(&facts.logical_cores, usize::to_string)),
        ReportItem::new(
            "CPU Usage (%)",
            fact(&facts.per_core_utilization, |usage| {
                let cores: Vec<String> = usage.iter().map(|u| format!("{u:.1}")).collect();
                format!("[{}]", cores.join(", "))
            }),
        ),
        ReportItem::new("Sample Window (ms)", facts.sample_interval_ms.to_string()),
        ReportItem::new(
            "Total Memory (GB)",
            fact(&facts.memory, |m| gib(m.total_bytes)),
        ),
        ReportItem::new(
            "Available Memory (GB)",
            fact(&facts.memory, |m| gib(m.available_bytes)),
        ),
    ]
}

/// Build the renderer-neutral section model for a snapshot
pub(crate) fn build_sections(snapshot: &Snapshot) -> Vec<ReportSection> {
    vec![
        section("Network Info", snapshot.network(), network_items),
        section("Domain Info", snapshot.identity(), identity_items),
        section("Storage Info", snapshot.storage(), storage_items),
        section("Hardware Info", snapshot.hardware(), hardware_items),
    ]
}


#[cfg(test)]
mod tests {
    use super::test_support::snapshot_of;
    use super::*;
    use crate::adapters::SimulatedPlatformProbe;
    use crate::domain::ProbeError;

    fn find<'a>(sections: &'a [ReportSection], title: &str) -> &'a ReportSection {
        sections.iter().find(|s| s.title == title).unwrap()
    }

    fn value_of<'a>(section: &'a ReportSection, label: &str) -> &'a str {
        match &section.body {
            ReportBody::Items(items) => &items.iter().find(|i| i.label == label).unwrap().value,
            ReportBody::Unavailable(reason) => panic!("section unavailable: {reason}"),
        }
    }

    #[tokio::test]
    async fn test_sections_for_healthy_host() {
        let sections = build_sections(&snapshot_of(SimulatedPlatformProbe::new()).await);
        assert_eq!(sections.len(), 4);

        let network = find(&sections, "Network Info");
        assert_eq!(value_of(network, "Hostname"), "sim-host");
        assert_eq!(value_of(network, "IP Address"), "10.0.0.5");
        assert_eq!(value_of(network, "Subnet Mask"), "255.255.255.0");

        let hardware = find(&sections, "Hardware Info");
        assert_eq!(value_of(hardware, "CPU Cores"), "4");
        assert_eq!(value_of(hardware, "Total Memory (GB)"), "16.00");

        let domain = find(&sections, "Domain Info");
        match &domain.body {
            ReportBody::Unavailable(reason) => {
                assert!(reason.contains("not supported on this platform"))
            }
            ReportBody::Items(_) => panic!("identity should be unavailable"),
        }
    }

    #[tokio::test]
    async fn test_no_candidate_interface_is_explicit() {
        let probe = SimulatedPlatformProbe::new().with_interfaces(Ok(vec![]));
        let sections = build_sections(&snapshot_of(probe).await);

        let network = find(&sections, "Network Info");
        assert!(value_of(network, "IP Address").starts_with("none"));
        assert!(value_of(network, "Subnet Mask").starts_with("none"));
    }

    #[tokio::test]
    async fn test_failed_domain_query_marks_domain_fields() {
        let probe = SimulatedPlatformProbe::new()
            .with_domain(Err(ProbeError::Timeout("CIM query".to_string())))
            .with_join_status(Ok("AzureAdJoined : NO".to_string()));
        let sections = build_sections(&snapshot_of(probe).await);

        let domain = find(&sections, "Domain Info");
        assert!(value_of(domain, "Domain").starts_with("unknown (timed out"));
        assert!(value_of(domain, "Domain").contains("CIM query"));
        assert!(value_of(domain, "Part Of Domain").starts_with("unknown (timed out"));
        assert_eq!(value_of(domain, "Azure AD Joined"), "No");
    }

    #[tokio::test]
    async fn test_every_section_marked_on_unreachable_host() {
        let sections = build_sections(&snapshot_of(SimulatedPlatformProbe::unreachable()).await);
        assert!(sections
            .iter()
            .all(|s| matches!(&s.body, ReportBody::Unavailable(reason) if reason.starts_with("unknown"))));
    }
}
