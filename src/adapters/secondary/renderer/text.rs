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

use super::{build_sections, ReportBody, ReportItem};
use crate::domain::{RenderError, Snapshot};
use crate::ports::ReportRenderer;
use std::fmt::Write;

/// Plain text summary, used for terminal output
pub struct TextRenderer;

fn write_items(out: &mut String, items: &[ReportItem], depth: usize) {
    let indent = "  ".repeat(depth + 1);
    for item in items {
        let _ = writeln!(out, "{indent}{}: {}", item.label, item.value);
        write_items(out, &item.children, depth + 1);
    }
}

impl ReportRenderer for TextRenderer {
    fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError> {
        let mut out = String::new();
        let _ = writeln!(out, "System Information");
        let _ = writeln!(out, "==================");
        let _ = writeln!(out, "Platform: {}", snapshot.platform());
        let _ = writeln!(out, "Collected At (unix ms): {}", snapshot.collected_at_unix_ms());
        let _ = writeln!(out, "Collection Time (ms): {}", snapshot.elapsed_ms());

        for section in build_sections(snapshot) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", section.title);
            let _ = writeln!(out, "{}", "-".repeat(section.title.len()));
            match &section.body {
                ReportBody::Items(items) => write_items(&mut out, items, 0),
                ReportBody::Unavailable(reason) => {
                    let _ = writeln!(out, "  {reason}");
                }
            }
        }
        Ok(out)
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::snapshot_of;
    use super::*;
    use crate::adapters::{simulated_usage, simulated_volume, SimulatedPlatformProbe};
    use crate::domain::ProbeError;

    #[tokio::test]
    async fn test_text_report_lists_every_section() {
        let snapshot = snapshot_of(SimulatedPlatformProbe::new()).await;
        let text = TextRenderer.render(&snapshot).unwrap();

        for heading in ["Network Info", "Domain Info", "Storage Info", "Hardware Info"] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("  Hostname: sim-host"));
        assert!(text.contains("    Total Size (GB): 100.00"));
        assert!(text.contains("    Usage Percentage: 40"));
    }

    #[tokio::test]
    async fn test_text_report_marks_skipped_volume() {
        let probe = SimulatedPlatformProbe::new()
            .with_volume(
                simulated_volume("/dev/sdb1", "/media/usb"),
                Err(ProbeError::Transient("/media/usb vanished".to_string())),
            )
            .with_volume(simulated_volume("/dev/sdc1", "/data"), Ok(simulated_usage(1 << 30, 0)));
        let text = TextRenderer.render(&snapshot_of(probe).await).unwrap();

        assert!(text.contains("Skipped Volumes: 1"));
        assert!(text.contains("/dev/sdb1: unknown (changed during collection"));
        assert!(text.contains("/dev/sdc1: mounted on /data"));
    }

    #[tokio::test]
    async fn test_text_report_for_unreachable_host() {
        let snapshot = snapshot_of(SimulatedPlatformProbe::unreachable()).await;
        let text = TextRenderer.render(&snapshot).unwrap();
        assert!(!text.contains("Hostname"));
        assert_eq!(text.matches("  unknown (").count(), 4);
    }
}
