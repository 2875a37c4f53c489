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

/// Standalone HTML page with one heading and list per section
pub struct HtmlRenderer;

/// Escape text for use inside HTML element content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_list(out: &mut String, items: &[ReportItem]) {
    let _ = writeln!(out, "<ul>");
    for item in items {
        let label = escape_html(&item.label);
        let value = escape_html(&item.value);
        if item.children.is_empty() {
            let _ = writeln!(out, "<li>{label}: {value}</li>");
        } else {
            let _ = writeln!(out, "<li>{label}: {value}");
            write_list(out, &item.children);
            let _ = writeln!(out, "</li>");
        }
    }
    let _ = writeln!(out, "</ul>");
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError> {
        let mut out = String::new();
        let _ = writeln!(out, "<html>");
        let _ = writeln!(out, "<head><title>System Information</title></head>");
        let _ = writeln!(out, "<body>");
        let _ = writeln!(out, "<h1>System Information</h1>");
        let _ = writeln!(
            out,
            "<p>Platform: {} (collected at unix ms {}, took {} ms)</p>",
            escape_html(snapshot.platform()),
            snapshot.collected_at_unix_ms(),
            snapshot.elapsed_ms()
        );

        for section in build_sections(snapshot) {
            let _ = writeln!(out, "<h2>{}</h2>", section.title);
            match &section.body {
                ReportBody::Items(items) => write_list(&mut out, items),
                ReportBody::Unavailable(reason) => {
                    let _ = writeln!(out, "<p class=\"unavailable\">{}</p>", escape_html(reason));
                }
            }
        }

        let _ = writeln!(out, "</body>");
        let _ = writeln!(out, "</html>");
        Ok(out)
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::snapshot_of;
    use super::*;
    use crate::adapters::SimulatedPlatformProbe;
    use crate::domain::DomainDescriptor;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>R&D</b> \"x\""),
            "&lt;b&gt;R&amp;D&lt;/b&gt; &quot;x&quot;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_html_report_structure() {
        let snapshot = snapshot_of(SimulatedPlatformProbe::new()).await;
        let html = HtmlRenderer.render(&snapshot).unwrap();

        assert!(html.starts_with("<html>"));
        assert!(html.contains("<title>System Information</title>"));
        assert!(html.contains("<h2>Network Info</h2>"));
        assert!(html.contains("<li>IP Address: 10.0.0.5</li>"));
        assert!(html.contains("<li>/dev/sda1: mounted on /\n<ul>"));
        assert!(html.contains("<p class=\"unavailable\">unknown (not supported on this platform"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_html_report_escapes_collected_text() {
        let probe = SimulatedPlatformProbe::new()
            .with_hostname(Ok("<script>".to_string()))
            .with_domain(Ok(DomainDescriptor {
                domain: Some("R&D".to_string()),
                workgroup: None,
                part_of_domain: Some(true),
            }));
        let html = HtmlRenderer.render(&snapshot_of(probe).await).unwrap();

        assert!(html.contains("<li>Hostname: &lt;script&gt;</li>"));
        assert!(html.contains("<li>Domain: R&amp;D</li>"));
        assert!(!html.contains("<script>"));
    }
}
