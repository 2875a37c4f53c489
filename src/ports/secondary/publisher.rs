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

use crate::domain::{RenderError, Snapshot};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON document
    Json,
    /// TOML document
    Toml,
    /// Standalone HTML page
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!(
                "unknown output format '{other}' (expected text, json, toml or html)"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
            OutputFormat::Html => "html",
        };
        f.write_str(name)
    }
}

/// Secondary port - Report rendering abstraction
///
/// Renderers must show every present field and mark every unavailable
/// section or field with its failure reason, never omit it.
pub trait ReportRenderer: Send + Sync {
    /// Render a snapshot to a self-contained report
    ///
    /// # Arguments
    /// * `snapshot` - The snapshot to render
    ///
    /// # Returns
    /// * `Ok(String)` - Rendered report
    /// * `Err(RenderError)` - Serialization failed
    fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError>;

    /// File extension for reports produced by this renderer
    fn file_extension(&self) -> &'static str;
}

/// Secondary port - Report publishing abstraction
///
/// This interface abstracts where rendered reports end up.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Render and store a snapshot
    ///
    /// # Arguments
    /// * `snapshot` - The snapshot to publish
    /// * `renderer` - Output format
    /// * `path` - Destination path
    ///
    /// # Returns
    /// * `Ok(())` - Report successfully written
    /// * `Err(RenderError)` - Error occurred during rendering or writing
    async fn publish(
        &self,
        snapshot: &Snapshot,
        renderer: &dyn ReportRenderer,
        path: &Path,
    ) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(" HTML ".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Toml.to_string(), "toml");
    }
}
