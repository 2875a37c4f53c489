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
use crate::ports::ReportRenderer;

/// Pretty-printed JSON document of the whole snapshot
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError> {
        serde_json::to_string_pretty(snapshot)
            .map_err(|e| RenderError::Serialization(format!("JSON: {e}")))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

/// TOML document of the whole snapshot
pub struct TomlRenderer;

impl ReportRenderer for TomlRenderer {
    fn render(&self, snapshot: &Snapshot) -> Result<String, RenderError> {
        toml::to_string_pretty(snapshot)
            .map_err(|e| RenderError::Serialization(format!("TOML: {e}")))
    }

    fn file_extension(&self) -> &'static str {
        "toml"
    }
}
