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

//! Parsing of domain and managed identity status output

use super::common::{clean_value, extract_key_value, parse_boolean};
use crate::domain::{DomainDescriptor, JoinState};
use serde_json::Value;

/// Key reported by `dsregcmd /status` for cloud directory join
pub const MANAGED_JOIN_KEY: &str = "AzureAdJoined";

/// Parse the managed identity join state from `dsregcmd /status` output
///
/// Anything other than an explicit yes/no for the join key (missing
/// line, blank or unexpected value, empty output) is `Unknown`.
pub fn parse_join_state(status_output: &str) -> JoinState {
    match extract_key_value(status_output, MANAGED_JOIN_KEY) {
        Some(value) => match parse_boolean(&value) {
            Ok(true) => JoinState::Yes,
            Ok(false) => JoinState::No,
            Err(_) => JoinState::Unknown,
        },
        None => JoinState::Unknown,
    }
}

/// Parse a JSON rendering of `Win32_ComputerSystem`
///
/// # Arguments
/// * `json` - Output of `ConvertTo-Json` for an object (or a one-element
///   array) carrying `Domain`, `Workgroup` and `PartOfDomain`
///
/// # Returns
/// * `Ok(DomainDescriptor)` - Parsed membership; null or blank fields are `None`
/// * `Err(String)` - Output was not a JSON object
pub fn parse_computer_system_json(json: &str) -> Result<DomainDescriptor, String> {
    let value: Value = serde_json::from_str(json.trim())
        .map_err(|e| format!("Invalid computer system JSON: {e}"))?;

    let object = match &value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
    .and_then(Value::as_object)
    .ok_or_else(|| "Computer system JSON is not an object".to_string())?;

    let text = |key: &str| object.get(key).and_then(Value::as_str).and_then(clean_value);

    Ok(DomainDescriptor {
        domain: text("Domain"),
        workgroup: text("Workgroup"),
        part_of_domain: object.get("PartOfDomain").and_then(Value::as_bool),
    })
}
