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

//! Common parsing utilities and helper functions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref KEY_VALUE_RE: Regex = Regex::new(r"^\s*([^:]+?)\s*:\s*(.*?)\s*$").unwrap();
}

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Extract a value from `Key : Value` style command output
///
/// # Arguments
/// * `output` - Raw command output
/// * `key` - Key to search for, matched case-insensitively
///
/// # Returns
/// * `Some(String)` - Value of the first matching line (may be empty)
/// * `None` - Key not present
pub fn extract_key_value(output: &str, key: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let captures = KEY_VALUE_RE.captures(line)?;
        if captures[1].eq_ignore_ascii_case(key) {
            Some(captures[2].to_string())
        } else {
            None
        }
    })
}

/// Clean and normalize a string value, mapping blanks to `None`
pub fn clean_value(value: &str) -> Option<String> {
    let cleaned = value.replace('\t', " ").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Parse boolean-like strings to actual booleans
///
/// # Arguments
/// * `value` - String value (e.g., "yes", "true", "1", "enabled")
///
/// # Returns
/// * `Ok(bool)` - Parsed boolean value
/// * `Err(String)` - Parse error
pub fn parse_boolean(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "true" | "1" | "on" | "enabled" | "active" => Ok(true),
        "no" | "false" | "0" | "off" | "disabled" | "inactive" => Ok(false),
        _ => Err(format!("Cannot parse '{value}' as boolean")),
    }
}

/// Convert bytes to GiB rounded to two decimals, for display only
pub fn bytes_to_gib(bytes: u64) -> f64 {
    (bytes as f64 / GIB * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_key_value() {
        let output = "| Device State |\n\n             AzureAdJoined : YES\n          EnterpriseJoined : NO\n";
        assert_eq!(extract_key_value(output, "AzureAdJoined").as_deref(), Some("YES"));
        assert_eq!(extract_key_value(output, "azureadjoined").as_deref(), Some("YES"));
        assert_eq!(extract_key_value(output, "EnterpriseJoined").as_deref(), Some("NO"));
        assert!(extract_key_value(output, "DomainJoined").is_none());
    }

    #[test]
    fn test_extract_key_value_empty_value() {
        assert_eq!(extract_key_value("AzureAdJoined :", "AzureAdJoined").as_deref(), Some(""));
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  corp.example.com\t").as_deref(), Some("corp.example.com"));
        assert!(clean_value("   ").is_none());
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean("yes").unwrap());
        assert!(!parse_boolean("NO").unwrap());
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn test_bytes_to_gib() {
        assert_eq!(bytes_to_gib(0), 0.0);
        assert_eq!(bytes_to_gib(16 * 1024 * 1024 * 1024), 16.0);
        assert_eq!(bytes_to_gib(1_610_612_736), 1.5);
    }
}
