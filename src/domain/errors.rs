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

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Sections of a snapshot, used to label where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Network,
    Identity,
    Storage,
    Hardware,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Network => "network",
            SectionKind::Identity => "identity",
            SectionKind::Storage => "storage",
            SectionKind::Hardware => "hardware",
        };
        f.write_str(name)
    }
}

/// Why a fact could not be collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The OS facility could not be reached
    ProbeUnavailable,
    /// Insufficient rights to read the fact
    PermissionDenied,
    /// The feature does not exist on this platform
    PlatformUnsupported,
    /// The fact vanished while it was being read
    Transient,
    /// A bounded call exceeded its ceiling
    Timeout,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::ProbeUnavailable => "unavailable",
            FailureReason::PermissionDenied => "permission denied",
            FailureReason::PlatformUnsupported => "not supported on this platform",
            FailureReason::Transient => "changed during collection",
            FailureReason::Timeout => "timed out",
        };
        f.write_str(text)
    }
}

/// A section-level (or field-level) collection failure.
///
/// This is data attached to the snapshot, never an error returned from
/// the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionError {
    pub section: SectionKind,
    pub reason: FailureReason,
    pub detail: String,
}

impl CollectionError {
    pub fn new(section: SectionKind, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            section,
            reason,
            detail: detail.into(),
        }
    }

    /// Downgrade a probe failure into collection data for `section`
    pub fn from_probe(section: SectionKind, err: &ProbeError) -> Self {
        Self::new(section, err.reason(), err.to_string())
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.section, self.reason)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Errors returned by a platform probe
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    #[error("OS facility unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unsupported on this platform: {0}")]
    Unsupported(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

impl ProbeError {
    pub fn reason(&self) -> FailureReason {
        match self {
            ProbeError::Unavailable(_) => FailureReason::ProbeUnavailable,
            ProbeError::PermissionDenied(_) => FailureReason::PermissionDenied,
            ProbeError::Unsupported(_) => FailureReason::PlatformUnsupported,
            ProbeError::Transient(_) => FailureReason::Transient,
            ProbeError::Timeout(_) => FailureReason::Timeout,
        }
    }

    /// Classify an I/O error raised while reading a fact
    pub fn from_io(context: &str, err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let message = format!("{context}: {err}");
        match err.kind() {
            ErrorKind::NotFound => ProbeError::Transient(message),
            ErrorKind::PermissionDenied => ProbeError::PermissionDenied(message),
            ErrorKind::TimedOut => ProbeError::Timeout(message),
            ErrorKind::Unsupported => ProbeError::Unsupported(message),
            _ => ProbeError::Unavailable(message),
        }
    }
}

/// External command execution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("permission denied running {0}")]
    PermissionDenied(String),
    #[error("failed to run {command}: {message}")]
    SpawnFailed { command: String, message: String },
    #[error("command '{command}' timed out after {timeout_ms} ms")]
    Timeout { command: String, timeout_ms: u128 },
    #[error("command '{command}' exited with {exit_code:?}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl From<CommandError> for ProbeError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::NotFound(_) => ProbeError::Unavailable(err.to_string()),
            CommandError::PermissionDenied(_) => ProbeError::PermissionDenied(err.to_string()),
            CommandError::Timeout { .. } => ProbeError::Timeout(err.to_string()),
            CommandError::SpawnFailed { .. } | CommandError::NonZeroExit { .. } => {
                ProbeError::Unavailable(err.to_string())
            }
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Report rendering and writing errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
