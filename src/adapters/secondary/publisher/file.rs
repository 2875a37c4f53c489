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

//! File-based publisher for saving rendered snapshots to local files

use crate::domain::{RenderError, Snapshot};
use crate::ports::{ReportPublisher, ReportRenderer};
use async_trait::async_trait;
use log::info;
use std::path::Path;
use tokio::fs;

/// Writes rendered snapshots to the local file system
pub struct FileReportPublisher;

impl FileReportPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileReportPublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn write_error(path: &Path, source: std::io::Error) -> RenderError {
    RenderError::Write {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl ReportPublisher for FileReportPublisher {
    async fn publish(
        &self,
        snapshot: &Snapshot,
        renderer: &dyn ReportRenderer,
        path: &Path,
    ) -> Result<(), RenderError> {
        let contents = renderer.render(snapshot)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, e))?;
        }

        fs::write(path, contents)
            .await
            .map_err(|e| write_error(path, e))?;

        info!("Report saved to {}", path.display());
        Ok(())
    }
}
