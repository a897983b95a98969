use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::responses::Response;
use crate::result::ResultSet;

/// A scored session as written by `--output`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionExport {
    pub completed_at: String,
    pub endpoint: String,
    pub responses: Vec<Response>,
    pub result: ResultSet,
}

impl SessionExport {
    pub fn new(endpoint: &str, responses: Vec<Response>, result: ResultSet) -> Self {
        Self {
            completed_at: chrono::Local::now().to_rfc3339(),
            endpoint: endpoint.to_string(),
            responses,
            result,
        }
    }

    /// Write the export as pretty JSON: temp file first, then rename, so a
    /// reader never sees a half-written document.
    pub fn write(&self, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let temp_path = output_path.with_extension("tmp");
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&temp_path, json)
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, output_path)
            .with_context(|| format!("failed to move export into {}", output_path.display()))?;

        tracing::info!(path = %output_path.display(), "session exported");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
