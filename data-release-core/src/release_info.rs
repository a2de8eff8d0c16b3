//! Local record of a successful publish run.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::contract::PublishedRecord;

pub const DEFAULT_RELEASE_INFO_FILE: &str = "zenodo_release.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub timestamp: DateTime<Local>,
    pub deposition_id: u64,
    pub record_id: u64,
    pub doi: Option<String>,
    pub url: String,
    pub tag: String,
}

impl ReleaseInfo {
    pub fn new(record: &PublishedRecord, tag: &str) -> Self {
        Self {
            timestamp: Local::now(),
            deposition_id: record.deposition_id,
            record_id: record.record_id,
            doi: record.doi.clone(),
            url: record.record_url.clone(),
            tag: tag.to_string(),
        }
    }

    /// Writes the record as pretty-printed JSON, replacing any previous file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        info!(path = %path.display(), record_id = self.record_id, "Release info saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
