//! Deposition metadata as authored by the user in `.zenodo.json`.
//!
//! Only the handful of keys the tool reports on are typed. Everything else in
//! the file is kept in `extra` and sent to the archive untouched, so any field
//! the archive understands can be used without changes here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Default metadata file name, looked up in the working directory.
pub const DEFAULT_METADATA_FILE: &str = ".zenodo.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<Creator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid metadata object: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and parses the metadata file at `path`.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<DepositionMetadata, MetadataError> {
    let path = path.as_ref();
    info!(metadata_path = ?path, "Loading deposition metadata");

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(metadata_path = ?path, "Metadata file not found");
            return Err(MetadataError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            error!(error = ?e, metadata_path = ?path, "Failed to read metadata file");
            return Err(MetadataError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let metadata: DepositionMetadata = serde_json::from_str(&content).map_err(|e| {
        error!(error = ?e, metadata_path = ?path, "Failed to parse metadata JSON");
        MetadataError::Invalid {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    info!(
        title = metadata.title.as_deref().unwrap_or("<untitled>"),
        creators = metadata.creators.len(),
        "Loaded deposition metadata"
    );
    debug!(?metadata, "Deposition metadata (full debug)");
    Ok(metadata)
}
