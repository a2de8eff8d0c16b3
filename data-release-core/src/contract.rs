//! # contract: collaborator interfaces for the publish pipeline
//!
//! The pipeline in [`crate::publish`] never talks HTTP directly. It is written
//! against two traits:
//!
//! - [`ReleaseSource`]: where release assets come from (GitHub in production).
//! - [`Archive`]: where they are deposited and published (Zenodo in production).
//!
//! Both traits are annotated for `mockall`, so tests can drive the pipeline
//! step by step and assert that nothing runs after a failing call. The mocks are
//! exported behind the default `test-export-mocks` feature so that the CLI
//! crate's tests can use them as well.
//!
//! Arguments are passed by value so the generated mocks stay simple.

use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::metadata::DepositionMetadata;

/// Identifies a single tagged release of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRef {
    pub owner: String,
    pub repo: String,
    pub tag: String,
}

impl ReleaseRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            tag: tag.into(),
        }
    }
}

impl std::fmt::Display for ReleaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.tag)
    }
}

/// Release descriptor as returned by the code-hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// A freshly created (draft) deposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposition {
    pub id: u64,
    /// Upload-target locator handed back by the archive, when it provides one.
    pub bucket_url: Option<String>,
}

/// A file attached to a draft deposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositionFile {
    pub id: String,
    pub filename: String,
    pub filesize: u64,
}

/// Outcome of publishing a deposition. Immutable from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub deposition_id: u64,
    pub record_id: u64,
    pub doi: Option<String>,
    /// Public landing page of the record.
    pub record_url: String,
}

/// Source of release assets.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Look up the release descriptor for `release`.
    async fn fetch_release(&self, release: ReleaseRef) -> Result<Release, ApiError>;

    /// Download `asset` into `dest_dir`, returning the path written.
    async fn download_asset(
        &self,
        asset: ReleaseAsset,
        dest_dir: PathBuf,
    ) -> Result<PathBuf, ApiError>;
}

/// Archival platform holding depositions.
///
/// A deposition goes through create -> upload* -> publish exactly once. There
/// is no update or delete operation: once published, the record is final.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Archive: Send + Sync {
    /// Create a new draft deposition carrying `metadata`.
    async fn create_deposition(&self, metadata: DepositionMetadata)
        -> Result<Deposition, ApiError>;

    /// Attach the local file at `path` to the draft deposition.
    async fn upload_file(&self, deposition_id: u64, path: PathBuf)
        -> Result<DepositionFile, ApiError>;

    /// Publish the deposition. Irreversible.
    async fn publish(&self, deposition_id: u64) -> Result<PublishedRecord, ApiError>;
}
