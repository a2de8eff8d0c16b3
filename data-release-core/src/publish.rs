//! High-level pipeline: republishes a code-hosting release as an archival record.
//!
//! The pipeline runs these steps strictly in order, each one awaited before the
//! next starts:
//!
//!   1. Load the deposition metadata file.
//!   2. Fetch the release descriptor from the [`ReleaseSource`].
//!   3. Download every asset into the staging directory (or, with
//!      `skip_download`, take whatever files are already staged).
//!   4. Create a draft deposition on the [`Archive`].
//!   5. Upload each staged file to it.
//!   6. Publish the deposition.
//!   7. Persist a [`ReleaseInfo`] record next to the caller.
//!
//! # Error Handling
//! Fail-fast: the first failing step returns its [`PublishError`] and no later
//! step runs. Nothing is retried or rolled back. A failure during upload leaves
//! the draft deposition on the archive; publishing is the only irreversible
//! step and happens last.
//!
//! # Callable From
//! - The CLI crate's `publish` subcommand
//! - Integration tests, with `MockReleaseSource` / `MockArchive`

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::contract::{Archive, DepositionFile, PublishedRecord, ReleaseRef, ReleaseSource};
use crate::error::ApiError;
use crate::metadata::{load_metadata, MetadataError, DEFAULT_METADATA_FILE};
use crate::release_info::{ReleaseInfo, DEFAULT_RELEASE_INFO_FILE};

pub const DEFAULT_STAGING_DIR: &str = "releases";

/// Everything one publish run needs to know.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub release: ReleaseRef,
    pub metadata_path: PathBuf,
    pub staging_dir: PathBuf,
    /// Use files already present in `staging_dir` instead of downloading.
    pub skip_download: bool,
    pub release_info_path: PathBuf,
}

impl PublishRequest {
    /// Request with the default file locations, relative to the working directory.
    pub fn new(release: ReleaseRef) -> Self {
        Self {
            release,
            metadata_path: PathBuf::from(DEFAULT_METADATA_FILE),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            skip_download: false,
            release_info_path: PathBuf::from(DEFAULT_RELEASE_INFO_FILE),
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PublishReport {
    pub record: PublishedRecord,
    pub uploaded: Vec<DepositionFile>,
    pub info: ReleaseInfo,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("failed to fetch release {release}: {source}")]
    FetchRelease {
        release: ReleaseRef,
        #[source]
        source: ApiError,
    },
    #[error("failed to prepare staging directory {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download asset {asset}: {source}")]
    DownloadAsset {
        asset: String,
        #[source]
        source: ApiError,
    },
    #[error("no files to upload in {}", staging_dir.display())]
    NoFiles { staging_dir: PathBuf },
    #[error("failed to create deposition: {0}")]
    CreateDeposition(#[source] ApiError),
    #[error("failed to upload {} to deposition {deposition_id}: {source}", path.display())]
    UploadFile {
        deposition_id: u64,
        path: PathBuf,
        #[source]
        source: ApiError,
    },
    #[error("failed to publish deposition {deposition_id}: {source}")]
    Publish {
        deposition_id: u64,
        #[source]
        source: ApiError,
    },
    #[error("failed to save release info to {}: {source}", path.display())]
    SaveReleaseInfo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the whole pipeline for `request`.
pub async fn publish_release<S, A>(
    request: &PublishRequest,
    source: &S,
    archive: &A,
) -> Result<PublishReport, PublishError>
where
    S: ReleaseSource + ?Sized,
    A: Archive + ?Sized,
{
    info!(release = %request.release, "[PUBLISH] Starting release publication");

    // --- Step 1: Metadata ---
    let metadata = load_metadata(&request.metadata_path)?;

    // --- Steps 2-3: Stage files ---
    let files = if request.skip_download {
        info!(staging_dir = %request.staging_dir.display(), "[PUBLISH] Skipping download, using staged files");
        collect_staged_files(&request.staging_dir)?
    } else {
        stage_release_assets(source, &request.release, &request.staging_dir).await?
    };

    if files.is_empty() {
        error!(staging_dir = %request.staging_dir.display(), "[PUBLISH][ERROR] No files to upload");
        return Err(PublishError::NoFiles {
            staging_dir: request.staging_dir.clone(),
        });
    }
    info!(count = files.len(), "[PUBLISH] Files staged for upload");

    // --- Step 4: Create deposition ---
    let deposition = archive.create_deposition(metadata).await.map_err(|e| {
        error!(error = ?e, "[PUBLISH][ERROR] create_deposition failed");
        PublishError::CreateDeposition(e)
    })?;
    info!(deposition_id = deposition.id, "[PUBLISH] Deposition created");

    // --- Step 5: Upload ---
    let mut uploaded = Vec::with_capacity(files.len());
    for path in files {
        debug!(path = %path.display(), "[PUBLISH][UPLOAD] Preparing upload");
        let file = archive
            .upload_file(deposition.id, path.clone())
            .await
            .map_err(|e| {
                error!(error = ?e, path = %path.display(), "[PUBLISH][ERROR][UPLOAD] upload_file failed");
                PublishError::UploadFile {
                    deposition_id: deposition.id,
                    path,
                    source: e,
                }
            })?;
        info!(file = %file.filename, "[PUBLISH][UPLOAD] upload_file succeeded");
        uploaded.push(file);
    }

    // --- Step 6: Publish ---
    let record = archive.publish(deposition.id).await.map_err(|e| {
        error!(error = ?e, deposition_id = deposition.id, "[PUBLISH][ERROR] publish failed");
        PublishError::Publish {
            deposition_id: deposition.id,
            source: e,
        }
    })?;
    info!(
        record_id = record.record_id,
        doi = record.doi.as_deref().unwrap_or("pending"),
        "[PUBLISH] Deposition published"
    );

    // --- Step 7: Persist ---
    let info = ReleaseInfo::new(&record, &request.release.tag);
    info.save(&request.release_info_path).map_err(|e| {
        error!(error = ?e, path = %request.release_info_path.display(), "[PUBLISH][ERROR] Failed to save release info");
        PublishError::SaveReleaseInfo {
            path: request.release_info_path.clone(),
            source: e,
        }
    })?;

    Ok(PublishReport {
        record,
        uploaded,
        info,
    })
}

/// Fetches the release descriptor and downloads every asset into `staging_dir`,
/// creating the directory if needed. Returns the written paths in asset order.
pub async fn stage_release_assets<S>(
    source: &S,
    release: &ReleaseRef,
    staging_dir: &Path,
) -> Result<Vec<PathBuf>, PublishError>
where
    S: ReleaseSource + ?Sized,
{
    let descriptor = source.fetch_release(release.clone()).await.map_err(|e| {
        error!(error = ?e, release = %release, "[PUBLISH][ERROR] fetch_release failed");
        PublishError::FetchRelease {
            release: release.clone(),
            source: e,
        }
    })?;

    std::fs::create_dir_all(staging_dir).map_err(|e| {
        error!(error = ?e, path = %staging_dir.display(), "Failed to create staging directory");
        PublishError::Staging {
            path: staging_dir.to_path_buf(),
            source: e,
        }
    })?;

    let mut files = Vec::with_capacity(descriptor.assets.len());
    for asset in descriptor.assets {
        let name = asset.name.clone();
        let path = source
            .download_asset(asset, staging_dir.to_path_buf())
            .await
            .map_err(|e| {
                error!(error = ?e, asset = %name, "[PUBLISH][ERROR] download_asset failed");
                PublishError::DownloadAsset {
                    asset: name.clone(),
                    source: e,
                }
            })?;
        info!(asset = %name, path = %path.display(), "[PUBLISH] Asset staged");
        files.push(path);
    }
    Ok(files)
}

/// Regular files directly inside `staging_dir`, sorted by path. A missing
/// directory yields an empty list.
pub fn collect_staged_files(staging_dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    if !staging_dir.exists() {
        debug!(path = %staging_dir.display(), "Staging directory does not exist");
        return Ok(Vec::new());
    }
    let staging_err = |e: std::io::Error| PublishError::Staging {
        path: staging_dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(staging_dir).map_err(staging_err)? {
        let path = entry.map_err(staging_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
