//! GitHub implementation of [`ReleaseSource`].
//!
//! Looks up a release by tag through the REST API and streams each asset's
//! `browser_download_url` to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::contract::{Release, ReleaseAsset, ReleaseRef, ReleaseSource};
use crate::error::{ensure_success, ApiError};

pub const GITHUB_API: &str = "https://api.github.com";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Client for the public GitHub API. `token` is optional and only used for
    /// the release lookup.
    pub fn new(token: Option<String>) -> Result<Self, ApiError> {
        Self::with_base_url(GITHUB_API, token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(ApiError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(
            base_url = %base_url,
            token_set = token.is_some(),
            "Initialised GitHub client"
        );
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn release_url(&self, release: &ReleaseRef) -> String {
        format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.base_url, release.owner, release.repo, release.tag
        )
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    async fn fetch_release(&self, release: ReleaseRef) -> Result<Release, ApiError> {
        let url = self.release_url(&release);
        info!(url = %url, release = %release, "Fetching release descriptor");

        let mut request = self
            .http
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .timeout(LOOKUP_TIMEOUT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to reach GitHub API");
            ApiError::Transport {
                url: url.clone(),
                source: e,
            }
        })?;
        let response = ensure_success(&url, response).await?;

        let descriptor: Release = response.json().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to decode release descriptor");
            ApiError::Decode {
                url: url.clone(),
                source: e,
            }
        })?;
        info!(
            tag = %descriptor.tag_name,
            assets = descriptor.assets.len(),
            "Fetched release descriptor"
        );
        Ok(descriptor)
    }

    async fn download_asset(
        &self,
        asset: ReleaseAsset,
        dest_dir: PathBuf,
    ) -> Result<PathBuf, ApiError> {
        let url = asset.browser_download_url.clone();
        // Asset names never carry directories; keep only the final component anyway.
        let file_name = Path::new(&asset.name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| asset.name.clone().into());
        let path = dest_dir.join(file_name);
        info!(asset = %asset.name, url = %url, "Downloading release asset");

        let response = self
            .http
            .get(&url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Failed to download asset");
                ApiError::Transport {
                    url: url.clone(),
                    source: e,
                }
            })?;
        let response = ensure_success(&url, response).await?;

        let io_err = |e: std::io::Error| {
            error!(error = ?e, path = %path.display(), "Failed to write asset to disk");
            ApiError::Io {
                path: path.clone(),
                source: e,
            }
        };

        let mut file = tokio::fs::File::create(&path).await.map_err(io_err)?;
        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ApiError::Transport {
                url: url.clone(),
                source: e,
            })?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        debug!(path = %path.display(), bytes = written, "Asset written");

        info!(asset = %asset.name, path = %path.display(), "Downloaded release asset");
        Ok(path)
    }
}
