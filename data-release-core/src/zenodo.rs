//! Zenodo implementation of [`Archive`]: the deposition lifecycle
//! (create -> upload files -> publish) over the REST API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::contract::{Archive, Deposition, DepositionFile, PublishedRecord};
use crate::error::{ensure_success, ApiError};
use crate::metadata::DepositionMetadata;

pub const ZENODO_SANDBOX: &str = "https://sandbox.zenodo.org/api";
pub const ZENODO_PRODUCTION: &str = "https://zenodo.org/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Which Zenodo instance to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZenodoEndpoint {
    /// Testing instance; records there carry throwaway DOIs.
    Sandbox,
    Production,
}

impl ZenodoEndpoint {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            ZenodoEndpoint::Sandbox
        } else {
            ZenodoEndpoint::Production
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            ZenodoEndpoint::Sandbox => ZENODO_SANDBOX,
            ZenodoEndpoint::Production => ZENODO_PRODUCTION,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ZenodoEndpoint::Sandbox => "sandbox",
            ZenodoEndpoint::Production => "production",
        }
    }
}

#[derive(Serialize)]
struct CreateDepositionRequest<'a> {
    metadata: &'a DepositionMetadata,
}

#[derive(Deserialize)]
struct DepositionResponse {
    id: u64,
    #[serde(default)]
    links: DepositionLinks,
}

#[derive(Deserialize, Default)]
struct DepositionLinks {
    #[serde(default)]
    bucket: Option<String>,
}

#[derive(Deserialize)]
struct FileResponse {
    #[serde(default)]
    id: String,
    filename: String,
    #[serde(default)]
    filesize: u64,
}

#[derive(Deserialize)]
struct PublishResponse {
    id: u64,
    record_id: u64,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    metadata: PublishedMetadata,
}

#[derive(Deserialize, Default)]
struct PublishedMetadata {
    #[serde(default)]
    doi: Option<String>,
}

pub struct ZenodoClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ZenodoClient {
    pub fn new(token: impl Into<String>, endpoint: ZenodoEndpoint) -> Result<Self, ApiError> {
        let client = Self::with_base_url(endpoint.api_url(), token)?;
        info!(endpoint = endpoint.label(), "Zenodo client initialised");
        Ok(client)
    }

    /// Client against an arbitrary API root (ending in `/api` for real Zenodo
    /// instances).
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Public landing page of a published record on this instance.
    pub fn record_url(&self, record_id: u64) -> String {
        let web_root = self
            .base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url);
        format!("{web_root}/records/{record_id}")
    }

    fn depositions_url(&self) -> String {
        format!("{}/deposit/depositions", self.base_url)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Failed to reach Zenodo API");
                ApiError::Transport {
                    url: url.to_string(),
                    source: e,
                }
            })?;
        ensure_success(url, response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to decode Zenodo response");
            ApiError::Decode {
                url: url.to_string(),
                source: e,
            }
        })
    }
}

#[async_trait]
impl Archive for ZenodoClient {
    async fn create_deposition(
        &self,
        metadata: DepositionMetadata,
    ) -> Result<Deposition, ApiError> {
        let url = self.depositions_url();
        info!(url = %url, "Creating deposition");
        let body = CreateDepositionRequest {
            metadata: &metadata,
        };
        let request = self.http.post(&url).json(&body).timeout(REQUEST_TIMEOUT);
        let response = self.send(&url, request).await?;
        let created: DepositionResponse = Self::decode(&url, response).await?;

        info!(
            deposition_id = created.id,
            bucket = created.links.bucket.as_deref().unwrap_or("<none>"),
            "Deposition created"
        );
        Ok(Deposition {
            id: created.id,
            bucket_url: created.links.bucket,
        })
    }

    async fn upload_file(
        &self,
        deposition_id: u64,
        path: PathBuf,
    ) -> Result<DepositionFile, ApiError> {
        let url = format!("{}/{}/files", self.depositions_url(), deposition_id);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let content = tokio::fs::read(&path).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read file for upload");
            ApiError::Io {
                path: path.clone(),
                source: e,
            }
        })?;
        info!(
            deposition_id,
            file = %file_name,
            size = content.len(),
            "Uploading file to deposition"
        );

        let form = Form::new().part("file", Part::bytes(content).file_name(file_name.clone()));
        let request = self.http.post(&url).multipart(form).timeout(UPLOAD_TIMEOUT);
        let response = self.send(&url, request).await?;
        let uploaded: FileResponse = Self::decode(&url, response).await?;

        info!(deposition_id, file = %uploaded.filename, "Uploaded file");
        Ok(DepositionFile {
            id: uploaded.id,
            filename: uploaded.filename,
            filesize: uploaded.filesize,
        })
    }

    async fn publish(&self, deposition_id: u64) -> Result<PublishedRecord, ApiError> {
        let url = format!("{}/{}/actions/publish", self.depositions_url(), deposition_id);
        info!(deposition_id, url = %url, "Publishing deposition");
        let request = self.http.post(&url).timeout(REQUEST_TIMEOUT);
        let response = self.send(&url, request).await?;
        let published: PublishResponse = Self::decode(&url, response).await?;

        let doi = published
            .metadata
            .doi
            .or(published.doi)
            .filter(|doi| !doi.is_empty());
        info!(
            deposition_id = published.id,
            record_id = published.record_id,
            doi = doi.as_deref().unwrap_or("pending"),
            "Deposition published"
        );
        Ok(PublishedRecord {
            deposition_id: published.id,
            record_id: published.record_id,
            doi,
            record_url: self.record_url(published.record_id),
        })
    }
}
