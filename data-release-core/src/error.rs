//! Error types shared by the HTTP clients.

use std::path::PathBuf;

/// Errors from a single remote call (or the local file I/O around it).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote answered with a non-2xx status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Reading or writing a local file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a rejected request, if this error is one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Turns a non-success response into [`ApiError::Status`], keeping the body
/// for diagnostics.
pub(crate) async fn ensure_success(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<failed to decode response body>"));
    tracing::error!(status = %status, url = %url, "Remote returned error. Response body: {body}");
    Err(ApiError::Status {
        url: url.to_string(),
        status,
        body,
    })
}
