/// `load_config` module: gathers the environment-provided settings for `publish`.
///
/// Static settings come from CLI flags; secrets and endpoint overrides come from
/// the environment (a `.env` file is loaded by `main` beforehand). This is the
/// only place the CLI reads environment variables.
///
/// # Variables
/// - `ZENODO_TOKEN` (required): personal access token for the archive.
/// - `GITHUB_TOKEN` (optional): sent on the release lookup.
/// - `ZENODO_API_URL`, `GITHUB_API_URL` (optional): base URL overrides.
///
/// Empty values count as unset.
use anyhow::Result;
use tracing::{error, info};

pub const ZENODO_TOKEN_VAR: &str = "ZENODO_TOKEN";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const ZENODO_API_URL_VAR: &str = "ZENODO_API_URL";
pub const GITHUB_API_URL_VAR: &str = "GITHUB_API_URL";

pub const TOKEN_HELP_URL: &str = "https://zenodo.org/account/settings/applications/";

pub struct PublishEnv {
    pub zenodo_token: String,
    pub github_token: Option<String>,
    pub zenodo_api_url: Option<String>,
    pub github_api_url: Option<String>,
}

impl std::fmt::Debug for PublishEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishEnv")
            .field("zenodo_token", &"<redacted>")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("zenodo_api_url", &self.zenodo_api_url)
            .field("github_api_url", &self.github_api_url)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads the publish settings from the environment. Fails when the archive
/// token is missing.
pub fn load_publish_env() -> Result<PublishEnv> {
    let Some(zenodo_token) = non_empty_var(ZENODO_TOKEN_VAR) else {
        error!(var = ZENODO_TOKEN_VAR, "Access token environment variable not set");
        anyhow::bail!(
            "{ZENODO_TOKEN_VAR} environment variable not set. Get a token from: {TOKEN_HELP_URL}"
        );
    };

    let env = PublishEnv {
        zenodo_token,
        github_token: non_empty_var(GITHUB_TOKEN_VAR),
        zenodo_api_url: non_empty_var(ZENODO_API_URL_VAR),
        github_api_url: non_empty_var(GITHUB_API_URL_VAR),
    };
    info!(
        github_token_set = env.github_token.is_some(),
        zenodo_api_url = env.zenodo_api_url.as_deref().unwrap_or("<default>"),
        github_api_url = env.github_api_url.as_deref().unwrap_or("<default>"),
        "Loaded publish settings from environment"
    );
    Ok(env)
}
