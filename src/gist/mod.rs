//! Gist file bridge: move server files to and from private remote snippets.
//!
//! - [`GistBridge::upload`] posts a local file as a new private gist and returns
//!   its browsable URL.
//! - [`GistBridge::download`] fetches raw snippet content from an allow-listed
//!   URL and overwrites a local file with it.
//!
//! Each call is one HTTP round trip bounded by the configured timeout. Nothing
//! is retried; failures come back as [`GistError`] for the caller to report.

use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::GistConfig;
use crate::logutil::escape_log;

#[derive(Debug, Error)]
pub enum GistError {
    #[error("the {0} environment variable is not set")]
    MissingToken(String),

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("{0} does not exist (use forcewritefile to create it)")]
    DestinationMissing(String),

    #[error("only URLs starting with {0} are accepted")]
    UrlNotAllowed(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request timed out after {0}s")]
    Timeout(u32),

    #[error("remote API returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct NewGist<'a> {
    description: String,
    public: bool,
    files: HashMap<&'a str, GistFileBody<'a>>,
}

#[derive(Debug, Serialize)]
struct GistFileBody<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedGist {
    html_url: Option<String>,
}

pub struct GistBridge {
    config: GistConfig,
    client: reqwest::Client,
}

impl GistBridge {
    pub fn new(config: GistConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use a preconfigured HTTP client (proxy settings, TLS roots).
    pub fn with_client(config: GistConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &GistConfig {
        &self.config
    }

    /// Whether the upload credential is present in the environment.
    pub fn is_configured(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<String> {
        std::env::var(&self.config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, GistError>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        let secs = self.config.timeout_seconds;
        timeout(Duration::from_secs(u64::from(secs)), fut)
            .await
            .map_err(|_| GistError::Timeout(secs))?
            .map_err(GistError::from)
    }

    /// Upload `local_path` as a private gist and return the gist's page URL.
    pub async fn upload(&self, local_path: &str) -> Result<String, GistError> {
        let token = self
            .token()
            .ok_or_else(|| GistError::MissingToken(self.config.token_env.clone()))?;
        let content = tokio::fs::read_to_string(local_path)
            .await
            .map_err(|source| GistError::Read {
                path: local_path.to_string(),
                source,
            })?;

        let file_name = Path::new(local_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(local_path);
        let mut files = HashMap::new();
        files.insert(file_name, GistFileBody { content: &content });
        let body = NewGist {
            description: format!("Server file {}", local_path),
            public: false,
            files,
        };

        let url = format!("{}/gists", self.config.api_base.trim_end_matches('/'));
        debug!("gist: uploading {} to {}", escape_log(local_path), url);
        let request = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("token {}", token))
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .json(&body);

        let response = self.bounded(request.send()).await?;
        if !response.status().is_success() {
            return Err(GistError::Status(response.status()));
        }
        let text = self.bounded(response.text()).await?;
        let created: CreatedGist = serde_json::from_str(&text)
            .map_err(|e| GistError::MalformedResponse(e.to_string()))?;
        let html_url = created
            .html_url
            .ok_or_else(|| GistError::MalformedResponse("missing html_url".to_string()))?;
        info!("gist: uploaded {} to {}", escape_log(local_path), html_url);
        Ok(html_url)
    }

    /// Fetch `raw_url` and write its body over `local_path`.
    ///
    /// With `overwrite_if_missing` false the destination must already exist;
    /// that is checked before any network traffic and the file is never created.
    pub async fn download(
        &self,
        raw_url: &str,
        local_path: &str,
        overwrite_if_missing: bool,
    ) -> Result<(), GistError> {
        if !raw_url.starts_with(&self.config.raw_url_prefix) {
            return Err(GistError::UrlNotAllowed(self.config.raw_url_prefix.clone()));
        }
        if !overwrite_if_missing && !Path::new(local_path).exists() {
            return Err(GistError::DestinationMissing(local_path.to_string()));
        }

        debug!("gist: fetching {}", escape_log(raw_url));
        let request = self
            .client
            .get(raw_url)
            .header(USER_AGENT, &self.config.user_agent);
        let response = self.bounded(request.send()).await?;
        if !response.status().is_success() {
            return Err(GistError::Status(response.status()));
        }
        let body = self.bounded(response.bytes()).await?;

        tokio::fs::write(local_path, &body)
            .await
            .map_err(|source| GistError::Write {
                path: local_path.to_string(),
                source,
            })?;
        info!(
            "gist: wrote {} bytes from {} to {}",
            body.len(),
            escape_log(raw_url),
            escape_log(local_path)
        );
        Ok(())
    }
}
