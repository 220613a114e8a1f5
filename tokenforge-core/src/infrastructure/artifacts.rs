//! Artifact source implementations
//!
//! Documents are read from a local directory or fetched from a static HTTP
//! location.

use crate::domain::repositories::ArtifactSource;
use crate::shared::error::DeployError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;

/// Reads documents from files in a directory
pub struct DirectoryArtifactSource {
    root: PathBuf,
}

impl DirectoryArtifactSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactSource for DirectoryArtifactSource {
    async fn fetch(&self, name: &str) -> Result<Value, DeployError> {
        let path = self.root.join(name);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| DeployError::artifact(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| DeployError::artifact(format!("Invalid JSON in {}: {}", path.display(), e)))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fetches documents relative to a base URL
pub struct HttpArtifactSource {
    client: Client,
    base_url: String,
}

impl HttpArtifactSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn document_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name.trim_start_matches('/'))
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch(&self, name: &str) -> Result<Value, DeployError> {
        let url = self.document_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DeployError::artifact(format!("Failed to fetch {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(DeployError::artifact(format!("Failed to fetch {}: HTTP {}", url, response.status())));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| DeployError::artifact(format!("Invalid JSON from {}: {}", url, e)))
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }
}

/// Pick a source from a configured location: `http(s)://` URLs are fetched,
/// anything else is treated as a directory.
pub fn source_for(location: &str) -> Box<dyn ArtifactSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpArtifactSource::new(location))
    } else {
        Box::new(DirectoryArtifactSource::new(location))
    }
}
