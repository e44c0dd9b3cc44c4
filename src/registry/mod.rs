// Registry v2 access: anonymous pull tokens and manifest digests.

pub mod image_ref;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use std::time::Duration;

pub use image_ref::{ImageRef, ImageRefError};

pub const MANIFEST_V2_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const CONTENT_DIGEST_HEADER: &str = "docker-content-digest";

#[async_trait]
pub trait Registry: Send + Sync {
    /// Anonymous bearer token scoped to `repository:<repository>:pull`.
    async fn pull_token(&self, repository: &str) -> Result<String, RegistryError>;

    /// Content digest of the manifest `repository:tag`, as reported by the registry.
    async fn manifest_digest(
        &self,
        repository: &str,
        tag: &str,
        token: &str,
    ) -> Result<String, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Registry client over HTTPS. One instance is shared by all update checks.
pub struct HttpRegistry {
    client: Client,
    auth_url: String,
    base_url: String,
    service: String,
    timeout: Duration,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .user_agent(crate::version::USER_AGENT)
            .build()
            .map_err(|e| RegistryError::from_reqwest("client", e))?;
        Ok(Self {
            client,
            auth_url: config.auth_url.clone(),
            base_url: config.url.trim_end_matches('/').to_string(),
            service: config.service.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn pull_token(&self, repository: &str) -> Result<String, RegistryError> {
        let scope = format!("repository:{}:pull", repository);
        let response = self
            .client
            .get(&self.auth_url)
            .query(&[("service", self.service.as_str()), ("scope", scope.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistryError::from_reqwest("token", e))?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::from_reqwest("token", e))?;
        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or(RegistryError::MissingToken)
    }

    async fn manifest_digest(
        &self,
        repository: &str,
        tag: &str,
        token: &str,
    ) -> Result<String, RegistryError> {
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, repository, tag);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, MANIFEST_V2_MEDIA_TYPE)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistryError::from_reqwest("manifest", e))?;
        response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .ok_or(RegistryError::MissingDigest)
    }
}
