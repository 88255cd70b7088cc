//! Image API client: download-variant metadata.

use crate::error::ClientResult;
use crate::http::{self, RequestAuth, ServiceAuth};
use async_trait::async_trait;
use serde::Deserialize;

/// A single image download variant as the image API reports it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageDownload {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub size: u64,
}

/// Capability interface over the image API.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn get_download_variant(
        &self,
        auth: &RequestAuth,
        image_id: &str,
        variant: &str,
    ) -> ClientResult<ImageDownload>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// HTTP adapter for the image API.
pub struct ImageApiClient {
    client: reqwest::Client,
    base_url: String,
    service_auth: ServiceAuth,
}

impl ImageApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, service_auth: ServiceAuth) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_auth,
        }
    }
}

#[async_trait]
impl ImageApi for ImageApiClient {
    async fn get_download_variant(
        &self,
        auth: &RequestAuth,
        image_id: &str,
        variant: &str,
    ) -> ClientResult<ImageDownload> {
        let url = format!("{}/images/{image_id}/downloads/{variant}", self.base_url);
        let builder = http::apply_auth(self.client.get(&url), &self.service_auth, auth);
        let response = builder.send().await?;
        http::json_or_error(response, "image download variant").await
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        http::check_status(response, "image api health").map(|_| ())
    }
}
