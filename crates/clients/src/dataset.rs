//! Dataset API client: version and instance metadata.

use crate::error::ClientResult;
use crate::http::{self, RequestAuth, ServiceAuth};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of a version's per-format download map, verbatim from upstream.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VersionDownload {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub public: Option<String>,
    #[serde(default)]
    pub private: Option<String>,
}

/// A dataset version as the dataset API reports it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub downloads: HashMap<String, VersionDownload>,
}

/// A processing instance as the dataset API reports it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub downloads: HashMap<String, VersionDownload>,
}

/// Capability interface over the dataset API.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn get_version(
        &self,
        auth: &RequestAuth,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> ClientResult<Version>;

    async fn get_instance(&self, auth: &RequestAuth, instance_id: &str) -> ClientResult<Instance>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// HTTP adapter for the dataset API.
pub struct DatasetApiClient {
    client: reqwest::Client,
    base_url: String,
    service_auth: ServiceAuth,
}

impl DatasetApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, service_auth: ServiceAuth) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_auth,
        }
    }
}

#[async_trait]
impl DatasetApi for DatasetApiClient {
    async fn get_version(
        &self,
        auth: &RequestAuth,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> ClientResult<Version> {
        let url = format!(
            "{}/datasets/{dataset_id}/editions/{edition}/versions/{version}",
            self.base_url
        );
        let builder = http::apply_auth(self.client.get(&url), &self.service_auth, auth);
        let response = builder.send().await?;
        http::json_or_error(response, "dataset version").await
    }

    async fn get_instance(&self, auth: &RequestAuth, instance_id: &str) -> ClientResult<Instance> {
        let url = format!("{}/instances/{instance_id}", self.base_url);
        let builder = http::apply_auth(self.client.get(&url), &self.service_auth, auth);
        let response = builder.send().await?;
        http::json_or_error(response, "dataset instance").await
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        http::check_status(response, "dataset api health").map(|_| ())
    }
}
