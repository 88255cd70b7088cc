//! Filter API client: filter-output job metadata.

use crate::error::ClientResult;
use crate::http::{self, RequestAuth, ServiceAuth};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of a filter output's download map, verbatim from upstream.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilterDownload {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub public: Option<String>,
    #[serde(default)]
    pub private: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// A filter-output job as the filter API reports it.
///
/// The download map may legitimately be empty while the job is still
/// generating output.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilterOutput {
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub downloads: HashMap<String, FilterDownload>,
}

/// Capability interface over the filter API.
#[async_trait]
pub trait FilterApi: Send + Sync {
    async fn get_output(
        &self,
        auth: &RequestAuth,
        filter_output_id: &str,
    ) -> ClientResult<FilterOutput>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// HTTP adapter for the filter API.
pub struct FilterApiClient {
    client: reqwest::Client,
    base_url: String,
    service_auth: ServiceAuth,
}

impl FilterApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, service_auth: ServiceAuth) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_auth,
        }
    }
}

#[async_trait]
impl FilterApi for FilterApiClient {
    async fn get_output(
        &self,
        auth: &RequestAuth,
        filter_output_id: &str,
    ) -> ClientResult<FilterOutput> {
        let url = format!("{}/filter-outputs/{filter_output_id}", self.base_url);
        let builder = http::apply_auth(self.client.get(&url), &self.service_auth, auth);
        let response = builder.send().await?;
        http::json_or_error(response, "filter output").await
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        http::check_status(response, "filter api health").map(|_| ())
    }
}
