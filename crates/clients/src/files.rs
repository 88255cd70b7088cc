//! File-registry client: per-file metadata for the newer download path.

use crate::error::ClientResult;
use crate::http::{self, AUTHORIZATION_HEADER, BEARER_PREFIX};
use async_trait::async_trait;
use sluice_core::files::FileMetadata;

/// Capability interface over the file registry.
#[async_trait]
pub trait FilesApi: Send + Sync {
    /// Fetch the registered metadata for a path. The path is the verbatim
    /// object-store key; no derivation happens here.
    async fn get_file(&self, auth_token: &str, path: &str) -> ClientResult<FileMetadata>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// HTTP adapter for the file registry.
pub struct FilesApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl FilesApiClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FilesApi for FilesApiClient {
    async fn get_file(&self, auth_token: &str, path: &str) -> ClientResult<FileMetadata> {
        let url = format!("{}/files/{path}", self.base_url);
        let mut builder = self.client.get(&url);
        if !auth_token.is_empty() {
            builder = builder.header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{auth_token}"));
        }
        let response = builder.send().await?;
        http::json_or_error(response, "registered file metadata").await
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        http::check_status(response, "files api health").map(|_| ())
    }
}
