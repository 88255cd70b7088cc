//! Secret-store client: per-file pre-shared keys.

use crate::error::{ClientError, ClientResult};
use crate::http;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Capability interface over the secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read one field of the secret at `path`. The value is returned as the
    /// store holds it (PSKs are hex-encoded strings).
    async fn read_key(&self, path: &str, field: &str) -> ClientResult<String>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    data: HashMap<String, String>,
}

/// HTTP adapter for a Vault KV store.
pub struct VaultClient {
    client: reqwest::Client,
    addr: String,
    token: String,
}

impl VaultClient {
    pub fn new(client: reqwest::Client, addr: &str, token: &str) -> Self {
        Self {
            client,
            addr: addr.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn read_key(&self, path: &str, field: &str) -> ClientResult<String> {
        let url = format!("{}/v1/{path}", self.addr);
        let response = self
            .client
            .get(&url)
            .header("X-Vault-Token", &self.token)
            .send()
            .await?;
        let secret: SecretResponse = http::json_or_error(response, "secret material").await?;
        secret
            .data
            .get(field)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("secret field {field} at {path}")))
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/v1/sys/health", self.addr))
            .send()
            .await?;
        http::check_status(response, "vault health").map(|_| ())
    }
}
