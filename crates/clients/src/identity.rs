//! Identity API client: token verification.

use crate::error::ClientResult;
use crate::http::{self, AUTHORIZATION_HEADER, BEARER_PREFIX, FLORENCE_TOKEN_HEADER};
use async_trait::async_trait;
use serde::Deserialize;

/// The two credential kinds the identity service understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    User,
    Service,
}

/// A resolved caller identity.
#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
    pub identifier: String,
}

/// Capability interface over the identity API.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Validate a token as the given kind, returning the identity it
    /// belongs to.
    async fn check_token_identity(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> ClientResult<Identity>;

    /// Verify the upstream is reachable.
    async fn checker(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// HTTP adapter for the identity API.
///
/// User tokens are presented via the Florence header, service tokens via
/// the standard bearer Authorization header.
pub struct IdentityApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityApiClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityApi for IdentityApiClient {
    async fn check_token_identity(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> ClientResult<Identity> {
        let url = format!("{}/identity", self.base_url);
        let builder = match token_type {
            TokenType::User => self.client.get(&url).header(FLORENCE_TOKEN_HEADER, token),
            TokenType::Service => self
                .client
                .get(&url)
                .header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}")),
        };
        let response = builder.send().await?;
        http::json_or_error(response, "token identity").await
    }

    async fn checker(&self) -> ClientResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        http::check_status(response, "identity api health").map(|_| ())
    }
}
