//! Shared HTTP plumbing for the upstream clients.

use crate::error::{ClientError, ClientResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Header carrying the caller's user token on upstream calls.
pub const FLORENCE_TOKEN_HEADER: &str = "X-Florence-Token";

/// Header carrying this gateway's service identity.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header upstreams use to recognize download-service callbacks.
pub const DOWNLOAD_SERVICE_TOKEN_HEADER: &str = "X-Download-Service-Token";

/// Header scoping requests to an unpublished collection.
pub const COLLECTION_ID_HEADER: &str = "Collection-Id";

/// Bearer scheme prefix stripped from and applied to tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Per-request caller credentials forwarded to upstreams.
#[derive(Clone, Debug, Default)]
pub struct RequestAuth {
    /// The caller's user token, when one was presented.
    pub user_token: Option<String>,
    /// The collection the caller is working in, when known.
    pub collection_id: Option<String>,
}

/// Tokens this gateway presents to upstream services on every call.
#[derive(Clone, Debug, Default)]
pub struct ServiceAuth {
    pub service_token: String,
    pub download_service_token: String,
}

/// Apply service and per-request auth headers to an upstream request.
pub fn apply_auth(
    mut builder: RequestBuilder,
    service: &ServiceAuth,
    auth: &RequestAuth,
) -> RequestBuilder {
    if !service.service_token.is_empty() {
        builder = builder.header(
            AUTHORIZATION_HEADER,
            format!("{BEARER_PREFIX}{}", service.service_token),
        );
    }
    if !service.download_service_token.is_empty() {
        builder = builder.header(
            DOWNLOAD_SERVICE_TOKEN_HEADER,
            service.download_service_token.clone(),
        );
    }
    if let Some(user_token) = auth.user_token.as_deref().filter(|t| !t.is_empty()) {
        builder = builder.header(FLORENCE_TOKEN_HEADER, user_token);
    }
    if let Some(collection_id) = auth.collection_id.as_deref().filter(|c| !c.is_empty()) {
        builder = builder.header(COLLECTION_ID_HEADER, collection_id);
    }
    builder
}

/// Decode a JSON body after mapping upstream error statuses.
pub async fn json_or_error<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> ClientResult<T> {
    let response = check_status(response, what)?;
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(format!("{what}: {e}")))
}

/// Map upstream error statuses onto [`ClientError`], preserving the code.
pub fn check_status(response: Response, what: &str) -> ClientResult<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ClientError::Unauthorized(what.to_string()))
        }
        status => Err(ClientError::Status {
            status: status.as_u16(),
            context: what.to_string(),
        }),
    }
}
