//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream metadata service endpoints and tokens.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Object storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Secret-material (PSK) store.
    #[serde(default)]
    pub vault: VaultConfig,
}

impl AppConfig {
    /// Validate configuration invariants across sections.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()
    }
}

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:23600").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum requests allowed inside the download handlers at once.
    /// Zero means unbounded.
    #[serde(default)]
    pub max_concurrent_handlers: usize,
    /// Publishing mode enables authentication for unpublished content.
    /// In web (public-serving) mode unpublished artefacts are always 404.
    #[serde(default)]
    pub is_publishing: bool,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_secs")]
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_concurrent_handlers: 0,
            is_publishing: false,
            graceful_shutdown_secs: default_shutdown_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:23600".to_string()
}

fn default_shutdown_secs() -> u64 {
    5
}

/// Upstream metadata service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_dataset_api_url")]
    pub dataset_api_url: String,
    #[serde(default = "default_filter_api_url")]
    pub filter_api_url: String,
    #[serde(default = "default_image_api_url")]
    pub image_api_url: String,
    #[serde(default = "default_files_api_url")]
    pub files_api_url: String,
    #[serde(default = "default_identity_api_url")]
    pub identity_api_url: String,
    /// Service identity presented to upstreams by this gateway.
    #[serde(default, skip_serializing)]
    pub service_auth_token: String,
    /// Token upstreams use to recognize download-service callbacks.
    #[serde(default, skip_serializing)]
    pub download_service_token: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            dataset_api_url: default_dataset_api_url(),
            filter_api_url: default_filter_api_url(),
            image_api_url: default_image_api_url(),
            files_api_url: default_files_api_url(),
            identity_api_url: default_identity_api_url(),
            service_auth_token: String::new(),
            download_service_token: String::new(),
        }
    }
}

fn default_dataset_api_url() -> String {
    "http://localhost:22000".to_string()
}

fn default_filter_api_url() -> String {
    "http://localhost:22100".to_string()
}

fn default_image_api_url() -> String {
    "http://localhost:24700".to_string()
}

fn default_files_api_url() -> String {
    "http://localhost:26900".to_string()
}

fn default_identity_api_url() -> String {
    "http://localhost:8082".to_string()
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to AWS_ACCESS_KEY_ID env var if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to AWS_SECRET_ACCESS_KEY env var if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        secret_access_key: Option<String>,
        /// Force path-style URLs (e.g., `endpoint/bucket/key`).
        /// Required for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            _ => Ok(()),
        }
    }
}

/// Secret-material store configuration.
///
/// Private objects are encrypted with a pre-shared key held per file at
/// `{path}/{basename}`, field `key`, hex-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address.
    #[serde(default = "default_vault_addr")]
    pub addr: String,
    /// Vault token.
    /// WARNING: Prefer the SLUICE_VAULT__TOKEN env var over storing in config.
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Base path under which per-file keys are stored.
    #[serde(default = "default_vault_path")]
    pub path: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: default_vault_addr(),
            token: String::new(),
            path: default_vault_path(),
        }
    }
}

fn default_vault_addr() -> String {
    "http://localhost:8200".to_string()
}

fn default_vault_path() -> String {
    "secret/shared/psk".to_string()
}
