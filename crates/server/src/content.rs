//! Content retrieval: direct and decrypt-on-read streaming.
//!
//! Private objects are held encrypted; the pre-shared key for a file lives in
//! the secret store at `{base_path}/{basename}` under the `key` field,
//! hex-encoded. Public-store objects (decrypted registered files) stream
//! straight through.

use crate::error::ApiError;
use sluice_clients::{ClientError, SecretStore};
use sluice_storage::{ByteStream, ObjectStore, StorageError};
use std::sync::Arc;

/// Secret-store field holding the hex-encoded PSK.
pub const VAULT_KEY_FIELD: &str = "key";

/// Content retrieval failure.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The locator carried no filename, so there is nothing to look a key
    /// up under. Raised before any secret-store call.
    #[error("no filename to look up a key for")]
    EmptyFilename,

    #[error("reading key for {filename}: {source}")]
    Secret {
        filename: String,
        #[source]
        source: ClientError,
    },

    #[error("key for {filename} is not valid hex")]
    KeyDecode { filename: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Storage(e) => ApiError::Storage(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Streams object content, fetching and applying decryption keys as needed.
#[derive(Clone)]
pub struct Streamer {
    secrets: Arc<dyn SecretStore>,
    storage: Arc<dyn ObjectStore>,
    key_base_path: String,
}

impl Streamer {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        storage: Arc<dyn ObjectStore>,
        key_base_path: &str,
    ) -> Self {
        Self {
            secrets,
            storage,
            key_base_path: key_base_path.trim_end_matches('/').to_string(),
        }
    }

    /// Stream an object as stored, no decryption.
    pub async fn stream_plain(&self, key: &str) -> Result<ByteStream, ContentError> {
        Ok(self.storage.get_stream(key).await?)
    }

    /// Stream an encrypted object, decrypting with the file's PSK as chunks
    /// arrive.
    pub async fn stream_decrypted(
        &self,
        key: &str,
        filename: &str,
    ) -> Result<ByteStream, ContentError> {
        let psk = self.psk_for(filename).await?;
        Ok(self.storage.get_stream_with_psk(key, &psk).await?)
    }

    /// Fetch and decode the PSK for a file. The key lives under the file's
    /// basename so renamed copies of a private URL still find it.
    async fn psk_for(&self, filename: &str) -> Result<Vec<u8>, ContentError> {
        let basename = filename.rsplit('/').next().unwrap_or(filename);
        if basename.is_empty() {
            return Err(ContentError::EmptyFilename);
        }
        let path = format!("{}/{basename}", self.key_base_path);
        let encoded = self
            .secrets
            .read_key(&path, VAULT_KEY_FIELD)
            .await
            .map_err(|source| ContentError::Secret {
                filename: basename.to_string(),
                source,
            })?;
        hex::decode(encoded.trim()).map_err(|_| ContentError::KeyDecode {
            filename: basename.to_string(),
        })
    }
}
