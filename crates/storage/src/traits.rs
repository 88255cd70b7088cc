//! Storage trait definitions.

use crate::crypto::DecryptStream;
use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Object store abstraction for the gateway's read path.
///
/// The gateway never mutates artefact content; `put` exists for seeding
/// stores in tests and tooling.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Get an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Get an encrypted object as a byte stream, decrypting with the given
    /// pre-shared key as chunks arrive.
    async fn get_stream_with_psk(&self, key: &str, psk: &[u8]) -> StorageResult<ByteStream> {
        let inner = self.get_stream(key).await?;
        Ok(Box::pin(DecryptStream::new(inner, psk)?))
    }

    /// Put an object atomically.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type
    /// (e.g., "s3", "filesystem"). Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called during startup and from the health endpoint. The default
    /// implementation returns Ok(()), suitable for backends that don't
    /// require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
