//! Object storage abstraction and backends for sluice.
//!
//! This crate provides:
//! - The read-path [`ObjectStore`] trait the content streamer consumes
//! - Decrypt-on-read for privately held, PSK-encrypted objects
//! - Backends: local filesystem and S3-compatible

pub mod backends;
pub mod crypto;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, s3::S3Backend};
pub use crypto::DecryptStream;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, ObjectStore};

use sluice_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                bucket,
                endpoint.clone(),
                region.clone(),
                prefix.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend))
        }
    }
}
