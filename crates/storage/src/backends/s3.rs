//! S3-compatible storage backend using the AWS SDK.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectStore};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// S3-compatible object store.
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Backend {
    /// Create a new S3 backend.
    ///
    /// When `access_key_id`/`secret_access_key` are not provided, the AWS
    /// default credentials chain (env vars, profiles, IAM roles) is used.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        bucket: &str,
        endpoint: Option<String>,
        region: Option<String>,
        prefix: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        force_path_style: bool,
    ) -> StorageResult<Self> {
        let region = Region::new(region.unwrap_or_else(|| "eu-west-2".to_string()));
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base).force_path_style(force_path_style);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (access_key_id, secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "sluice-static",
            ));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            prefix: prefix.filter(|p| !p.is_empty()),
        })
    }

    /// Apply the configured key prefix.
    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }

    fn wrap_err<E>(e: E) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StorageError::S3(Box::new(e))
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    #[instrument(skip(self))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    Self::wrap_err(service_err)
                }
            })?;

        let reader = output.body.into_async_read();
        let stream = ReaderStream::with_capacity(reader, STREAM_CHUNK_SIZE)
            .map(|result| result.map_err(StorageError::from));
        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(data.into())
            .send()
            .await
            .map_err(|e| Self::wrap_err(e.into_service_error()))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| Self::wrap_err(e.into_service_error()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_key_applies_prefix() {
        let backend = S3Backend::new(
            "exports",
            Some("http://localhost:9000".to_string()),
            Some("eu-west-2".to_string()),
            Some("private/".to_string()),
            None,
            None,
            true,
        )
        .await
        .unwrap();

        assert_eq!(backend.full_key("datasets/1.csv"), "private/datasets/1.csv");
    }

    #[tokio::test]
    async fn full_key_without_prefix_is_verbatim() {
        let backend = S3Backend::new("exports", None, None, None, None, None, false)
            .await
            .unwrap();
        assert_eq!(backend.full_key("datasets/1.csv"), "datasets/1.csv");
    }
}
