//! Server test utilities.

use super::clients::{FakeDataset, FakeFiles, FakeFilter, FakeIdentity, FakeImage, FakeSecrets};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use sluice_core::config::{AppConfig, ServerConfig};
use sluice_server::{AppState, create_router};
use sluice_storage::backends::filesystem::FilesystemBackend;
use sluice_storage::crypto::{IV_LEN, encrypt};
use sluice_storage::ObjectStore;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with handles to every fake dependency.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub dataset: Arc<FakeDataset>,
    pub filter: Arc<FakeFilter>,
    pub image: Arc<FakeImage>,
    pub files: Arc<FakeFiles>,
    pub identity: Arc<FakeIdentity>,
    pub secrets: Arc<FakeSecrets>,
    pub storage: Arc<dyn ObjectStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Web-mode server with an unbounded admission gate.
    pub async fn new() -> Self {
        Self::with_server_config(ServerConfig::default()).await
    }

    /// Publishing-mode server.
    pub async fn publishing() -> Self {
        Self::with_server_config(ServerConfig {
            is_publishing: true,
            ..Default::default()
        })
        .await
    }

    /// Web-mode server with a bounded admission gate.
    pub async fn with_limit(limit: usize) -> Self {
        Self::with_server_config(ServerConfig {
            max_concurrent_handlers: limit,
            ..Default::default()
        })
        .await
    }

    pub async fn with_server_config(server: ServerConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(temp_dir.path())
                .await
                .expect("failed to create storage backend"),
        );

        let dataset = Arc::new(FakeDataset::default());
        let filter = Arc::new(FakeFilter::default());
        let image = Arc::new(FakeImage::default());
        let files = Arc::new(FakeFiles::default());
        let identity = Arc::new(FakeIdentity::default());
        let secrets = Arc::new(FakeSecrets::default());

        let config = AppConfig {
            server,
            ..Default::default()
        };

        let state = AppState::new(
            config,
            dataset.clone(),
            filter.clone(),
            image.clone(),
            files.clone(),
            identity.clone(),
            secrets.clone(),
            storage.clone(),
        );
        let router = create_router(state);

        Self {
            router,
            dataset,
            filter,
            image,
            files,
            identity,
            secrets,
            storage,
            _temp_dir: temp_dir,
        }
    }

    /// Seed an encrypted object with its PSK registered under the key's
    /// basename.
    pub async fn seed_encrypted(&self, key: &str, plaintext: &[u8]) {
        let basename = key.rsplit('/').next().unwrap().to_string();
        self.seed_encrypted_as(key, &basename, plaintext).await;
    }

    /// Seed an encrypted object whose PSK lives under a different name than
    /// the key's basename (image variants look keys up by route filename).
    pub async fn seed_encrypted_as(&self, key: &str, secret_name: &str, plaintext: &[u8]) {
        let psk = [42u8; 16];
        let iv = [7u8; IV_LEN];
        let sealed = encrypt(&psk, &iv, plaintext).expect("failed to seal object");
        self.storage.put(key, sealed).await.expect("failed to seed object");
        self.secrets
            .insert(&format!("secret/shared/psk/{secret_name}"), &hex::encode(psk));
    }

    /// Seed a plaintext object.
    pub async fn seed_plain(&self, key: &str, content: &[u8]) {
        self.storage
            .put(key, Bytes::copy_from_slice(content))
            .await
            .expect("failed to seed object");
    }

    /// Issue a GET through the router.
    pub async fn get(&self, uri: &str) -> Response {
        self.get_with_headers(uri, &[]).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Collect a response body into bytes.
#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

/// Assert status and return the body.
#[allow(dead_code)]
pub async fn expect_status(response: Response, status: StatusCode) -> Bytes {
    assert_eq!(response.status(), status);
    body_bytes(response).await
}
