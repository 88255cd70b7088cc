//! Hand-written fakes for the upstream clients.
//!
//! Each fake is seeded through interior mutability so tests can keep an
//! `Arc` handle after the state has been built and adjust upstream answers
//! mid-test.

use async_trait::async_trait;
use sluice_clients::{
    ClientError, ClientResult, DatasetApi, FilesApi, FilterApi, FilterOutput, Identity,
    IdentityApi, ImageApi, ImageDownload, Instance, RequestAuth, SecretStore, TokenType, Version,
};
use sluice_core::files::FileMetadata;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeDataset {
    versions: Mutex<HashMap<String, ClientResult<Version>>>,
    instances: Mutex<HashMap<String, ClientResult<Instance>>>,
    /// When set, `get_version` blocks on this semaphore, letting admission
    /// tests hold requests inside the handler.
    pub hold: Mutex<Option<Arc<Semaphore>>>,
    pub concurrent: AtomicUsize,
    pub peak: AtomicUsize,
}

#[allow(dead_code)]
impl FakeDataset {
    pub fn insert_version(&self, dataset_id: &str, edition: &str, version: &str, found: Version) {
        self.versions.lock().unwrap().insert(
            format!("{dataset_id}/{edition}/{version}"),
            Ok(found),
        );
    }

    pub fn fail_version(
        &self,
        dataset_id: &str,
        edition: &str,
        version: &str,
        error: ClientError,
    ) {
        self.versions.lock().unwrap().insert(
            format!("{dataset_id}/{edition}/{version}"),
            Err(error),
        );
    }

    pub fn insert_instance(&self, instance_id: &str, found: Instance) {
        self.instances
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), Ok(found));
    }

    fn track_entry(&self) {
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn track_exit(&self) {
        self.concurrent.fetch_sub(1, Ordering::SeqCst);
    }
}

fn clone_result<T: Clone>(result: Option<&ClientResult<T>>) -> ClientResult<T> {
    match result {
        Some(Ok(found)) => Ok(found.clone()),
        Some(Err(e)) => Err(clone_error(e)),
        None => Err(ClientError::NotFound("not seeded".to_string())),
    }
}

fn clone_error(error: &ClientError) -> ClientError {
    match error {
        ClientError::NotFound(what) => ClientError::NotFound(what.clone()),
        ClientError::Unauthorized(what) => ClientError::Unauthorized(what.clone()),
        ClientError::Status { status, context } => ClientError::Status {
            status: *status,
            context: context.clone(),
        },
        ClientError::Decode(what) => ClientError::Decode(what.clone()),
        other => ClientError::Decode(other.to_string()),
    }
}

#[async_trait]
impl DatasetApi for FakeDataset {
    async fn get_version(
        &self,
        _auth: &RequestAuth,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> ClientResult<Version> {
        self.track_entry();
        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            let permit = hold.acquire().await.map_err(|_| {
                ClientError::Decode("hold semaphore closed".to_string())
            })?;
            drop(permit);
        }
        let result = clone_result(
            self.versions
                .lock()
                .unwrap()
                .get(&format!("{dataset_id}/{edition}/{version}")),
        );
        self.track_exit();
        result
    }

    async fn get_instance(
        &self,
        _auth: &RequestAuth,
        instance_id: &str,
    ) -> ClientResult<Instance> {
        clone_result(self.instances.lock().unwrap().get(instance_id))
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct FakeFilter {
    outputs: Mutex<HashMap<String, ClientResult<FilterOutput>>>,
}

#[allow(dead_code)]
impl FakeFilter {
    pub fn insert_output(&self, filter_output_id: &str, found: FilterOutput) {
        self.outputs
            .lock()
            .unwrap()
            .insert(filter_output_id.to_string(), Ok(found));
    }

    pub fn fail_output(&self, filter_output_id: &str, error: ClientError) {
        self.outputs
            .lock()
            .unwrap()
            .insert(filter_output_id.to_string(), Err(error));
    }
}

#[async_trait]
impl FilterApi for FakeFilter {
    async fn get_output(
        &self,
        _auth: &RequestAuth,
        filter_output_id: &str,
    ) -> ClientResult<FilterOutput> {
        clone_result(self.outputs.lock().unwrap().get(filter_output_id))
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct FakeImage {
    downloads: Mutex<HashMap<String, ClientResult<ImageDownload>>>,
}

#[allow(dead_code)]
impl FakeImage {
    pub fn insert_download(&self, image_id: &str, variant: &str, found: ImageDownload) {
        self.downloads
            .lock()
            .unwrap()
            .insert(format!("{image_id}/{variant}"), Ok(found));
    }
}

#[async_trait]
impl ImageApi for FakeImage {
    async fn get_download_variant(
        &self,
        _auth: &RequestAuth,
        image_id: &str,
        variant: &str,
    ) -> ClientResult<ImageDownload> {
        clone_result(
            self.downloads
                .lock()
                .unwrap()
                .get(&format!("{image_id}/{variant}")),
        )
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct FakeFiles {
    files: Mutex<HashMap<String, FileMetadata>>,
}

#[allow(dead_code)]
impl FakeFiles {
    pub fn insert(&self, metadata: FileMetadata) {
        self.files
            .lock()
            .unwrap()
            .insert(metadata.path.clone(), metadata);
    }
}

#[async_trait]
impl FilesApi for FakeFiles {
    async fn get_file(&self, _auth_token: &str, path: &str) -> ClientResult<FileMetadata> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("file {path}")))
    }
}

/// Accepts configured tokens, recording which probes ran.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeIdentity {
    user_tokens: Mutex<HashSet<String>>,
    service_tokens: Mutex<HashSet<String>>,
    pub probes: Mutex<Vec<TokenType>>,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn allow_user(&self, token: &str) {
        self.user_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn allow_service(&self, token: &str) {
        self.service_tokens
            .lock()
            .unwrap()
            .insert(token.to_string());
    }
}

#[async_trait]
impl IdentityApi for FakeIdentity {
    async fn check_token_identity(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> ClientResult<Identity> {
        self.probes.lock().unwrap().push(token_type);
        let accepted = match token_type {
            TokenType::User => self.user_tokens.lock().unwrap().contains(token),
            TokenType::Service => self.service_tokens.lock().unwrap().contains(token),
        };
        if accepted {
            Ok(Identity {
                identifier: format!("{token_type:?}-caller"),
            })
        } else {
            Err(ClientError::Unauthorized("token identity".to_string()))
        }
    }
}

/// Serves hex-encoded PSKs, counting reads so tests can assert the store
/// was (or was not) consulted.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeSecrets {
    keys: Mutex<HashMap<String, String>>,
    pub reads: AtomicUsize,
}

#[allow(dead_code)]
impl FakeSecrets {
    pub fn insert(&self, path: &str, hex_key: &str) {
        self.keys
            .lock()
            .unwrap()
            .insert(path.to_string(), hex_key.to_string());
    }
}

#[async_trait]
impl SecretStore for FakeSecrets {
    async fn read_key(&self, path: &str, _field: &str) -> ClientResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.keys
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("secret {path}")))
    }
}
