//! Application state.

use crate::admission::AdmissionGate;
use sluice_clients::{DatasetApi, FilesApi, FilterApi, IdentityApi, ImageApi, SecretStore};
use sluice_core::AppConfig;
use sluice_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state. Cheap to clone; all fields are reference
/// counted and the admission gate shares its slot pool across clones.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Dataset API client (versions and instances).
    pub dataset: Arc<dyn DatasetApi>,
    /// Filter API client.
    pub filter: Arc<dyn FilterApi>,
    /// Image API client.
    pub image: Arc<dyn ImageApi>,
    /// File-registry client.
    pub files: Arc<dyn FilesApi>,
    /// Identity API client.
    pub identity: Arc<dyn IdentityApi>,
    /// Secret store holding per-file PSKs.
    pub secrets: Arc<dyn SecretStore>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Admission gate bounding the download handlers.
    pub admission: AdmissionGate,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        dataset: Arc<dyn DatasetApi>,
        filter: Arc<dyn FilterApi>,
        image: Arc<dyn ImageApi>,
        files: Arc<dyn FilesApi>,
        identity: Arc<dyn IdentityApi>,
        secrets: Arc<dyn SecretStore>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        let admission = AdmissionGate::new(config.server.max_concurrent_handlers);
        Self {
            config: Arc::new(config),
            dataset,
            filter,
            image,
            files,
            identity,
            secrets,
            storage,
            admission,
        }
    }
}
