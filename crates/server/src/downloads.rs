//! Download resolution.
//!
//! The resolver turns an [`ArtefactReference`] into the normalized
//! [`Downloads`] descriptor plus, when upstream reported one, the private
//! object locator. Each variant has its own upstream and its own publication
//! rule, but they all converge on the same shape so the handlers have a
//! single redirect-or-stream decision to make.
//!
//! Resolution fails fast: upstream errors are wrapped with the artefact they
//! concern and returned, never retried and never replaced by defaults. An
//! empty download map is a valid answer ("not yet generated"), not an error.

use crate::error::ApiError;
use sluice_clients::{ClientError, DatasetApi, FilterApi, ImageApi, RequestAuth};
use sluice_core::{ArtefactReference, DownloadInfo, Downloads, PrivateLocator};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("resolving {artefact}: {source}")]
    Upstream {
        artefact: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    PrivateUrl(#[from] sluice_core::Error),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Upstream { source, .. } => ApiError::Client(source),
            ResolveError::PrivateUrl(e) => ApiError::Core(e),
        }
    }
}

/// The outcome of resolving one artefact reference.
#[derive(Debug, Default)]
pub struct Resolved {
    /// Available downloads keyed by variant, with the publication state.
    pub downloads: Downloads,
    /// Where the private bytes live, when upstream reported a private copy
    /// for the requested variant.
    pub locator: Option<PrivateLocator>,
}

/// Resolves artefact references against the metadata upstreams.
#[derive(Clone)]
pub struct Resolver {
    dataset: Arc<dyn DatasetApi>,
    filter: Arc<dyn FilterApi>,
    image: Arc<dyn ImageApi>,
}

impl Resolver {
    pub fn new(
        dataset: Arc<dyn DatasetApi>,
        filter: Arc<dyn FilterApi>,
        image: Arc<dyn ImageApi>,
    ) -> Self {
        Self {
            dataset,
            filter,
            image,
        }
    }

    /// Resolve a reference, forwarding the caller's credentials upstream so
    /// unpublished metadata stays visible to authorised callers.
    pub async fn resolve(
        &self,
        auth: &RequestAuth,
        reference: &ArtefactReference,
    ) -> Result<Resolved, ResolveError> {
        let downloads = match reference {
            ArtefactReference::DatasetVersion {
                dataset_id,
                edition,
                version,
                ..
            } => {
                let found = self
                    .dataset
                    .get_version(auth, dataset_id, edition, version)
                    .await
                    .map_err(|source| upstream_error(reference, source))?;
                Downloads {
                    is_published: found.state == "published",
                    available: map_version_downloads(found.downloads),
                }
            }
            ArtefactReference::Instance { instance_id, .. } => {
                let found = self
                    .dataset
                    .get_instance(auth, instance_id)
                    .await
                    .map_err(|source| upstream_error(reference, source))?;
                Downloads {
                    is_published: found.state == "published",
                    available: map_version_downloads(found.downloads),
                }
            }
            ArtefactReference::FilterOutput {
                filter_output_id, ..
            } => {
                let found = self
                    .filter
                    .get_output(auth, filter_output_id)
                    .await
                    .map_err(|source| upstream_error(reference, source))?;
                Downloads {
                    is_published: found.is_published,
                    available: found
                        .downloads
                        .into_iter()
                        .map(|(variant, entry)| {
                            (
                                variant,
                                DownloadInfo {
                                    url: entry.href,
                                    size: entry.size,
                                    public: entry.public,
                                    private: entry.private,
                                    skipped: entry.skipped,
                                },
                            )
                        })
                        .collect(),
                }
            }
            ArtefactReference::Image {
                image_id,
                variant,
                filename,
            } => {
                let found = self
                    .image
                    .get_download_variant(auth, image_id, variant)
                    .await
                    .map_err(|source| upstream_error(reference, source))?;
                // Image variants live at a fixed store location rather than
                // behind an upstream-reported private URL, so the locator is
                // constructed here instead of parsed.
                let locator = PrivateLocator {
                    key: format!("images/{image_id}/{variant}"),
                    filename: filename.clone(),
                };
                let completed = found.state == "completed";
                let mut available = HashMap::new();
                available.insert(
                    variant.clone(),
                    DownloadInfo {
                        url: found.href.clone(),
                        size: found.size.to_string(),
                        public: completed.then(|| found.href),
                        private: Some(locator.key.clone()),
                        skipped: false,
                    },
                );
                return Ok(Resolved {
                    downloads: Downloads {
                        is_published: completed || found.state == "published",
                        available,
                    },
                    locator: Some(locator),
                });
            }
        };

        let locator = downloads.private_locator(reference.variant_key())?;
        Ok(Resolved { downloads, locator })
    }
}

fn map_version_downloads(
    downloads: HashMap<String, sluice_clients::VersionDownload>,
) -> HashMap<String, DownloadInfo> {
    downloads
        .into_iter()
        .map(|(variant, entry)| {
            (
                variant,
                DownloadInfo {
                    url: entry.href,
                    size: entry.size,
                    public: entry.public,
                    private: entry.private,
                    skipped: false,
                },
            )
        })
        .collect()
}

fn upstream_error(reference: &ArtefactReference, source: ClientError) -> ResolveError {
    ResolveError::Upstream {
        artefact: describe(reference),
        source,
    }
}

fn describe(reference: &ArtefactReference) -> String {
    match reference {
        ArtefactReference::DatasetVersion {
            dataset_id,
            edition,
            version,
            format,
        } => format!("dataset {dataset_id}/{edition}/{version} ({format})"),
        ArtefactReference::FilterOutput {
            filter_output_id,
            format,
        } => format!("filter output {filter_output_id} ({format})"),
        ArtefactReference::Image {
            image_id, variant, ..
        } => format!("image {image_id}/{variant}"),
        ArtefactReference::Instance {
            instance_id,
            format,
        } => format!("instance {instance_id} ({format})"),
    }
}
