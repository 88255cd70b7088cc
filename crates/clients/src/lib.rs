//! Typed clients for the upstream services the sluice gateway consumes.
//!
//! Each upstream is exposed as a narrow capability trait so the resolver,
//! streamer and handlers can be exercised against substitutable fakes:
//! - [`DatasetApi`] — dataset versions and processing instances
//! - [`FilterApi`] — filter-output jobs
//! - [`ImageApi`] — image download variants
//! - [`FilesApi`] — the per-file registry
//! - [`IdentityApi`] — token verification
//! - [`SecretStore`] — per-file pre-shared keys
//!
//! Concrete `reqwest` adapters are constructed at the boundary and injected
//! by composition.

pub mod dataset;
pub mod error;
pub mod files;
pub mod filter;
pub mod http;
pub mod identity;
pub mod image;
pub mod vault;

pub use dataset::{DatasetApi, DatasetApiClient, Instance, Version, VersionDownload};
pub use error::{ClientError, ClientResult};
pub use files::{FilesApi, FilesApiClient};
pub use filter::{FilterApi, FilterApiClient, FilterDownload, FilterOutput};
pub use http::{RequestAuth, ServiceAuth};
pub use identity::{Identity, IdentityApi, IdentityApiClient, TokenType};
pub use image::{ImageApi, ImageApiClient, ImageDownload};
pub use vault::{SecretStore, VaultClient};
