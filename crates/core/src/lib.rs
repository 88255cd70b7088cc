//! Core domain types and shared logic for the sluice download gateway.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Artefact references (dataset versions, filter outputs, images and
//!   processing instances; registered files are addressed by their verbatim
//!   path instead)
//! - Requested download formats and route-extension parsing
//! - The normalized download descriptor that all resolution paths converge on
//! - Registered-file metadata and its lifecycle states
//! - Application configuration

pub mod artefact;
pub mod config;
pub mod error;
pub mod files;

pub use artefact::{ArtefactReference, DownloadInfo, Downloads, Format, PrivateLocator};
pub use config::{AppConfig, ServerConfig, StorageConfig, UpstreamConfig, VaultConfig};
pub use error::{Error, Result};
pub use files::{FileMetadata, FileState};
