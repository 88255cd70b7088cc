//! Registered-file metadata and lifecycle states.
//!
//! The file registry is the newer per-file upstream. The gateway only ever
//! reads this metadata; state transitions happen upstream as files are
//! uploaded, processed and published.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a registered file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    /// First chunk uploaded.
    #[serde(rename = "CREATED")]
    Created,
    /// All chunks uploaded.
    #[serde(rename = "UPLOADED")]
    Uploaded,
    /// Published; authorized for public download.
    #[serde(rename = "PUBLISHED")]
    Published,
    /// Available decrypted from the public store/CDN.
    #[serde(rename = "DECRYPTED")]
    Decrypted,
}

impl std::str::FromStr for FileState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(FileState::Created),
            "UPLOADED" => Ok(FileState::Uploaded),
            "PUBLISHED" => Ok(FileState::Published),
            "DECRYPTED" => Ok(FileState::Decrypted),
            other => Err(Error::UnknownFileState(other.to_string())),
        }
    }
}

/// Metadata held by the file registry for one registered file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    #[serde(default)]
    pub is_publishable: bool,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub size_in_bytes: u64,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub licence: String,
    #[serde(default)]
    pub licence_url: String,
    pub state: FileState,
    #[serde(default)]
    pub etag: String,
}

impl FileMetadata {
    /// A file is unpublished until it reaches `PUBLISHED` or `DECRYPTED`.
    pub fn is_unpublished(&self) -> bool {
        !matches!(self.state, FileState::Published | FileState::Decrypted)
    }

    /// The upload has not finished while the file is still `CREATED`.
    pub fn upload_incomplete(&self) -> bool {
        self.state == FileState::Created
    }

    /// Basename of the registered path, used for the attachment filename.
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Size in bytes formatted for the `Content-Length` header.
    pub fn content_length(&self) -> String {
        self.size_in_bytes.to_string()
    }
}
