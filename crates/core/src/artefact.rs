//! Artefact references and the normalized download descriptor.
//!
//! An [`ArtefactReference`] names a downloadable unit exactly as it appears in
//! a request path. Resolution maps every variant onto the same [`Downloads`]
//! shape so the gateway has a single public/private decision to make.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Requested download format, selected by the route extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Xls,
    Csvw,
    Txt,
}

/// Route extensions paired with their format, longest suffix first so that
/// `.csv-metadata.json` is not mistaken for a bare `.json` or `.csv` request.
const EXTENSIONS: &[(&str, Format)] = &[
    (".csv-metadata.json", Format::Csvw),
    (".xlsx", Format::Xls),
    (".csv", Format::Csv),
    (".txt", Format::Txt),
];

impl Format {
    /// The key under which upstream download maps carry this format.
    pub fn variant_key(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Xls => "xls",
            Format::Csvw => "csvw",
            Format::Txt => "txt",
        }
    }

    /// Split a path segment such as `4.csv` or `4.csv-metadata.json` into its
    /// stem and format. The router cannot match suffixed parameters directly,
    /// so the final segment is parsed by hand.
    pub fn split_suffixed(segment: &str) -> Result<(&str, Format)> {
        for (ext, format) in EXTENSIONS {
            if let Some(stem) = segment.strip_suffix(ext)
                && !stem.is_empty()
            {
                return Ok((stem, *format));
            }
        }
        Err(Error::UnknownFormat(segment.to_string()))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.variant_key())
    }
}

/// A reference to one downloadable artefact, parsed from the request path.
/// Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtefactReference {
    /// An export of a dataset edition/version.
    DatasetVersion {
        dataset_id: String,
        edition: String,
        version: String,
        format: Format,
    },
    /// The output of a filter job.
    FilterOutput {
        filter_output_id: String,
        format: Format,
    },
    /// A variant of a published image.
    Image {
        image_id: String,
        variant: String,
        filename: String,
    },
    /// An export of a processing instance.
    Instance { instance_id: String, format: Format },
}

impl ArtefactReference {
    /// The download-map key this reference selects.
    pub fn variant_key(&self) -> &str {
        match self {
            ArtefactReference::DatasetVersion { format, .. }
            | ArtefactReference::FilterOutput { format, .. }
            | ArtefactReference::Instance { format, .. } => format.variant_key(),
            ArtefactReference::Image { variant, .. } => variant,
        }
    }
}

/// One entry of an available-downloads map, carried verbatim from upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    #[serde(rename = "href", default)]
    pub url: String,
    #[serde(default)]
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

/// The normalized result of resolving an artefact reference.
///
/// Every resolver variant converges on this shape: a map of available
/// downloads keyed by format/variant name plus the publication state. An
/// empty map is valid and means "not yet available", not an error.
#[derive(Clone, Debug, Default)]
pub struct Downloads {
    pub available: HashMap<String, DownloadInfo>,
    pub is_published: bool,
}

impl Downloads {
    /// Returns the public URL for the requested variant if the artefact is
    /// published and upstream reported one. The gateway prefers redirecting
    /// over streaming whenever this returns a value.
    pub fn public_link(&self, variant: &str) -> Option<&str> {
        if !self.is_published {
            return None;
        }
        self.available
            .get(variant)?
            .public
            .as_deref()
            .filter(|p| !p.is_empty())
    }

    /// Returns the private locator for the requested variant, derived from
    /// the private URL upstream reported. A malformed private URL is a
    /// resolution error, not a default.
    pub fn private_locator(&self, variant: &str) -> Result<Option<PrivateLocator>> {
        match self
            .available
            .get(variant)
            .and_then(|info| info.private.as_deref())
            .filter(|p| !p.is_empty())
        {
            Some(private) => PrivateLocator::from_private_url(private).map(Some),
            None => Ok(None),
        }
    }
}

/// Where the bytes of a private artefact live: the object-store key and the
/// basename used to look up its decryption key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateLocator {
    /// Object-store key (URL path without the leading slash).
    pub key: String,
    /// Basename of the path, used for the PSK lookup.
    pub filename: String,
}

impl PrivateLocator {
    /// Derive the locator from a private URL such as
    /// `https://bucket.example/datasets/my-file.csv`.
    pub fn from_private_url(private: &str) -> Result<Self> {
        let parsed =
            Url::parse(private).map_err(|e| Error::InvalidPrivateUrl(format!("{private}: {e}")))?;
        let path = parsed.path();
        let key = path.trim_start_matches('/').to_string();
        let filename = path.rsplit('/').next().unwrap_or_default().to_string();
        if key.is_empty() || filename.is_empty() {
            return Err(Error::InvalidPrivateUrl(format!(
                "no object key in private url: {private}"
            )));
        }
        Ok(Self { key, filename })
    }
}
