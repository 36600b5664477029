//! Metadata document model
//!
//! The channel file is a YAML document published next to the release files:
//!
//! ```yaml
//! version: 1.4.0
//! files:
//!   - url: App-Setup-1.4.0.exe
//!     sha512: 7Q3yW...
//!     size: 73482912
//! releaseDate: '2024-05-02T09:12:44.000Z'
//! ```
//!
//! Windows web installers add a `packages` map keyed by architecture. Keys
//! this model does not name are kept in `extra` maps so nothing published in
//! the feed is lost between parsing and resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, UpdateError};
use crate::platform::Arch;

/// Unknown keys carried through unchanged
pub type ExtraFields = BTreeMap<String, Value>;

/// A downloadable file listed in the metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileInfo {
    /// File reference, relative to the base URL or absolute
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,

    /// Legacy SHA-256 checksum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_map_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin_rights_required: Option<bool>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl UpdateFileInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sha512: None,
            sha2: None,
            size: None,
            block_map_size: None,
            is_admin_rights_required: None,
            extra: ExtraFields::new(),
        }
    }
}

/// Installer package for one architecture (Windows web installers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFileInfo {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_size: Option<u64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One entry of a multi-version release notes list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNoteInfo {
    pub version: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Release notes, either a single text or one note per version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseNotes {
    Text(String),
    Entries(Vec<ReleaseNoteInfo>),
}

/// Platform-specific extension of the metadata document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlatformMetadata {
    /// No platform extension
    #[default]
    Generic,
    /// Windows metadata with an architecture to package map
    Windows(BTreeMap<String, PackageFileInfo>),
}

/// Parsed channel metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UpdateInfoDocument", into = "UpdateInfoDocument")]
pub struct UpdateInfo {
    pub version: String,
    pub files: Vec<UpdateFileInfo>,

    /// Legacy single-file form
    pub path: Option<String>,
    pub sha512: Option<String>,
    pub sha2: Option<String>,

    pub release_name: Option<String>,
    pub release_notes: Option<ReleaseNotes>,
    pub release_date: Option<String>,
    pub staging_percentage: Option<f64>,

    pub platform: PlatformMetadata,

    pub extra: ExtraFields,
}

impl UpdateInfo {
    /// Parse a metadata document body
    ///
    /// `channel_file` and `url` only feed the error message.
    pub fn parse(body: &[u8], channel_file: &str, url: &str) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(UpdateError::invalid_update_info(
                channel_file,
                url,
                "empty response body",
            ));
        }

        serde_yaml_ng::from_slice(body).map_err(|e| {
            UpdateError::invalid_update_info(
                channel_file,
                url,
                format!("{}, rawData: {}", e, String::from_utf8_lossy(body)),
            )
        })
    }

    /// Architecture to package map, if this document carries one
    pub fn package_map(&self) -> Option<&BTreeMap<String, PackageFileInfo>> {
        match &self.platform {
            PlatformMetadata::Windows(packages) => Some(packages),
            PlatformMetadata::Generic => None,
        }
    }

    /// Package for `arch`, falling back to the `ia32` package
    pub fn package_for(&self, arch: &Arch) -> Option<&PackageFileInfo> {
        let packages = self.package_map()?;
        packages
            .get(arch.key())
            .or_else(|| packages.get(Arch::FALLBACK_PACKAGE_KEY))
    }

    /// Files to download
    ///
    /// Uses `files` when present, otherwise the legacy `path` entry. A
    /// document with neither yields an empty list.
    pub fn file_list(&self) -> Vec<UpdateFileInfo> {
        if !self.files.is_empty() {
            return self.files.clone();
        }

        match &self.path {
            Some(path) => {
                let mut file = UpdateFileInfo::new(path.clone());
                file.sha512 = self.sha512.clone();
                file.sha2 = self.sha2.clone();
                vec![file]
            }
            None => {
                warn!(version = %self.version, "Update info lists no files");
                Vec::new()
            }
        }
    }

    /// Parsed semantic version, ignoring a leading `v`
    pub fn semver(&self) -> std::result::Result<semver::Version, semver::Error> {
        semver::Version::parse(self.version.trim_start_matches('v'))
    }
}

/// Wire shape of the metadata document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInfoDocument {
    version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<UpdateFileInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha512: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_notes: Option<ReleaseNotes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    staging_percentage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    packages: Option<BTreeMap<String, PackageFileInfo>>,

    #[serde(flatten)]
    extra: ExtraFields,
}

impl From<UpdateInfoDocument> for UpdateInfo {
    fn from(doc: UpdateInfoDocument) -> Self {
        let platform = match doc.packages {
            Some(packages) => PlatformMetadata::Windows(packages),
            None => PlatformMetadata::Generic,
        };

        Self {
            version: doc.version,
            files: doc.files,
            path: doc.path,
            sha512: doc.sha512,
            sha2: doc.sha2,
            release_name: doc.release_name,
            release_notes: doc.release_notes,
            release_date: doc.release_date,
            staging_percentage: doc.staging_percentage,
            platform,
            extra: doc.extra,
        }
    }
}

impl From<UpdateInfo> for UpdateInfoDocument {
    fn from(info: UpdateInfo) -> Self {
        let packages = match info.platform {
            PlatformMetadata::Windows(packages) => Some(packages),
            PlatformMetadata::Generic => None,
        };

        Self {
            version: info.version,
            files: info.files,
            path: info.path,
            sha512: info.sha512,
            sha2: info.sha2,
            release_name: info.release_name,
            release_notes: info.release_notes,
            release_date: info.release_date,
            staging_percentage: info.staging_percentage,
            packages,
            extra: info.extra,
        }
    }
}
