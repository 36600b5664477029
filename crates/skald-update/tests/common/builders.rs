//! Fluent builder for metadata documents

use std::collections::BTreeMap;

use skald_update::{PackageFileInfo, PlatformMetadata, UpdateFileInfo, UpdateInfo};

use super::constants::*;

/// Builder for `UpdateInfo` values
pub struct UpdateInfoBuilder {
    info: UpdateInfo,
}

impl UpdateInfoBuilder {
    pub fn new() -> Self {
        Self {
            info: UpdateInfo {
                version: VERSION_2_1_0.to_string(),
                files: Vec::new(),
                path: None,
                sha512: None,
                sha2: None,
                release_name: None,
                release_notes: None,
                release_date: None,
                staging_percentage: None,
                platform: PlatformMetadata::Generic,
                extra: BTreeMap::new(),
            },
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.info.version = version.to_string();
        self
    }

    pub fn file(mut self, url: &str) -> Self {
        self.info.files.push(UpdateFileInfo::new(url));
        self
    }

    /// Add a file entry carrying an extra key
    pub fn file_with_extra(mut self, url: &str, key: &str, value: serde_json::Value) -> Self {
        let mut file = UpdateFileInfo::new(url);
        file.extra.insert(key.to_string(), value);
        self.info.files.push(file);
        self
    }

    pub fn package(mut self, arch: &str, path: &str) -> Self {
        let package = PackageFileInfo {
            path: path.to_string(),
            sha512: Some(format!("sha512-{}", arch)),
            size: Some(4096),
            header_size: None,
            extra: BTreeMap::new(),
        };

        match &mut self.info.platform {
            PlatformMetadata::Windows(packages) => {
                packages.insert(arch.to_string(), package);
            }
            PlatformMetadata::Generic => {
                let mut packages = BTreeMap::new();
                packages.insert(arch.to_string(), package);
                self.info.platform = PlatformMetadata::Windows(packages);
            }
        }
        self
    }

    /// Setup file, blockmap and x64/ia32 packages
    pub fn with_windows_release(self) -> Self {
        self.file(SETUP_EXE)
            .file(BLOCKMAP)
            .package("x64", PACKAGE_X64)
            .package("ia32", PACKAGE_IA32)
    }

    pub fn build(self) -> UpdateInfo {
        self.info
    }

    /// Render as a YAML channel document
    pub fn to_yaml(self) -> String {
        serde_yaml_ng::to_string(&self.info).expect("Failed to serialize update info")
    }
}

impl Default for UpdateInfoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
