//! Release file resolution
//!
//! Turns the relative file references of a parsed metadata document into
//! absolute download targets, pinning each one to the address cached for
//! its host during the metadata fetch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::dns::IpCache;
use crate::error::Result;
use crate::info::{ExtraFields, PackageFileInfo, UpdateFileInfo, UpdateInfo};
use crate::platform::Arch;
use crate::urls::{url_from_base, TargetUrl};

/// A file entry resolved to an absolute download target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFileInfo {
    pub url: TargetUrl,

    /// The source entry, unchanged
    pub info: UpdateFileInfo,

    /// Installer package for the running architecture
    ///
    /// Only ever set on the first entry of a resolved list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_info: Option<ResolvedPackageInfo>,
}

impl ResolvedFileInfo {
    /// Headers to send when downloading this file
    ///
    /// Carries the original `Host` when the URL is pinned to an address.
    pub fn download_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if self.url.is_substituted() {
            if let Some(host) = self.url.host_header() {
                headers.insert("host".to_string(), host);
            }
        }
        headers
    }
}

/// An installer package with its path resolved like any file entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPackageInfo {
    pub path: TargetUrl,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_size: Option<u64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ResolvedPackageInfo {
    fn new(package: &PackageFileInfo, path: TargetUrl) -> Self {
        Self {
            path,
            sha512: package.sha512.clone(),
            size: package.size,
            header_size: package.header_size,
            extra: package.extra.clone(),
        }
    }
}

/// Resolve every file of `info` against `base`
///
/// Output order matches the document. When the document carries a package
/// map, the package for `arch` (or the `ia32` fallback) is attached to the
/// first entry.
pub fn resolve_files(
    info: &UpdateInfo,
    base: &Url,
    ip_cache: &IpCache,
    arch: &Arch,
) -> Result<Vec<ResolvedFileInfo>> {
    let mut resolved = info
        .file_list()
        .into_iter()
        .map(|file| {
            let url = url_from_base(&file.url, base, false)?;
            Ok(ResolvedFileInfo {
                url: ip_cache.substitute(url),
                info: file,
                package_info: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(package) = info.package_for(arch) {
        let path = ip_cache.substitute(url_from_base(&package.path, base, false)?);
        match resolved.first_mut() {
            Some(first) => {
                debug!(arch = %arch, path = %path, "Attaching installer package");
                first.package_info = Some(ResolvedPackageInfo::new(package, path));
            }
            None => warn!(
                arch = %arch,
                path = %path,
                "Installer package found but no files to attach it to"
            ),
        }
    }

    debug!(count = resolved.len(), version = %info.version, "Resolved update files");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::new_base_url;
    use std::net::IpAddr;

    const DOC: &str = "
version: 1.0.0
files:
  - url: App-Setup-1.0.0.exe
  - url: https://cdn.example.net/App-1.0.0.blockmap
packages:
  x64:
    path: App-1.0.0-x64.nsis.7z
";

    fn info() -> UpdateInfo {
        UpdateInfo::parse(DOC.as_bytes(), "latest.yml", "https://example.com/latest.yml").unwrap()
    }

    #[test]
    fn test_files_resolved_in_order() {
        let base = new_base_url("https://example.com/app").unwrap();
        let files = resolve_files(&info(), &base, &IpCache::new(), &Arch::X64).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0].url.url.as_str(),
            "https://example.com/app/App-Setup-1.0.0.exe"
        );
        assert_eq!(
            files[1].url.url.as_str(),
            "https://cdn.example.net/App-1.0.0.blockmap"
        );
        assert!(files.iter().all(|f| !f.url.is_substituted()));
    }

    #[test]
    fn test_cached_host_pinned_other_host_untouched() {
        let base = new_base_url("https://example.com/app").unwrap();
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let mut cache = IpCache::new();
        cache.record("example.com", ip);

        let files = resolve_files(&info(), &base, &cache, &Arch::X64).unwrap();

        assert_eq!(files[0].url.ip, Some(ip));
        assert_eq!(
            files[0].download_headers().get("host").map(String::as_str),
            Some("example.com")
        );
        assert_eq!(files[1].url.ip, None);
        assert!(files[1].download_headers().is_empty());

        let package = files[0].package_info.as_ref().unwrap();
        assert_eq!(package.path.ip, Some(ip));
        assert_eq!(
            package.path.url.as_str(),
            "https://example.com/app/App-1.0.0-x64.nsis.7z"
        );
    }

    #[test]
    fn test_package_only_on_first_entry() {
        let base = new_base_url("https://example.com/app").unwrap();
        let files = resolve_files(&info(), &base, &IpCache::new(), &Arch::X64).unwrap();

        assert!(files[0].package_info.is_some());
        assert!(files[1].package_info.is_none());
    }

    #[test]
    fn test_no_package_without_match_or_fallback() {
        let base = new_base_url("https://example.com/app").unwrap();
        let files = resolve_files(&info(), &base, &IpCache::new(), &Arch::Arm64).unwrap();
        assert!(files.iter().all(|f| f.package_info.is_none()));
    }

    #[test]
    fn test_package_dropped_when_no_files() {
        let info = UpdateInfo::parse(
            b"version: 1.0.0\npackages:\n  x64:\n    path: a.7z\n",
            "latest.yml",
            "https://example.com/latest.yml",
        )
        .unwrap();
        let base = new_base_url("https://example.com/app").unwrap();

        let files = resolve_files(&info, &base, &IpCache::new(), &Arch::X64).unwrap();
        assert!(files.is_empty());
    }
}
