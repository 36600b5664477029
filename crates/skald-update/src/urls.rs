//! URL construction and IP substitution
//!
//! Channel files and release files are addressed relative to a base URL.
//! When a host is pinned to a pre-resolved address, the original URL is kept
//! next to the address so the request can still identify the host by name.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, UpdateError};

/// Query parameter appended to defeat intermediate caches
pub const NO_CACHE_QUERY_KEY: &str = "noCache";

/// Parse a base URL, making sure its path ends with a slash
///
/// Without the trailing slash a relative join would replace the last path
/// segment instead of appending to it.
pub fn new_base_url(input: &str) -> Result<Url> {
    let mut url = Url::parse(input).map_err(|source| UpdateError::InvalidUrl {
        input: input.to_string(),
        source,
    })?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Resolve `path` against `base`
///
/// A query on the base URL is carried over to the result. Otherwise, when
/// `add_no_cache` is set, a `noCache` parameter with the current time is
/// appended.
pub fn url_from_base(path: &str, base: &Url, add_no_cache: bool) -> Result<Url> {
    let mut url = base.join(path).map_err(|source| UpdateError::InvalidUrl {
        input: path.to_string(),
        source,
    })?;

    match base.query() {
        Some(query) if !query.is_empty() => url.set_query(Some(query)),
        _ if add_no_cache => {
            let stamp = to_base32(chrono::Utc::now().timestamp_millis().max(0) as u64);
            url.set_query(Some(&format!("{}={}", NO_CACHE_QUERY_KEY, stamp)));
        }
        _ => {}
    }

    Ok(url)
}

/// Lowercase base-32 rendering (`0-9a-v`)
fn to_base32(mut value: u64) -> String {
    const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 32) as usize]);
        value /= 32;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// A request target, optionally pinned to a pre-resolved IP address
///
/// `url` always holds the hostname as published in the feed. When `ip` is
/// set, connections go to that address while the hostname is still sent as
/// the `Host` header and used for TLS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUrl {
    pub url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
}

impl TargetUrl {
    /// Target that connects by hostname
    pub fn direct(url: Url) -> Self {
        Self { url, ip: None }
    }

    /// Target that connects to `ip` while addressing `url`'s host
    pub fn pinned(url: Url, ip: IpAddr) -> Self {
        Self { url, ip: Some(ip) }
    }

    /// Whether the hostname has been replaced by an IP address
    pub fn is_substituted(&self) -> bool {
        self.ip.is_some()
    }

    /// Hostname of the original URL
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// URL with the host swapped for the pinned address
    ///
    /// Returns the original URL when no address is pinned.
    pub fn connect_url(&self) -> Url {
        let mut url = self.url.clone();
        if let Some(ip) = self.ip {
            if url.set_ip_host(ip).is_err() {
                return self.url.clone();
            }
        }
        url
    }

    /// Value for the `Host` header: the original host plus any explicit port
    pub fn host_header(&self) -> Option<String> {
        let host = self.url.host_str()?;
        Some(match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            Some(ip) => write!(f, "{} (via {})", self.url, ip),
            None => write!(f, "{}", self.url),
        }
    }
}
