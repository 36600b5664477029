//! Host pinning
//!
//! A [`DnsResolver`] may supply an address for a hostname. Addresses used
//! during one update check are recorded in an [`IpCache`] that lives only as
//! long as that check, so a later check never reuses a stale address.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use async_trait::async_trait;
use skald_core::types::DnsConfig;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::urls::TargetUrl;

/// Errors reported by a DNS resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// The resolver backend cannot be used right now
    #[error("DNS resolver unavailable: {0}")]
    Unavailable(String),

    /// The lookup itself failed
    #[error("DNS lookup for {host} failed: {message}")]
    Lookup { host: String, message: String },
}

/// Supplies pre-resolved addresses for hostnames
///
/// `Ok(None)` means the resolver has no address for the host and the request
/// should go out by name.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<Option<IpAddr>, DnsError>;
}

/// Resolver backed by a fixed hostname to address table
#[derive(Debug, Clone, Default)]
pub struct StaticDnsResolver {
    entries: HashMap<String, IpAddr>,
}

impl StaticDnsResolver {
    pub fn new(entries: impl IntoIterator<Item = (String, IpAddr)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(host, ip)| (host.to_ascii_lowercase(), ip))
                .collect(),
        }
    }

    /// Build a resolver from the `dns` config section
    ///
    /// Returns `None` when pinning is disabled or no overrides are set.
    pub fn from_config(config: &DnsConfig) -> Option<Self> {
        if !config.enabled || config.overrides.is_empty() {
            return None;
        }
        Some(Self::from(&config.overrides))
    }

    /// Add or replace an entry
    pub fn with_entry(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.entries.insert(host.into().to_ascii_lowercase(), ip);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&BTreeMap<String, IpAddr>> for StaticDnsResolver {
    fn from(overrides: &BTreeMap<String, IpAddr>) -> Self {
        Self::new(overrides.iter().map(|(host, ip)| (host.clone(), *ip)))
    }
}

#[async_trait]
impl DnsResolver for StaticDnsResolver {
    async fn resolve(&self, host: &str) -> Result<Option<IpAddr>, DnsError> {
        Ok(self.entries.get(&host.to_ascii_lowercase()).copied())
    }
}

/// Hostname to address map for a single update check
///
/// Filled while fetching the metadata document and read while resolving the
/// release files of the same check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpCache {
    entries: HashMap<String, IpAddr>,
}

impl IpCache {
    /// Empty cache for a new check
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the address for `host`
    ///
    /// The first recorded address wins. Returns whether an entry was added.
    pub fn record(&mut self, host: &str, ip: IpAddr) -> bool {
        let key = host.to_ascii_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, ip);
        true
    }

    pub fn get(&self, host: &str) -> Option<IpAddr> {
        self.entries.get(&host.to_ascii_lowercase()).copied()
    }

    /// Pin `url` to the cached address of its host, if any
    pub fn substitute(&self, url: Url) -> TargetUrl {
        match url.host_str().and_then(|host| self.get(host)) {
            Some(ip) => {
                debug!(
                host = url.host_str().unwrap_or_default(),
                %ip,
                "Substituting cached address"
            );
                TargetUrl::pinned(url, ip)
            }
            None => TargetUrl::direct(url),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
