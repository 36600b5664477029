//! Caller-facing update provider
//!
//! `GenericProvider` serves updates from a plain HTTP(S) directory. An update
//! check is two calls: [`GenericProvider::get_latest_version`] fetches the
//! channel document and returns an [`UpdateCheck`], and
//! [`GenericProvider::resolve_files`] turns that check into download
//! targets. The provider holds no per-check state, so concurrent checks on
//! one provider never share pinned addresses.

use std::collections::BTreeMap;
use std::sync::Arc;

use skald_core::config::{validate_arch_name, validate_channel_name};
use skald_core::types::{RetryPolicy, UpdaterConfig, METADATA_RETRY_OPERATION};
use skald_core::Error as ConfigError;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::channel::{resolve_channel, ChannelName};
use crate::dns::{DnsResolver, StaticDnsResolver};
use crate::error::Result;
use crate::fetcher::{MetadataFetcher, UpdateCheck};
use crate::platform::{Arch, RuntimeTarget};
use crate::resolver::{resolve_files, ResolvedFileInfo};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::urls::new_base_url;

/// Update provider for a generic HTTP server
pub struct GenericProvider<T> {
    base_url: Url,
    transport: T,
    dns_resolver: Option<Arc<dyn DnsResolver>>,
    channel: Option<String>,
    target: RuntimeTarget,
    add_no_cache_query: bool,
    request_headers: BTreeMap<String, String>,
    retry_policy: RetryPolicy,
}

impl GenericProvider<ReqwestTransport> {
    /// Create a provider from a loaded updater configuration
    pub fn from_config(config: &UpdaterConfig) -> Result<Self> {
        let feed_url = config
            .feed
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::invalid_config("feed.url is not set"))?;

        if let Some(channel) = config.feed.channel.as_deref().filter(|c| !c.is_empty()) {
            validate_channel_name(channel)?;
        }

        let mut target = RuntimeTarget::current();
        if let Some(arch) = config.feed.arch.as_deref().filter(|a| !a.is_empty()) {
            validate_arch_name(arch)?;
            target.arch = arch.parse().unwrap_or(Arch::Other(arch.to_string()));
        }

        let transport = ReqwestTransport::new(&config.network)?;

        let dns_resolver = StaticDnsResolver::from_config(&config.dns)
            .map(|resolver| Arc::new(resolver) as Arc<dyn DnsResolver>);

        Ok(Self::new(feed_url, transport)?
            .with_channel(config.feed.channel.clone())
            .with_runtime_target(target)
            .with_add_no_cache_query(config.feed.add_no_cache_query)
            .with_request_headers(config.feed.request_headers.clone())
            .with_retry_policy(config.retry_policy(METADATA_RETRY_OPERATION))
            .with_dns_resolver(dns_resolver))
    }
}

impl<T: HttpTransport> GenericProvider<T> {
    /// Create a provider for `base_url` without DNS pinning
    pub fn new(base_url: &str, transport: T) -> Result<Self> {
        Ok(Self {
            base_url: new_base_url(base_url)?,
            transport,
            dns_resolver: None,
            channel: None,
            target: RuntimeTarget::current(),
            add_no_cache_query: false,
            request_headers: BTreeMap::new(),
            retry_policy: RetryPolicy::metadata_fetch(),
        })
    }

    /// Set the resolver consulted for the metadata host
    ///
    /// `None` disables pinning.
    pub fn with_dns_resolver(mut self, resolver: Option<Arc<dyn DnsResolver>>) -> Self {
        self.dns_resolver = resolver;
        self
    }

    /// Set the configured default channel
    ///
    /// Checked for URL safety when an update check starts.
    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    /// Resolve channels and packages for another platform or architecture
    pub fn with_runtime_target(mut self, target: RuntimeTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_add_no_cache_query(mut self, enabled: bool) -> Self {
        self.add_no_cache_query = enabled;
        self
    }

    pub fn with_request_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Base URL, always ending with a slash
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn runtime_target(&self) -> &RuntimeTarget {
        &self.target
    }

    /// Channel a check with `channel_override` would use
    pub fn channel(&self, channel_override: Option<&str>) -> ChannelName {
        resolve_channel(self.channel.as_deref(), channel_override, &self.target)
    }

    /// Headers for downloads served from the base host
    pub fn file_extra_download_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(host) = self.base_url.host_str() {
            headers.insert("host".to_string(), host.to_string());
        }
        headers
    }

    /// Fetch the metadata document of the selected channel
    ///
    /// `channel_override` takes precedence over the configured channel.
    /// Cancelling `cancel` aborts the request and any pending retry.
    pub async fn get_latest_version(
        &self,
        channel_override: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<UpdateCheck> {
        self.check_channel_inputs(channel_override)?;
        let channel = self.channel(channel_override);

        MetadataFetcher::new(&self.transport)
            .with_dns_resolver(self.dns_resolver.as_deref())
            .with_retry_policy(self.retry_policy.clone())
            .with_request_headers(self.request_headers.clone())
            .with_add_no_cache_query(self.add_no_cache_query)
            .fetch_latest(&self.base_url, &channel, cancel)
            .await
    }

    /// Channel names and the architecture key must be plain path segments
    fn check_channel_inputs(&self, channel_override: Option<&str>) -> Result<()> {
        let channels = [channel_override, self.channel.as_deref()];
        for channel in channels.into_iter().flatten().filter(|c| !c.is_empty()) {
            validate_channel_name(channel)?;
        }
        if let Arch::Other(key) = &self.target.arch {
            validate_arch_name(key)?;
        }
        Ok(())
    }

    /// Resolve the files of a completed check into download targets
    ///
    /// Uses the addresses pinned during that check only.
    pub fn resolve_files(&self, check: &UpdateCheck) -> Result<Vec<ResolvedFileInfo>> {
        debug!(
            channel_file = %check.channel_file,
            pinned_hosts = check.ip_cache.len(),
            "Resolving update files"
        );
        resolve_files(
            &check.update_info,
            &self.base_url,
            &check.ip_cache,
            &self.target.arch,
        )
    }
}
