//! Metadata document fetch
//!
//! Builds the channel file URL, optionally pins its host to a resolver
//! supplied address and downloads the document with the `metadata` retry
//! policy. Only refused connections are retried; a 404 means the channel
//! does not exist and ends the fetch at once.

use std::collections::BTreeMap;

use skald_core::retry::{ClosurePredicate, RetryError, RetryExecutor, TracingObserver};
use skald_core::types::{RetryPolicy, METADATA_RETRY_OPERATION};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::channel::{channel_filename, ChannelName};
use crate::dns::{DnsResolver, IpCache};
use crate::error::{Result, UpdateError};
use crate::info::UpdateInfo;
use crate::transport::{HttpTransport, RequestOptions, TransportError};
use crate::urls::{url_from_base, TargetUrl};

/// Outcome of a metadata fetch
///
/// Owns the address cache of this check; pass it on to file resolution.
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub update_info: UpdateInfo,
    pub ip_cache: IpCache,
    /// File name of the channel document, e.g. `latest-mac.yml`
    pub channel_file: String,
    pub channel_url: TargetUrl,
}

/// Fetches and parses a channel metadata document
pub struct MetadataFetcher<'a, T: ?Sized> {
    transport: &'a T,
    dns_resolver: Option<&'a dyn DnsResolver>,
    retry_policy: RetryPolicy,
    request_headers: BTreeMap<String, String>,
    add_no_cache_query: bool,
}

impl<'a, T> MetadataFetcher<'a, T>
where
    T: HttpTransport + ?Sized,
{
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            dns_resolver: None,
            retry_policy: RetryPolicy::metadata_fetch(),
            request_headers: BTreeMap::new(),
            add_no_cache_query: false,
        }
    }

    pub fn with_dns_resolver(mut self, resolver: Option<&'a dyn DnsResolver>) -> Self {
        self.dns_resolver = resolver;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Extra request headers; a `Host` entry is ignored
    pub fn with_request_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.request_headers = headers
            .into_iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("host"))
            .collect();
        self
    }

    pub fn with_add_no_cache_query(mut self, enabled: bool) -> Self {
        self.add_no_cache_query = enabled;
        self
    }

    /// Fetch the metadata document of `channel` below `base`
    ///
    /// Every call starts with an empty address cache.
    pub async fn fetch_latest(
        &self,
        base: &Url,
        channel: &ChannelName,
        cancel: &CancellationToken,
    ) -> Result<UpdateCheck> {
        let channel_file = channel_filename(channel);
        let url = url_from_base(&channel_file, base, self.add_no_cache_query)?;

        let mut ip_cache = IpCache::new();
        let channel_url = self.pin(url, &mut ip_cache, cancel).await?;
        let url_str = channel_url.url.to_string();

        debug!(channel = %channel, url = %channel_url, "Fetching update info");

        let options =
            RequestOptions::get(channel_url.clone()).with_headers(self.request_headers.clone());

        let executor = RetryExecutor::new(self.retry_policy.clone())
            .with_jitter(false)
            .with_predicate(ClosurePredicate::new(|err: &TransportError| {
                err.is_connection_refused()
            }))
            .with_observer(TracingObserver::new(METADATA_RETRY_OPERATION))
            .with_cancellation(cancel.clone());

        let body = executor
            .execute(|| self.transport.request(options.clone(), cancel))
            .await
            .map_err(|err| classify(err, &channel_file))?;

        let update_info = UpdateInfo::parse(&body, &channel_file, &url_str)?;

        info!(
            channel = %channel,
            version = %update_info.version,
            "Fetched update info"
        );

        Ok(UpdateCheck {
            update_info,
            ip_cache,
            channel_file,
            channel_url,
        })
    }

    /// Ask the resolver for the host of `url` and record the answer
    ///
    /// Resolver failures only disable pinning for this check.
    async fn pin(
        &self,
        url: Url,
        ip_cache: &mut IpCache,
        cancel: &CancellationToken,
    ) -> Result<TargetUrl> {
        let Some(resolver) = self.dns_resolver else {
            return Ok(TargetUrl::direct(url));
        };
        let Some(host) = url.host_str().map(str::to_string) else {
            return Ok(TargetUrl::direct(url));
        };

        let answer = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpdateError::Cancelled),
            answer = resolver.resolve(&host) => answer,
        };

        match answer {
            Ok(Some(ip)) => {
                ip_cache.record(&host, ip);
                debug!(host = %host, ip = %ip, "Pinning metadata host");
                Ok(TargetUrl::pinned(url, ip))
            }
            Ok(None) => Ok(TargetUrl::direct(url)),
            Err(e) => {
                warn!(host = %host, error = %e, "DNS resolver failed, connecting by hostname");
                Ok(TargetUrl::direct(url))
            }
        }
    }
}

/// Map a failed fetch onto the update error taxonomy
fn classify(err: RetryError<TransportError>, channel_file: &str) -> UpdateError {
    let source = match err {
        RetryError::Exhausted { source, .. } | RetryError::NonRetryable(source) => source,
        RetryError::Cancelled { .. } => return UpdateError::Cancelled,
    };

    match source {
        TransportError::Cancelled => UpdateError::Cancelled,
        e if e.is_not_found() => UpdateError::channel_file_not_found(channel_file, e.to_string()),
        e => UpdateError::Transport(e),
    }
}
