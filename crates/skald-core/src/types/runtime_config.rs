//! Runtime configuration types for the update feed client
//!
//! These types define configuration that controls where update metadata is
//! fetched from, how requests are issued, how failed fetches are retried and
//! which hostnames may be pinned to pre-resolved addresses.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

/// Name of the retry policy used for metadata document fetches
pub const METADATA_RETRY_OPERATION: &str = "metadata";

/// Complete updater configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdaterConfig {
    /// Update feed location and channel selection
    #[serde(default)]
    pub feed: FeedConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,

    /// Hostname pinning
    #[serde(default)]
    pub dns: DnsConfig,
}

impl UpdaterConfig {
    /// Retry policy for a named operation, falling back to the default policy
    pub fn retry_policy(&self, operation: &str) -> RetryPolicy {
        self.retry_policies
            .operations
            .get(operation)
            .cloned()
            .unwrap_or_else(|| self.retry_policies.default.clone())
    }
}

/// Update feed configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedConfig {
    /// Base distribution URL the channel file is resolved against
    #[serde(default)]
    pub url: Option<String>,

    /// Configured default channel (e.g. "beta"); `latest` when unset
    #[serde(default)]
    pub channel: Option<String>,

    /// Append a `noCache` query parameter to metadata requests
    #[serde(default)]
    pub add_no_cache_query: bool,

    /// Extra headers sent with every metadata request
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Architecture override (x64, ia32, arm64, armv7l)
    #[serde(default)]
    pub arch: Option<String>,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!(
        "skald/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();
        operations.insert(
            METADATA_RETRY_OPERATION.to_string(),
            RetryPolicy::metadata_fetch(),
        );

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Policy for metadata document fetches
    ///
    /// Four attempts in total, waiting 0, 1000 and 2000 ms before the
    /// second, third and fourth attempt.
    pub fn metadata_fetch() -> Self {
        Self {
            max_attempts: 4,
            strategy: RetryStrategy::LinearBackoff,
            backoff_multiplier: 1.0,
            initial_delay_ms: 1000,
            max_delay_ms: 3000,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// No delay between attempts
    None,

    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff, first retry is immediate
    LinearBackoff,
}

/// Hostname pinning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DnsConfig {
    /// Consult the resolver before fetching metadata
    #[serde(default = "default_dns_enabled")]
    pub enabled: bool,

    /// Hostname to IP address pins served by the static resolver
    #[serde(default)]
    pub overrides: BTreeMap<String, IpAddr>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            enabled: default_dns_enabled(),
            overrides: BTreeMap::new(),
        }
    }
}

fn default_dns_enabled() -> bool {
    true
}
