//! HTTP transport seam
//!
//! The fetcher talks to the network only through [`HttpTransport`], so tests
//! can script responses and failures. [`ReqwestTransport`] is the production
//! implementation.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HOST;
use reqwest::{Client, Method};
use skald_core::types::NetworkConfig;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::urls::TargetUrl;

/// Transport-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status
    #[error("HTTP {status} {message} ({url})")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// Nothing accepted the connection
    #[error("Connection refused ({url}): {message}")]
    ConnectionRefused { url: String, message: String },

    /// Any other network failure (DNS, TLS, timeout, reset, body read)
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The request was aborted by its cancellation token
    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::ConnectionRefused { .. })
    }
}

/// A single HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub url: TargetUrl,
    pub method: Method,
    /// Extra headers; `Host` is derived from `url` and must not be set here
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// GET request for `url`
    pub fn get(url: TargetUrl) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// `Host` header value to send, the original hostname
    pub fn host_header(&self) -> Option<String> {
        self.url.host_header()
    }
}

/// Executes HTTP requests and returns the response body
///
/// Implementations must report a 404 as `Status { status: 404, .. }`, a
/// refused connection as `ConnectionRefused`, and must return `Cancelled`
/// as soon as `cancel` fires.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(
        &self,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Bytes, TransportError>;
}

/// `reqwest`-backed transport
///
/// Pinned targets get a dedicated client whose resolver maps the hostname to
/// the pinned address, so TLS and the `Host` header still see the hostname.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    network: NetworkConfig,
}

impl ReqwestTransport {
    /// Create a transport from the `network` config section
    pub fn new(network: &NetworkConfig) -> Result<Self, TransportError> {
        let client = Self::builder(network).build().map_err(|e| TransportError::Network {
            url: String::new(),
            message: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            network: network.clone(),
        })
    }

    fn builder(network: &NetworkConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
    }

    fn client_for(&self, target: &TargetUrl) -> Result<Client, TransportError> {
        match (target.ip, target.host()) {
            (Some(ip), Some(host)) => {
                // Port 0 keeps the port from the URL
                Self::builder(&self.network)
                    .resolve(host, SocketAddr::new(ip, 0))
                    .build()
                    .map_err(|e| TransportError::Network {
                        url: target.url.to_string(),
                        message: format!("Failed to create pinned HTTP client: {}", e),
                    })
            }
            _ => Ok(self.client.clone()),
        }
    }

    async fn send(&self, options: RequestOptions) -> Result<Bytes, TransportError> {
        let url = options.url.url.to_string();
        let client = self.client_for(&options.url)?;

        let mut request = client.request(options.method.clone(), options.url.url.clone());
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if options.url.is_substituted() {
            if let Some(host) = options.host_header() {
                request = request.header(HOST, host);
            }
        }

        debug!(url = %url, ip = ?options.url.ip, "Sending {} request", options.method);

        let response = request.send().await.map_err(|e| classify(&e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url,
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response.bytes().await.map_err(|e| TransportError::Network {
            url,
            message: error_chain(&e),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Bytes, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.send(options) => result,
        }
    }
}

/// Map a reqwest error onto the transport taxonomy
fn classify(err: &reqwest::Error, url: &str) -> TransportError {
    let message = error_chain(err);

    if is_connection_refused(err) {
        TransportError::ConnectionRefused {
            url: url.to_string(),
            message,
        }
    } else {
        TransportError::Network {
            url: url.to_string(),
            message,
        }
    }
}

fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err as &(dyn StdError + 'static));
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = current.source();
    }

    err.is_connect() && error_chain(err).to_lowercase().contains("connection refused")
}

/// Render an error and all of its sources on one line
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(current) = source {
        let text = current.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = current.source();
    }
    message
}
