//! Scripted transport and resolvers for fetch tests

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use skald_update::{DnsError, DnsResolver, HttpTransport, RequestOptions, TransportError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Fail(TransportError),
    /// Never completes
    Hang,
}

/// A request seen by the scripted transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub options: RequestOptions,
    /// Time since the transport was created
    pub offset: Duration,
}

#[derive(Debug)]
struct ScriptState {
    replies: VecDeque<Reply>,
    requests: Vec<RecordedRequest>,
    created: Instant,
}

/// Transport answering from a script of replies
///
/// Clones share the script and the request log. The last reply repeats once
/// the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                replies: replies.into_iter().collect(),
                requests: Vec::new(),
                created: Instant::now(),
            })),
        }
    }

    /// Transport that always answers with `body`
    pub fn serving(body: impl Into<String>) -> Self {
        Self::new([Reply::Body(body.into())])
    }

    /// Transport that always fails with `error`
    pub fn failing(error: TransportError) -> Self {
        Self::new([Reply::Fail(error)])
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Offsets of every request since the transport was created
    pub fn offsets(&self) -> Vec<Duration> {
        self.requests().into_iter().map(|r| r.offset).collect()
    }

    fn next_reply(&self, options: RequestOptions) -> Reply {
        let mut state = self.state.lock().unwrap();
        let offset = state.created.elapsed();
        state.requests.push(RecordedRequest { options, offset });

        if state.replies.len() > 1 {
            state.replies.pop_front().unwrap()
        } else {
            state
                .replies
                .front()
                .cloned()
                .expect("ScriptedTransport has no replies")
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn request(
        &self,
        options: RequestOptions,
        _cancel: &CancellationToken,
    ) -> Result<Bytes, TransportError> {
        match self.next_reply(options) {
            Reply::Body(body) => Ok(Bytes::from(body)),
            Reply::Fail(error) => Err(error),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn refused_error() -> TransportError {
    TransportError::ConnectionRefused {
        url: "https://updates.example.test/app/latest.yml".to_string(),
        message: "connect ECONNREFUSED".to_string(),
    }
}

pub fn status_error(status: u16) -> TransportError {
    TransportError::Status {
        status,
        url: "https://updates.example.test/app/latest.yml".to_string(),
        message: "scripted".to_string(),
    }
}

/// Resolver answering every host with one address and counting lookups
#[derive(Debug)]
pub struct CountingResolver {
    pub ip: Option<IpAddr>,
    pub lookups: AtomicU32,
}

impl CountingResolver {
    pub fn answering(ip: IpAddr) -> Arc<Self> {
        Arc::new(Self {
            ip: Some(ip),
            lookups: AtomicU32::new(0),
        })
    }

    pub fn silent() -> Arc<Self> {
        Arc::new(Self {
            ip: None,
            lookups: AtomicU32::new(0),
        })
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for CountingResolver {
    async fn resolve(&self, _host: &str) -> Result<Option<IpAddr>, DnsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// Resolver whose backend is always down
#[derive(Debug, Default)]
pub struct FailingResolver;

#[async_trait]
impl DnsResolver for FailingResolver {
    async fn resolve(&self, _host: &str) -> Result<Option<IpAddr>, DnsError> {
        Err(DnsError::Unavailable("no resolver configured".to_string()))
    }
}

/// Resolver whose lookups never complete
#[derive(Debug, Default)]
pub struct HangingResolver {
    pub lookups: AtomicU32,
}

impl HangingResolver {
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for HangingResolver {
    async fn resolve(&self, _host: &str) -> Result<Option<IpAddr>, DnsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
