//! Update feed client for Skald
//!
//! Provides:
//! - Channel name and channel file resolution per platform
//! - Metadata document fetch with retry, cancellation and error classification
//! - Optional host pinning to pre-resolved IP addresses
//! - Resolution of relative file references into download targets
//! - Per-architecture installer package selection
//!
//! A single update check runs the fetch and the resolve step in sequence:
//!
//! ```no_run
//! use skald_update::{GenericProvider, ReqwestTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> skald_update::Result<()> {
//! let transport = ReqwestTransport::new(&Default::default())?;
//! let provider = GenericProvider::new("https://updates.example.com/app", transport)?;
//!
//! let check = provider
//!     .get_latest_version(None, &CancellationToken::new())
//!     .await?;
//! for file in provider.resolve_files(&check)? {
//!     println!("{} -> {}", check.update_info.version, file.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod dns;
pub mod error;
pub mod fetcher;
pub mod info;
pub mod platform;
pub mod provider;
pub mod resolver;
pub mod transport;
pub mod urls;

pub use channel::{channel_filename, resolve_channel, ChannelName};
pub use dns::{DnsError, DnsResolver, IpCache, StaticDnsResolver};
pub use error::{Result, UpdateError};
pub use fetcher::{MetadataFetcher, UpdateCheck};
pub use info::{
    PackageFileInfo, PlatformMetadata, ReleaseNoteInfo, ReleaseNotes, UpdateFileInfo, UpdateInfo,
};
pub use platform::{Arch, Platform, RuntimeTarget};
pub use provider::GenericProvider;
pub use resolver::{resolve_files, ResolvedFileInfo, ResolvedPackageInfo};
pub use transport::{HttpTransport, RequestOptions, ReqwestTransport, TransportError};
pub use urls::TargetUrl;

/// Current client version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
