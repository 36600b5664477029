//! Channel name resolution
//!
//! A channel selects which metadata document is fetched. The channel name
//! carries a platform prefix (`latest-mac`, `beta-linux-arm64`) so that one
//! distribution directory can serve every platform.

use std::fmt;

use crate::platform::RuntimeTarget;

/// Channel used when neither an override nor a configured channel is set
pub const DEFAULT_CHANNEL: &str = "latest";

/// Extension of channel metadata documents
pub const CHANNEL_FILE_EXTENSION: &str = "yml";

/// A resolved, platform-qualified channel name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Channel name for a user-supplied channel
    pub fn custom(channel: &str, target: &RuntimeTarget) -> Self {
        Self(format!("{}{}", channel, target.channel_prefix()))
    }

    /// Channel name used when nothing is configured
    pub fn default_for(target: &RuntimeTarget) -> Self {
        Self::custom(DEFAULT_CHANNEL, target)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve the channel for one update check
///
/// A runtime override wins over the configured channel. Empty strings are
/// treated as absent.
pub fn resolve_channel(
    configured: Option<&str>,
    runtime_override: Option<&str>,
    target: &RuntimeTarget,
) -> ChannelName {
    let chosen = runtime_override
        .filter(|c| !c.is_empty())
        .or_else(|| configured.filter(|c| !c.is_empty()));

    match chosen {
        Some(channel) => ChannelName::custom(channel, target),
        None => ChannelName::default_for(target),
    }
}

/// File name of the metadata document for `channel`
pub fn channel_filename(channel: &ChannelName) -> String {
    format!("{}.{}", channel, CHANNEL_FILE_EXTENSION)
}
