//! Error types for skald-update

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias using skald-update's error type
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Errors surfaced by an update check
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The channel metadata document does not exist on the server
    #[error("Cannot find channel \"{channel_file}\" update info: {message}")]
    ChannelFileNotFound {
        channel_file: String,
        message: String,
    },

    /// Transport failure, including connection refused after all retries
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The metadata document could not be parsed
    #[error("Cannot parse update info from {channel_file} in {url}: {message}")]
    InvalidUpdateInfo {
        channel_file: String,
        url: String,
        message: String,
    },

    /// A base URL or file reference could not be turned into a URL
    #[error("Invalid URL \"{input}\": {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// The check was cancelled by the caller
    #[error("Update check cancelled")]
    Cancelled,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] skald_core::Error),
}

impl UpdateError {
    /// Create a channel-file-not-found error wrapping the failure message
    pub fn channel_file_not_found(
        channel_file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ChannelFileNotFound {
            channel_file: channel_file.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-update-info error
    pub fn invalid_update_info(
        channel_file: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidUpdateInfo {
            channel_file: channel_file.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChannelFileNotFound { .. } => "ERR_UPDATER_CHANNEL_FILE_NOT_FOUND",
            Self::Transport(TransportError::ConnectionRefused { .. }) => {
                "ERR_UPDATER_CONNECTION_REFUSED"
            }
            Self::Transport(TransportError::Status { .. }) => "ERR_UPDATER_HTTP_STATUS",
            Self::Transport(TransportError::Network { .. }) => "ERR_UPDATER_NETWORK",
            Self::Transport(TransportError::Cancelled) | Self::Cancelled => "ERR_UPDATER_CANCELLED",
            Self::InvalidUpdateInfo { .. } => "ERR_UPDATER_INVALID_UPDATE_INFO",
            Self::InvalidUrl { .. } => "ERR_UPDATER_INVALID_URL",
            Self::Config(_) => "ERR_UPDATER_CONFIG",
        }
    }

    /// Whether the check was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Transport(TransportError::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_file_not_found_message() {
        let err = UpdateError::channel_file_not_found("latest.yml", "HTTP 404 Not Found");
        assert_eq!(
            err.to_string(),
            "Cannot find channel \"latest.yml\" update info: HTTP 404 Not Found"
        );
        assert_eq!(err.code(), "ERR_UPDATER_CHANNEL_FILE_NOT_FOUND");
    }

    #[test]
    fn test_transport_codes() {
        let refused = UpdateError::from(TransportError::ConnectionRefused {
            url: "http://127.0.0.1:1/latest.yml".to_string(),
            message: "connection refused".to_string(),
        });
        assert_eq!(refused.code(), "ERR_UPDATER_CONNECTION_REFUSED");

        let status = UpdateError::from(TransportError::Status {
            status: 500,
            url: "http://127.0.0.1:1/latest.yml".to_string(),
            message: "Internal Server Error".to_string(),
        });
        assert_eq!(status.code(), "ERR_UPDATER_HTTP_STATUS");
    }

    #[test]
    fn test_cancelled() {
        assert!(UpdateError::Cancelled.is_cancelled());
        assert!(UpdateError::from(TransportError::Cancelled).is_cancelled());
        assert_eq!(UpdateError::Cancelled.code(), "ERR_UPDATER_CANCELLED");
    }

    #[test]
    fn test_config_error_wraps_core_error() {
        let err = UpdateError::from(skald_core::Error::invalid_config("feed.url is not set"));
        assert_eq!(err.code(), "ERR_UPDATER_CONFIG");
        assert!(err.to_string().contains("feed.url is not set"));
    }
}
