//! Error types shared by the chat platform implementations.

use reqwest::StatusCode;
use thiserror::Error;

use super::Snowflake;

/// Convenient result alias returning [`PlatformError`] failures.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failures that can occur while talking to the chat platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// No bot token could be found in the environment or on disk.
    #[error("missing bot token: set `{var}` or provide `{file}`")]
    MissingToken {
        var: &'static str,
        file: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The configured API base URL cannot carry path segments.
    #[error("invalid API base URL `{0}`")]
    InvalidBaseUrl(String),
    /// A request could not be sent.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The platform answered with an unexpected status code.
    #[error("unexpected response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The referenced channel does not exist or is not visible to the bot.
    #[error("unknown channel {0}")]
    UnknownChannel(Snowflake),
    /// The referenced message does not exist in the channel.
    #[error("unknown message {message_id} in channel {channel_id}")]
    UnknownMessage {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
}
