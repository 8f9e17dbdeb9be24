//! Error types for the resilient HTTP client.

/// Errors returned by [`ResilientClient::send`](crate::ResilientClient::send).
///
/// A completed HTTP exchange is never an error, whatever its status: it
/// comes back as a [`SendResult`](crate::SendResult) with `success = false`.
/// Only [`SendError::Transport`] involves the network; the other variants
/// are raised before any attempt is made.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The base URL joined with the path is not a valid URL.
    #[error("invalid request URL {url:?}: {source}")]
    Url {
        /// The URL that failed to parse.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("invalid header {name:?}: {source}")]
    InvalidHeader {
        /// Name of the offending header.
        name: String,
        /// The underlying header error.
        #[source]
        source: http::Error,
    },

    /// The request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Body(#[source] serde_json::Error),

    /// The underlying reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Every attempt failed before an HTTP response was received.
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        /// Full request URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error from the last attempt.
        #[source]
        source: reqwest_middleware::Error,
    },
}

impl SendError {
    /// Returns `true` if the request reached the network and never got a
    /// response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Number of attempts made before failing; zero for errors raised
    /// while preparing the request.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } => *attempts,
            _ => 0,
        }
    }
}
