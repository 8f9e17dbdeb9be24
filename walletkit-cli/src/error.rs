//! CLI error types.

use std::path::PathBuf;
use std::time::Duration;

use walletkit_http::{ConfigError, SendError, WalletApiError};

/// Errors that end a CLI invocation with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    ReadConfig {
        /// Path of the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid config file {}: {source}", path.display())]
    ParseConfig {
        /// Path of the file.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A configuration value is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request could not be sent.
    #[error(transparent)]
    Send(#[from] SendError),

    /// A typed API call failed.
    #[error(transparent)]
    Api(#[from] WalletApiError),

    /// The provider answered a raw request with a non-2xx status.
    #[error("request failed with HTTP {status}: {message}")]
    Unsuccessful {
        /// HTTP status code.
        status: u16,
        /// Provider message or status reason.
        message: String,
    },

    /// The command did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Ctrl-C arrived before the command finished.
    #[error("interrupted")]
    Interrupted,

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// A trace could not be rendered as JSON.
    #[error("failed to render trace: {0}")]
    Render(#[from] serde_json::Error),
}
