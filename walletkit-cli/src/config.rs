//! CLI configuration.
//!
//! Loads a TOML file with `$VAR` / `${VAR}` expansion in string values.
//! Precedence, highest first: command-line flags, environment variables,
//! file values, built-in defaults. A missing file means defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! base_url = "https://api-demo.airwallex.com"
//! api_key = "${WALLETKIT_SANDBOX_KEY}"
//! client_id = "my-client"
//! login = true
//! timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to the configuration file (default: `walletkit.toml`)
//! - `WALLETKIT_API_BASE`, `WALLETKIT_API_KEY`, `WALLETKIT_CLIENT_ID`,
//!   `WALLETKIT_ENVIRONMENT` - Override the file values

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use walletkit::RetryPolicy;
use walletkit_http::{ClientConfig, ResilientClient, WalletApi};
use walletkit_http::constants::{ENV_API_BASE, ENV_API_KEY, ENV_CLIENT_ID, ENV_ENVIRONMENT};

use crate::error::CliError;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "walletkit.toml";

/// Default overall deadline for one command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// API base URL.
    pub base_url: Option<String>,
    /// `sandbox` or `production`; used when no base URL is set.
    pub environment: Option<String>,
    /// Bearer credential.
    pub api_key: Option<String>,
    /// Client id.
    pub client_id: Option<String>,
    /// Exchange the API key for a bearer token before the first call.
    pub login: Option<bool>,
    /// Overall deadline per command, in seconds.
    pub timeout_secs: Option<u64>,
    /// Retry schedule.
    pub retry: RetrySection,
}

/// `[retry]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    /// Total attempts per request, including the first.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry; doubles after each retry.
    pub base_delay_ms: Option<u64>,
}

/// Values taken from flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// API base URL.
    pub base_url: Option<String>,
    /// Deployment name.
    pub environment: Option<String>,
    /// Bearer credential.
    pub api_key: Option<String>,
    /// Client id.
    pub client_id: Option<String>,
    /// Forces the login exchange on.
    pub login: bool,
    /// Overall deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Total attempts per request.
    pub max_attempts: Option<u32>,
}

/// Fully resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Client configuration.
    pub client: ClientConfig,
    /// Whether to log in for a bearer token.
    pub login: bool,
    /// Overall deadline for the command.
    pub timeout: Duration,
}

impl Settings {
    /// Builds the wallet API these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Send`] if the HTTP client cannot be built.
    pub fn api(self) -> Result<WalletApi, CliError> {
        let credentials = self.login.then(|| {
            (
                self.client.client_id.clone().unwrap_or_default(),
                self.client.api_key.clone().unwrap_or_default(),
            )
        });
        let api = WalletApi::new(ResilientClient::new(self.client)?);
        Ok(match credentials {
            Some((client_id, api_key)) => api.with_login(client_id, api_key),
            None => api,
        })
    }
}

impl FileConfig {
    /// Loads the file at `path`, expanding variables from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ReadConfig`] or [`CliError::ParseConfig`].
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Loads the file at `path`, expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ReadConfig`] or [`CliError::ParseConfig`].
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            String::new()
        };
        Self::parse(&content, lookup).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses TOML after variable expansion.
    ///
    /// # Errors
    ///
    /// Returns the TOML error on malformed input or unknown keys.
    pub fn parse<F>(content: &str, lookup: F) -> Result<Self, toml::de::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        toml::from_str(&expand_env_vars(content, lookup))
    }

    /// Applies `overrides` on top of the file values.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] on an unknown environment name.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings, CliError> {
        let vars: HashMap<&str, Option<String>> = HashMap::from([
            (ENV_API_BASE, overrides.base_url.or(self.base_url)),
            (ENV_ENVIRONMENT, overrides.environment.or(self.environment)),
            (ENV_API_KEY, overrides.api_key.or(self.api_key)),
            (ENV_CLIENT_ID, overrides.client_id.or(self.client_id)),
        ]);
        let mut client = ClientConfig::from_lookup(|name: &str| vars.get(name).cloned().flatten())?;

        let defaults = RetryPolicy::default();
        client.retry = RetryPolicy::new(
            overrides
                .max_attempts
                .or(self.retry.max_attempts)
                .unwrap_or(defaults.max_attempts),
            self.retry
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
        );

        let timeout = Duration::from_secs(
            overrides
                .timeout_secs
                .or(self.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        Ok(Settings {
            client,
            login: overrides.login || self.login.unwrap_or(false),
            timeout,
        })
    }
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        let resolved = (!name.is_empty() && closed == braced)
            .then(|| lookup(&name))
            .flatten();
        match resolved {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
