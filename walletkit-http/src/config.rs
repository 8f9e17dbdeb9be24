//! Client configuration.
//!
//! The base URL, bearer credential and client id always come from
//! configuration, never from code. [`ClientConfig::from_env`] reads them
//! from the process environment:
//!
//! - `WALLETKIT_API_BASE` - API base URL. When unset or empty,
//!   `WALLETKIT_ENVIRONMENT` (`sandbox` or `production`, default `sandbox`)
//!   picks the provider URL.
//! - `WALLETKIT_API_KEY` - Bearer credential. When missing the client still
//!   sends `Authorization: Bearer` and lets the provider reject the call.
//! - `WALLETKIT_CLIENT_ID` - Client id (empty when missing).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use walletkit::RetryPolicy;

use crate::constants::{
    ENV_API_BASE, ENV_API_KEY, ENV_CLIENT_ID, ENV_ENVIRONMENT, PRODUCTION_BASE_URL,
    SANDBOX_BASE_URL,
};

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `WALLETKIT_ENVIRONMENT` held something other than `sandbox` or `production`.
    #[error("unknown environment {0:?}, expected `sandbox` or `production`")]
    UnknownEnvironment(String),
}

/// Provider deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Demo API with test credentials.
    #[default]
    Sandbox,
    /// Live API.
    Production,
}

impl Environment {
    /// Base URL of this deployment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "demo" => Ok(Self::Sandbox),
            "production" | "prod" | "live" => Ok(Self::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_owned())),
        }
    }
}

/// Everything a [`ResilientClient`](crate::ResilientClient) needs.
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://api-demo.airwallex.com`.
    pub base_url: String,

    /// Bearer credential.
    pub api_key: Option<String>,

    /// Client id sent in `X-Client-Id`.
    pub client_id: Option<String>,

    /// Attempts and backoff schedule.
    pub retry: RetryPolicy,

    /// Per-attempt transport timeout. `None` leaves reqwest's default
    /// (no timeout); wrap calls in `tokio::time::timeout` for an overall
    /// deadline.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Environment::default().base_url())
    }
}

impl ClientConfig {
    /// Creates a config for `base_url` with no credentials and the default
    /// retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            client_id: None,
            retry: RetryPolicy::default(),
            request_timeout: None,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] if `WALLETKIT_ENVIRONMENT`
    /// is set to an unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] on an unrecognized
    /// environment name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = match get(ENV_API_BASE) {
            Some(url) => url,
            None => get(ENV_ENVIRONMENT)
                .map(|env| env.parse::<Environment>())
                .transpose()?
                .unwrap_or_default()
                .base_url()
                .to_owned(),
        };

        Ok(Self {
            api_key: get(ENV_API_KEY),
            client_id: get(ENV_CLIENT_ID),
            ..Self::new(base_url)
        })
    }

    /// Sets the bearer credential.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-attempt transport timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("client_id", &self.client_id)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
