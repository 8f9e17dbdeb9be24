//! Resilient outbound requests to the payments provider.
//!
//! [`ResilientClient::send`] performs one logical request:
//!
//! 1. Joins the path onto the configured base URL.
//! 2. Merges headers: defaults (`Authorization`, `X-Client-Id`,
//!    `Content-Type`), then caller headers (which override defaults by
//!    name), then `X-Idempotency-Key` for POST/PUT/PATCH/DELETE, which
//!    callers cannot override.
//! 3. Runs attempts under a [`RetryMachine`]: transport failures, 429 and
//!    5xx are retried after `1s`, `2s`, ...; 2xx and other statuses end the
//!    sequence immediately.
//! 4. Returns a [`SendResult`] with a redacted [`RequestTrace`] of the final
//!    attempt, or [`SendError::Transport`] if no attempt got a response.
//!
//! Retries of one call are strictly sequential. There is no built-in
//! overall deadline: wrap `send` in `tokio::time::timeout` when one is
//! needed. Dropping the future cancels the in-flight attempt or backoff.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest_middleware as rqm;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;
use walletkit::{
    AttemptOutcome, HeaderList, IdempotencyRegistry, RequestTrace, ResponseBody, RetryMachine,
    RetryPolicy, RetryState, Sleeper, TokioSleeper,
};

use crate::config::ClientConfig;
use crate::constants::{
    AUTHORIZATION_HEADER, CLIENT_ID_HEADER, CONTENT_TYPE_HEADER, IDEMPOTENCY_KEY_HEADER,
    JSON_CONTENT_TYPE, is_mutating,
};
use crate::error::SendError;
use crate::middleware::RedactedLogging;
use crate::request::SendOptions;
use crate::response::{SendResult, header_list};

/// A request with URL, headers and body fixed; reused by every attempt.
#[derive(Clone)]
pub struct PreparedRequest {
    /// Full request URL.
    pub url: Url,
    /// HTTP method.
    pub method: Method,
    /// Merged headers in send order, unredacted.
    pub headers: HeaderList,
    /// JSON body, if any.
    pub body: Option<Value>,
    header_map: HeaderMap,
    body_bytes: Option<Vec<u8>>,
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("headers", &walletkit::redact_headers(&self.headers))
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl PreparedRequest {
    /// The idempotency token this request carries, if any.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.headers.get(IDEMPOTENCY_KEY_HEADER)
    }
}

/// One completed HTTP exchange.
struct Exchange {
    status: u16,
    headers: HeaderList,
    body: ResponseBody,
}

/// HTTP client with auth, idempotency, retry and redacted tracing.
///
/// Cheap to clone; clones share the connection pool and sleeper.
#[derive(Clone)]
pub struct ResilientClient {
    base_url: String,
    default_headers: HeaderList,
    http: rqm::ClientWithMiddleware,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &walletkit::redact_headers(&self.default_headers))
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Builds a client from configuration.
    ///
    /// The bearer header is built even without a credential
    /// (`Authorization: Bearer`); the provider rejects such calls with 401.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Build`] if the reqwest client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, SendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(SendError::Build)?;
        Ok(Self::with_reqwest(config, http))
    }

    /// Builds a client around an existing reqwest client, adding
    /// [`RedactedLogging`].
    #[must_use]
    pub fn with_reqwest(config: ClientConfig, http: reqwest::Client) -> Self {
        let http = rqm::ClientBuilder::new(http).with(RedactedLogging).build();
        Self::with_middleware_client(config, http)
    }

    /// Builds a client around a caller-assembled middleware stack. No
    /// middleware is added.
    #[must_use]
    pub fn with_middleware_client(config: ClientConfig, http: rqm::ClientWithMiddleware) -> Self {
        let bearer = format!("Bearer {}", config.api_key.as_deref().unwrap_or_default());
        let default_headers = HeaderList::new()
            .with(AUTHORIZATION_HEADER, bearer.trim_end())
            .with(CLIENT_ID_HEADER, config.client_id.unwrap_or_default())
            .with(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE);
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            default_headers,
            http,
            policy: config.retry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers sent on every request before caller overrides.
    #[must_use]
    pub const fn default_headers(&self) -> &HeaderList {
        &self.default_headers
    }

    /// The retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Joins `path` onto the base URL, adding a leading `/` if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Url`] if the result does not parse.
    pub fn url_for(&self, path: &str) -> Result<Url, SendError> {
        let joined = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Url::parse(&joined).map_err(|source| SendError::Url {
            url: joined,
            source,
        })
    }

    /// Resolves URL, headers, idempotency token and body for a call.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] for a bad URL, header, or body.
    pub fn prepare(&self, path: &str, options: &SendOptions) -> Result<PreparedRequest, SendError> {
        let url = self.url_for(path)?;

        let mut headers = self.default_headers.clone();
        headers.merge(&options.headers);
        headers.remove(IDEMPOTENCY_KEY_HEADER);
        if is_mutating(&options.method) {
            let token = options
                .idempotency_key
                .clone()
                .unwrap_or_else(IdempotencyRegistry::mint);
            headers.insert(IDEMPOTENCY_KEY_HEADER, token);
        }

        let header_map = to_header_map(&headers)?;
        let body_bytes = options
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(SendError::Body)?;

        Ok(PreparedRequest {
            url,
            method: options.method.clone(),
            headers,
            body: options.body.clone(),
            header_map,
            body_bytes,
        })
    }

    /// Sends one logical request with retries.
    ///
    /// A completed exchange is always `Ok`, including 4xx and 5xx statuses;
    /// check [`SendResult::success`]. `Err` means either the request could
    /// not be built or no attempt received a response.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] with the last transport error after
    /// all attempts failed without a response, or another [`SendError`]
    /// variant if the request could not be prepared.
    #[instrument(
        name = "walletkit.send",
        skip_all,
        fields(method = %options.method, path = %path)
    )]
    pub async fn send(&self, path: &str, options: SendOptions) -> Result<SendResult, SendError> {
        let prepared = self.prepare(path, &options)?;
        self.execute(&prepared).await
    }

    /// Runs the retry loop for an already prepared request.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] when no attempt received a response.
    pub async fn execute(&self, prepared: &PreparedRequest) -> Result<SendResult, SendError> {
        let mut machine = RetryMachine::new(self.policy);
        loop {
            let exchange = self.attempt(prepared).await;
            let outcome = match &exchange {
                Ok(ex) => AttemptOutcome::from_status(ex.status),
                Err(_) => AttemptOutcome::TransportFailure,
            };

            if let RetryState::Backoff { attempt, delay } = machine.observe(outcome) {
                match &exchange {
                    Ok(ex) => warn!(attempt = attempt + 1, status = ex.status, ?delay, "Retrying"),
                    Err(err) => warn!(attempt = attempt + 1, error = %err, ?delay, "Retrying"),
                }
                self.sleeper.sleep(delay).await;
                machine.resume();
                continue;
            }

            return Self::finish(prepared, exchange, machine.attempts_made());
        }
    }

    async fn attempt(&self, prepared: &PreparedRequest) -> Result<Exchange, rqm::Error> {
        let mut request = self
            .http
            .request(prepared.method.clone(), prepared.url.clone())
            .headers(prepared.header_map.clone());
        if let Some(bytes) = &prepared.body_bytes {
            request = request.body(bytes.clone());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = header_list(response.headers());
        let bytes = response.bytes().await.map_err(rqm::Error::Reqwest)?;
        debug!(status, len = bytes.len(), "Attempt completed");

        Ok(Exchange {
            status,
            headers,
            body: ResponseBody::from_bytes(&bytes),
        })
    }

    fn finish(
        prepared: &PreparedRequest,
        exchange: Result<Exchange, rqm::Error>,
        attempts: u32,
    ) -> Result<SendResult, SendError> {
        match exchange {
            Ok(ex) => {
                let trace = RequestTrace::capture(
                    prepared.url.as_str(),
                    prepared.method.as_str(),
                    &prepared.headers,
                    prepared.body.clone(),
                    ex.status,
                    &ex.headers,
                    ex.body.clone(),
                );
                Ok(SendResult {
                    success: (200..300).contains(&ex.status),
                    status: ex.status,
                    headers: ex.headers,
                    body: ex.body,
                    trace,
                    attempts,
                })
            }
            Err(source) => {
                error!(url = %prepared.url, attempts, error = %source, "All attempts failed");
                Err(SendError::Transport {
                    url: prepared.url.to_string(),
                    attempts,
                    source,
                })
            }
        }
    }
}

fn to_header_map(headers: &HeaderList) -> Result<HeaderMap, SendError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let invalid = |source: http::Error| SendError::InvalidHeader {
            name: name.to_owned(),
            source,
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.into()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.into()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
