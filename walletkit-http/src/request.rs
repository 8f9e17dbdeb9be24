//! Per-call request options.

use http::Method;
use serde_json::Value;
use walletkit::HeaderList;

/// Options for one [`ResilientClient::send`](crate::ResilientClient::send) call.
///
/// ```
/// use walletkit_http::SendOptions;
///
/// let options = SendOptions::post(serde_json::json!({"amount": 10.0, "currency": "USD"}))
///     .with_header("X-Request-Source", "mobile")
///     .with_idempotency_key("send:tx1-token");
/// assert_eq!(options.method, http::Method::POST);
/// ```
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// HTTP method. Defaults to GET.
    pub method: Method,

    /// Headers that override the client's defaults by name.
    pub headers: HeaderList,

    /// JSON request body.
    pub body: Option<Value>,

    /// Idempotency token for mutating methods. When `None` a fresh token is
    /// generated for this call and reused across its retries.
    pub idempotency_key: Option<String>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl SendOptions {
    /// A GET request with no body.
    #[must_use]
    pub const fn get() -> Self {
        Self::new(Method::GET)
    }

    /// A POST request with a JSON body.
    #[must_use]
    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    /// A request with the given method and nothing else.
    #[must_use]
    pub const fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderList::new(),
            body: None,
            idempotency_key: None,
        }
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Supplies the idempotency token, typically from an
    /// [`IdempotencyRegistry`](walletkit::IdempotencyRegistry).
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
