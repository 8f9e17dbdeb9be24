//! Redacted request/response capture for debugging panels and logs.

use serde::Serialize;
use serde_json::Value;

use crate::headers::{HeaderList, redact_headers};

/// A response body: parsed JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not valid JSON (including an empty body).
    Text(String),
}

impl ResponseBody {
    /// Parses raw bytes, falling back to lossy UTF-8 text.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            Self::Json,
        )
    }

    /// Returns the JSON value, if the body parsed.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text, if the body did not parse.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Looks up a top-level string field of a JSON object body.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.as_json()?.get(field)?.as_str()
    }
}

/// One captured HTTP exchange with sensitive header values redacted.
///
/// Serializes with the field names a debug panel expects:
/// `url`, `method`, `reqHeaders`, `body`, `status`, `respHeaders`, `respBody`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTrace {
    url: String,
    method: String,
    req_headers: HeaderList,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
    status: u16,
    resp_headers: HeaderList,
    resp_body: ResponseBody,
}

impl RequestTrace {
    /// Captures an exchange. Both header lists are redacted here, so a
    /// trace can never hold an unredacted secret.
    #[must_use]
    pub fn capture(
        url: impl Into<String>,
        method: impl Into<String>,
        req_headers: &HeaderList,
        body: Option<Value>,
        status: u16,
        resp_headers: &HeaderList,
        resp_body: ResponseBody,
    ) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            req_headers: redact_headers(req_headers),
            body,
            status,
            resp_headers: redact_headers(resp_headers),
            resp_body,
        }
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Redacted request headers.
    #[must_use]
    pub const fn req_headers(&self) -> &HeaderList {
        &self.req_headers
    }

    /// JSON request body, if one was sent.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Response status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Redacted response headers.
    #[must_use]
    pub const fn resp_headers(&self) -> &HeaderList {
        &self.resp_headers
    }

    /// Response body.
    #[must_use]
    pub const fn resp_body(&self) -> &ResponseBody {
        &self.resp_body
    }
}
