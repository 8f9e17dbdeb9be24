//! The result of a completed exchange.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use walletkit::proto::ApiErrorBody;
use walletkit::{HeaderList, RequestTrace, ResponseBody};

/// Outcome of a [`ResilientClient::send`](crate::ResilientClient::send)
/// call that received an HTTP response.
///
/// All fields describe the final attempt only.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// `true` iff the status is in `[200, 300)`.
    pub success: bool,

    /// HTTP status code.
    pub status: u16,

    /// Response headers, unredacted.
    pub headers: HeaderList,

    /// Response body, parsed as JSON when possible.
    pub body: ResponseBody,

    /// Redacted capture of the exchange.
    pub trace: RequestTrace,

    /// Attempts made, including the final one.
    pub attempts: u32,
}

impl SendResult {
    /// A human-readable description of a failed exchange, suitable for an
    /// error banner. `None` on success.
    ///
    /// Prefers the `message` of the provider's [`ApiErrorBody`], then a
    /// non-empty text body, then the status reason phrase.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        if let Some(message) = self.error_body().map(|e| e.message).filter(|m| !m.is_empty()) {
            return Some(message);
        }
        if let Some(text) = self.body.as_text().map(str::trim).filter(|t| !t.is_empty()) {
            return Some(text.to_owned());
        }
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason());
        Some(reason.map_or_else(
            || format!("HTTP {}", self.status),
            |reason| format!("HTTP {} {reason}", self.status),
        ))
    }

    /// The provider's error envelope of a failed exchange. `None` on
    /// success or when the body is not a JSON object.
    #[must_use]
    pub fn error_body(&self) -> Option<ApiErrorBody> {
        if self.success || !matches!(&self.body, ResponseBody::Json(v) if v.is_object()) {
            return None;
        }
        self.json().ok()
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.body {
            ResponseBody::Json(value) => T::deserialize(value),
            ResponseBody::Text(text) => serde_json::from_str(text),
        }
    }
}

/// Copies a reqwest header map into an ordered [`HeaderList`].
///
/// Repeated headers are joined with `", "`; non-UTF-8 bytes are replaced.
pub(crate) fn header_list(map: &HeaderMap) -> HeaderList {
    map.keys()
        .map(|name| {
            let joined = map
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_owned(), joined)
        })
        .collect()
}
