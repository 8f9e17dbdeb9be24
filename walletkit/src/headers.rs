//! Ordered header lists and redaction of sensitive header values.
//!
//! Header names keep the casing the caller used, and iteration follows
//! insertion order, so a [`HeaderList`] can be shown in a debug panel
//! exactly as it was assembled. Lookup and replacement are
//! case-insensitive, matching HTTP semantics.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Marker written in place of a sensitive header value.
pub const REDACTED: &str = "[REDACTED]";

/// Header-name substrings whose values must never appear in a trace.
///
/// Matching is case-insensitive and by substring, so `X-Custom-Api-Key`
/// is caught by `api-key`.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "api-key",
    "x-auth-token",
    "webhook-secret",
    "x-webhook-secret",
];

/// Errors produced when parsing a header line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// The line has no `:` separator.
    #[error("header line {0:?} is not of the form `Name: value`")]
    MissingSeparator(String),

    /// The name part is empty.
    #[error("header line {0:?} has an empty name")]
    EmptyName(String),
}

/// An insertion-ordered list of HTTP headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets `name` to `value`.
    ///
    /// If a header with the same name (ignoring case) exists, it is replaced
    /// in place and takes the new spelling of the name. Otherwise the header
    /// is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.0[idx] = (name, value),
            None => self.0.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value for `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.0[idx].1.as_str())
    }

    /// Returns `true` if a header named `name` is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes every header named `name`, ignoring case, and returns the
    /// value of the first one removed.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.position(name).map(|idx| self.0[idx].1.clone());
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        first
    }

    /// Overlays `other` on top of `self`: each of its headers replaces a
    /// same-named header here, or is appended.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a `Name: value` line as typed on a command line.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError`] if the separator is missing or the name is empty.
    pub fn parse_line(line: &str) -> Result<(String, String), HeaderError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| HeaderError::MissingSeparator(line.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(HeaderError::EmptyName(line.to_owned()));
        }
        Ok((name.to_owned(), value.trim().to_owned()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (name, value) in iter {
            list.insert(name, value);
        }
        list
    }
}

impl Serialize for HeaderList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// Returns `true` if `name` contains any entry of [`SENSITIVE_HEADERS`],
/// ignoring case.
#[must_use]
pub fn is_sensitive(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.iter().any(|s| lower.contains(s))
}

/// Returns a copy of `headers` that is safe to log or display.
///
/// Every sensitive header keeps its name and position but its value is
/// replaced with [`REDACTED`]. All other headers are copied unchanged.
#[must_use]
pub fn redact_headers(headers: &HeaderList) -> HeaderList {
    HeaderList(
        headers
            .0
            .iter()
            .map(|(name, value)| {
                let value = if is_sensitive(name) {
                    REDACTED.to_owned()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HeaderList {
        HeaderList::new()
            .with("Authorization", "Bearer sk_live_123")
            .with("X-Client-Id", "client-1")
            .with("Content-Type", "application/json")
            .with("X-Custom-Api-Key", "abc")
            .with("x-webhook-secret", "whsec")
            .with("X-Auth-Token", "tok")
    }

    #[test]
    fn test_redact_marks_sensitive_values() {
        let redacted = redact_headers(&sample());
        assert_eq!(redacted.get("Authorization"), Some(REDACTED));
        assert_eq!(redacted.get("X-Custom-Api-Key"), Some(REDACTED));
        assert_eq!(redacted.get("x-webhook-secret"), Some(REDACTED));
        assert_eq!(redacted.get("X-Auth-Token"), Some(REDACTED));
        assert_eq!(redacted.get("X-Client-Id"), Some("client-1"));
        assert_eq!(redacted.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_redact_preserves_names_and_order() {
        let input = sample();
        let redacted = redact_headers(&input);
        let before: Vec<&str> = input.iter().map(|(n, _)| n).collect();
        let after: Vec<&str> = redacted.iter().map(|(n, _)| n).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_redact_is_idempotent() {
        let once = redact_headers(&sample());
        assert_eq!(redact_headers(&once), once);
    }

    #[test]
    fn test_redact_empty() {
        assert!(redact_headers(&HeaderList::new()).is_empty());
    }

    #[test]
    fn test_sensitive_match_ignores_case() {
        assert!(is_sensitive("AUTHORIZATION"));
        assert!(is_sensitive("Proxy-Authorization"));
        assert!(is_sensitive("Api-Key"));
        assert!(!is_sensitive("X-Request-Id"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut headers = HeaderList::new()
            .with("Authorization", "Bearer a")
            .with("Content-Type", "application/json");
        headers.insert("authorization", "secret-token");

        let pairs: Vec<(&str, &str)> = headers.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("authorization", "secret-token"),
                ("Content-Type", "application/json")
            ]
        );
    }

    #[test]
    fn test_remove_drops_all_spellings() {
        let mut headers: HeaderList = [("X-Idempotency-Key", "a"), ("Accept", "*/*")]
            .into_iter()
            .collect();
        headers.0.push(("x-idempotency-key".into(), "b".into()));
        assert_eq!(headers.remove("X-IDEMPOTENCY-KEY").as_deref(), Some("a"));
        assert!(!headers.contains("x-idempotency-key"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let headers = HeaderList::new().with("Zeta", "1").with("Alpha", "2");
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"Zeta":"1","Alpha":"2"}"#);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            HeaderList::parse_line("Authorization: secret-token").unwrap(),
            ("Authorization".to_owned(), "secret-token".to_owned())
        );
        assert_eq!(
            HeaderList::parse_line("X-Trace:a:b").unwrap(),
            ("X-Trace".to_owned(), "a:b".to_owned())
        );
        assert!(matches!(
            HeaderList::parse_line("novalue"),
            Err(HeaderError::MissingSeparator(_))
        ));
        assert!(matches!(
            HeaderList::parse_line(" : x"),
            Err(HeaderError::EmptyName(_))
        ));
    }
}
