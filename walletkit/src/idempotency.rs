//! Stable idempotency tokens per logical operation.
//!
//! A wallet session re-submitting "the same" operation (a user tapping
//! *Send* again after a timeout) must present the provider with the same
//! idempotency token, or the provider will treat it as a second transfer.
//! [`IdempotencyRegistry`] maps caller-chosen operation keys such as
//! `"send:tx1"` to one token for as long as the entry lives.
//!
//! The registry is an explicit object owned by whoever issues business
//! operations, typically one per user session behind an `Arc`.
//! Check-then-insert is atomic: two tasks asking for the same unseen key
//! concurrently observe the same token.

use std::collections::BTreeMap;

use dashmap::DashMap;
use uuid::Uuid;

/// Operation key used when the caller does not supply one.
pub const DEFAULT_OPERATION_KEY: &str = "default";

/// Session-scoped cache of idempotency tokens keyed by operation.
#[derive(Debug, Default)]
pub struct IdempotencyRegistry {
    tokens: DashMap<String, String>,
}

impl IdempotencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh random token (UUID v4) that is not registered.
    #[must_use]
    pub fn mint() -> String {
        Uuid::new_v4().to_string()
    }

    /// Returns the token for `operation_key`, creating one on first use.
    ///
    /// `None` selects [`DEFAULT_OPERATION_KEY`]. The lookup and the insert
    /// happen under the same shard lock, so concurrent callers racing on a
    /// new key all receive the token that was stored.
    pub fn get_or_create(&self, operation_key: Option<&str>) -> String {
        let key = operation_key.unwrap_or(DEFAULT_OPERATION_KEY);
        if let Some(existing) = self.tokens.get(key) {
            return existing.value().clone();
        }
        let entry = self.tokens.entry(key.to_owned()).or_insert_with(|| {
            #[cfg(feature = "telemetry")]
            tracing::trace!(operation = key, "Minted idempotency token");
            Self::mint()
        });
        entry.value().clone()
    }

    /// Forgets the token for one operation, returning it if present.
    ///
    /// Call this once an operation has definitely completed so that a later,
    /// genuinely new operation under the same key gets a new token.
    pub fn remove(&self, operation_key: &str) -> Option<String> {
        self.tokens.remove(operation_key).map(|(_, token)| token)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.tokens.clear();
    }

    /// Returns an owned copy of the current mapping, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.tokens
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no operation is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
