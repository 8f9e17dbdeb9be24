//! Wire types for the payments provider's wallet API.
//!
//! Field names follow the provider's snake_case JSON. Money amounts are
//! [`Decimal`](rust_decimal::Decimal) on the Rust side and plain JSON
//! numbers on the wire.
//!
//! # Key Types
//!
//! - [`Wallet`] / [`WalletBalance`] - Wallet and per-currency balances
//! - [`Transfer`] / [`CreateTransferRequest`] - Bank payouts
//! - [`WalletToWalletTransfer`] - Internal wallet transfers
//! - [`Transaction`] - Wallet ledger entries as reported by the provider
//! - [`Beneficiary`] - Payout recipients
//! - [`TopUpRequest`] - Wallet funding from card or bank
//! - [`LoginRequest`] / [`LoginResponse`] - API key to bearer token exchange
//! - [`ApiErrorBody`] - The provider's error envelope

use serde::{Deserialize, Serialize};

mod auth;
mod transfer;
mod wallet;

pub use auth::*;
pub use transfer::*;
pub use wallet::*;

/// List envelope used by every collection endpoint: `{ "items": [...] }`.
///
/// A missing `items` field decodes as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Entries on this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Error body returned by the provider alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g., `"insufficient_fund"`).
    #[serde(default)]
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Extra fields the provider attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}
