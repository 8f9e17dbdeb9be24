#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Resilient HTTP client for a wallet's payments provider.
//!
//! Every outbound call goes through [`ResilientClient::send`], which adds
//! authentication and idempotency headers, retries transport failures,
//! 429 and 5xx responses with exponential backoff, and returns a redacted
//! [`RequestTrace`](walletkit::RequestTrace) of the final exchange.
//! [`WalletApi`] puts typed wallet, transfer and rate endpoints on top.
//!
//! # Modules
//!
//! - [`client`] - [`ResilientClient`] and the retry loop
//! - [`config`] - [`ClientConfig`] and environment loading
//! - [`constants`] - Header names, base URLs, environment variable names
//! - [`error`] - [`SendError`]
//! - [`middleware`] - Redacted request logging for `reqwest-middleware`
//! - [`request`] / [`response`] - Per-call options and results
//! - [`wallet`] - Typed wallet API
//!
//! # Example
//!
//! ```no_run
//! use walletkit_http::{ClientConfig, ResilientClient, SendOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ResilientClient::new(ClientConfig::from_env()?)?;
//! let result = client
//!     .send(
//!         "/api/v1/transfers",
//!         SendOptions::post(serde_json::json!({"amount": 10.0, "currency": "USD"})),
//!     )
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&result.trace)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing in the `walletkit` core crate

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use client::{PreparedRequest, ResilientClient};
pub use config::{ClientConfig, ConfigError, Environment};
pub use error::SendError;
pub use middleware::RedactedLogging;
pub use request::SendOptions;
pub use response::SendResult;
pub use wallet::{ApiResponse, TransactionQuery, WalletApi, WalletApiError};
