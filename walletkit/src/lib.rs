#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for talking to a payments provider from a wallet front end.
//!
//! This crate holds the transport-independent pieces of a resilient
//! payments client. The HTTP layer itself lives in `walletkit-http`.
//!
//! # Modules
//!
//! - [`headers`] - Ordered header lists and redaction of secrets
//! - [`idempotency`] - Session-scoped idempotency token registry
//! - [`retry`] - Retry policy, retry state machine, and the sleep seam
//! - [`trace`] - Redacted request/response capture for debugging
//! - [`proto`] - Provider wire types (wallets, transfers, transactions)
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod headers;
pub mod idempotency;
pub mod proto;
pub mod retry;
pub mod trace;

pub use headers::{HeaderList, REDACTED, redact_headers};
pub use idempotency::IdempotencyRegistry;
pub use retry::{AttemptOutcome, RetryMachine, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use trace::{RequestTrace, ResponseBody};
