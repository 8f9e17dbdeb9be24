//! Command-line client for the walletkit payments API.
//!
//! Every subcommand issues one request through
//! [`ResilientClient`](walletkit_http::ResilientClient) and prints the
//! redacted [`RequestTrace`](walletkit::RequestTrace) as pretty JSON.
//!
//! # Modules
//!
//! - [`cli`] - Argument definitions
//! - [`commands`] - Subcommand execution
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`error`] - CLI error types

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use error::CliError;
