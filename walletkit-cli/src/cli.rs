//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use http::Method;
use rust_decimal::Decimal;
use serde_json::Value;
use walletkit::HeaderList;
use walletkit_http::constants::{ENV_API_BASE, ENV_API_KEY, ENV_CLIENT_ID, ENV_ENVIRONMENT};
use walletkit_http::wallet::DEFAULT_TRANSACTION_LIMIT;

use crate::config::{DEFAULT_CONFIG_PATH, Overrides};

/// Talk to the payments provider and print redacted request traces.
#[derive(Debug, Parser)]
#[command(name = "walletkit", version, about)]
pub struct Cli {
    /// Connection and configuration options.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// API base URL.
    #[arg(long, env = ENV_API_BASE, global = true)]
    pub base_url: Option<String>,

    /// `sandbox` or `production`; picks the base URL when none is given.
    #[arg(long, env = ENV_ENVIRONMENT, global = true)]
    pub environment: Option<String>,

    /// Bearer credential.
    #[arg(long, env = ENV_API_KEY, hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Client id sent in `X-Client-Id`.
    #[arg(long, env = ENV_CLIENT_ID, global = true)]
    pub client_id: Option<String>,

    /// Exchange the API key for a bearer token at the login endpoint.
    #[arg(long, global = true)]
    pub login: bool,

    /// Overall deadline for the command, in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Total attempts per request, including the first.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,
}

impl GlobalArgs {
    /// Values that override the configuration file.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            environment: self.environment.clone(),
            api_key: self.api_key.clone(),
            client_id: self.client_id.clone(),
            login: self.login,
            timeout_secs: self.timeout,
            max_attempts: self.max_attempts,
        }
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send an arbitrary request.
    Request {
        /// HTTP method.
        #[arg(value_parser = parse_method)]
        method: Method,
        /// Path below the base URL, e.g. `/api/v1/wallets`.
        path: String,
        /// JSON request body.
        #[arg(long, value_parser = parse_json)]
        body: Option<Value>,
        /// Extra header as `Name: value`; repeatable.
        #[arg(long = "header", short = 'H', value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Idempotency token for mutating methods.
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Show a wallet's balances.
    Balances {
        /// Wallet id.
        wallet: String,
    },

    /// List a wallet's transactions.
    Transactions {
        /// Wallet id.
        wallet: String,
        /// Page size.
        #[arg(long, default_value_t = DEFAULT_TRANSACTION_LIMIT)]
        limit: u32,
        /// Entries to skip.
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Only this currency.
        #[arg(long)]
        currency: Option<String>,
    },

    /// Move money to another wallet.
    Transfer {
        /// Recipient wallet id.
        #[arg(long)]
        to: String,
        /// Amount, e.g. `10.00`.
        #[arg(long)]
        amount: Decimal,
        /// ISO 4217 currency code.
        #[arg(long)]
        currency: String,
        /// Reference shown to both parties.
        #[arg(long)]
        reference: String,
        /// Free-form note.
        #[arg(long)]
        description: Option<String>,
        /// Operation key for idempotency; defaults to `transfer:<reference>`.
        #[arg(long)]
        operation: Option<String>,
    },

    /// Quote an exchange rate.
    Rate {
        /// Source currency.
        from: String,
        /// Target currency.
        to: String,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    HeaderList::parse_line(s).map_err(|e| e.to_string())
}
