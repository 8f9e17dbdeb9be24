//! `walletkit` command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Balances of a wallet, credentials from the environment or .env
//! WALLETKIT_API_KEY=sk_test walletkit balances w_123
//!
//! # Raw request with a custom header and a 10 second deadline
//! walletkit --timeout 10 request POST /api/v1/transfers \
//!     --body '{"amount": 10.00, "currency": "USD"}' -H 'X-Trace: t1'
//!
//! # Log in for a bearer token first
//! walletkit --login --client-id cid transactions w_123
//!
//! # Configure logging level
//! RUST_LOG=walletkit_http=debug walletkit rate USD EUR
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `walletkit.toml`)
//! - `WALLETKIT_API_BASE`, `WALLETKIT_API_KEY`, `WALLETKIT_CLIENT_ID`,
//!   `WALLETKIT_ENVIRONMENT` - Connection settings
//! - `RUST_LOG` - Log level filter (default: `info`)

use clap::Parser;
use tracing_subscriber::EnvFilter;
use walletkit_cli::commands::{execute, print_trace};
use walletkit_cli::config::FileConfig;
use walletkit_cli::{Cli, CliError};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = FileConfig::load_from(&cli.global.config)?.resolve(cli.global.overrides())?;
    tracing::debug!(
        config = ?settings.client,
        login = settings.login,
        timeout = ?settings.timeout,
        "Loaded configuration"
    );

    let deadline = settings.timeout;
    let api = settings.api()?;

    let trace = tokio::select! {
        result = tokio::time::timeout(deadline, execute(cli.command, &api)) => {
            result.map_err(|_| CliError::Timeout(deadline))??
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, aborting");
            return Err(CliError::Interrupted);
        }
    };

    print_trace(&trace)
}
