//! Subcommand execution.

use std::io::Write;

use walletkit::RequestTrace;
use walletkit::proto::WalletToWalletTransfer;
use walletkit_http::{SendOptions, TransactionQuery, WalletApi, WalletApiError};

use crate::cli::Command;
use crate::error::CliError;

/// Runs `command` and returns the trace of its exchange.
///
/// A typed call that fails with a non-2xx status still yields its trace
/// through [`WalletApiError::trace`].
///
/// # Errors
///
/// Returns [`CliError`] when the request fails or the status is not 2xx.
pub async fn execute(command: Command, api: &WalletApi) -> Result<RequestTrace, CliError> {
    match command {
        Command::Request {
            method,
            path,
            body,
            headers,
            idempotency_key,
        } => {
            let mut options = SendOptions::new(method);
            options.body = body;
            options.idempotency_key = idempotency_key;
            options.headers = headers.into_iter().collect();

            let result = api.client().send(&path, options).await?;
            if result.success {
                Ok(result.trace)
            } else {
                let message = result.message().unwrap_or_default();
                print_trace(&result.trace)?;
                Err(CliError::Unsuccessful {
                    status: result.status,
                    message,
                })
            }
        }
        Command::Balances { wallet } => typed(api.wallet_balances(&wallet).await),
        Command::Transactions {
            wallet,
            limit,
            offset,
            currency,
        } => {
            let query = TransactionQuery {
                limit,
                offset,
                currency,
            };
            typed(api.transactions(&wallet, &query).await)
        }
        Command::Transfer {
            to,
            amount,
            currency,
            reference,
            description,
            operation,
        } => {
            let operation = operation.unwrap_or_else(|| format!("transfer:{reference}"));
            let request = WalletToWalletTransfer {
                recipient_wallet_id: to,
                amount,
                currency,
                reference,
                description,
            };
            typed(api.wallet_transfer(&operation, &request).await)
        }
        Command::Rate { from, to } => typed(api.exchange_rate(&from, &to).await),
    }
}

fn typed<T>(
    result: Result<walletkit_http::ApiResponse<T>, WalletApiError>,
) -> Result<RequestTrace, CliError> {
    match result {
        Ok(response) => Ok(response.trace),
        Err(err) => {
            if let Some(trace) = err.trace() {
                print_trace(trace)?;
            }
            Err(err.into())
        }
    }
}

/// Writes `trace` to stdout as pretty JSON.
///
/// # Errors
///
/// Returns [`CliError`] if rendering or writing fails.
pub fn print_trace(trace: &RequestTrace) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(trace)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
