use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Purpose code the provider requires for withdrawals to one's own bank.
pub const PERSONAL_TRANSFER: &str = "personal_transfer";

/// Processing status of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Accepted, not yet processing.
    Created,
    /// In flight.
    Processing,
    /// Funds delivered.
    Completed,
    /// Rejected or bounced.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

/// Whether a beneficiary is a person or a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryKind {
    /// A natural person.
    Individual,
    /// A company.
    Business,
}

/// Postal address of a beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// ISO 3166 alpha-2 country.
    pub country_code: String,
    /// State or province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Street and number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    /// Postal or ZIP code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Bank account of a beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Account number or IBAN.
    pub account_number: String,
    /// Domestic routing number (ABA, sort code, BSB).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    /// Name on the account.
    pub account_name: String,
    /// Name of the bank.
    pub bank_name: String,
    /// SWIFT/BIC for international payouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
}

/// A payout recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Assigned by the provider on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Person or company.
    #[serde(rename = "type")]
    pub kind: BeneficiaryKind,
    /// Given name of an individual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name of an individual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Registered name of a business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Postal address.
    pub address: Address,
    /// Account that receives the payout.
    pub bank_details: BankDetails,
}

/// A transfer out of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Provider transfer id.
    pub id: String,
    /// Currency debited from the wallet.
    pub source_currency: String,
    /// Currency delivered to the recipient.
    pub target_currency: String,
    /// Amount debited.
    #[serde(with = "rust_decimal::serde::float")]
    pub source_amount: Decimal,
    /// Amount delivered.
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    /// Present for cross-currency transfers.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub exchange_rate: Option<Decimal>,
    /// Regulatory purpose code.
    pub purpose_code: String,
    /// Reference shown to the recipient.
    pub reference: String,
    /// Processing status.
    pub status: TransferStatus,
    /// Absent on wallet-to-wallet transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Beneficiary>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 last update time.
    pub updated_at: String,
}

/// Body of `POST /api/v1/transfers`.
///
/// Exactly one of `beneficiary_id` and `beneficiary` should be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    /// Currency to debit.
    pub source_currency: String,
    /// Currency to deliver.
    pub target_currency: String,
    /// Amount to debit.
    #[serde(with = "rust_decimal::serde::float")]
    pub source_amount: Decimal,
    /// Regulatory purpose code, e.g. [`PERSONAL_TRANSFER`].
    pub purpose_code: String,
    /// Reference shown to the recipient.
    pub reference: String,
    /// An existing beneficiary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_id: Option<String>,
    /// An inline beneficiary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Beneficiary>,
}

impl CreateTransferRequest {
    /// A same-currency payout to an existing beneficiary's bank account.
    #[must_use]
    pub fn withdrawal(
        amount: Decimal,
        currency: impl Into<String>,
        beneficiary_id: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        let currency = currency.into();
        Self {
            source_currency: currency.clone(),
            target_currency: currency,
            source_amount: amount,
            purpose_code: PERSONAL_TRANSFER.to_owned(),
            reference: reference.into(),
            beneficiary_id: Some(beneficiary_id.into()),
            beneficiary: None,
        }
    }
}

/// Body of `POST /api/v1/wallet-transfers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletToWalletTransfer {
    /// Wallet that receives the funds.
    pub recipient_wallet_id: String,
    /// Amount to move.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Reference shown to both parties.
    pub reference: String,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money received.
    TransferIn,
    /// Money sent.
    TransferOut,
    /// Card or merchant payment.
    Payment,
    /// Reversal of an earlier payment.
    Refund,
    /// Provider fee.
    Fee,
}

/// Settlement state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Not yet settled.
    Pending,
    /// Settled.
    Completed,
    /// Rejected.
    Failed,
}

/// Channel of the other side of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyKind {
    /// Another wallet.
    Wallet,
    /// A bank account.
    Bank,
    /// A card.
    Card,
}

/// The other side of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Display name.
    pub name: String,
    /// Channel.
    #[serde(rename = "type")]
    pub kind: CounterpartyKind,
}

/// One entry of a wallet's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Provider transaction id.
    pub id: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Human-readable description.
    pub description: String,
    /// Settlement state.
    pub status: TransactionStatus,
    /// RFC 3339 time of the entry.
    pub timestamp: String,
    /// Wallet balance in `currency` after this entry.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_after: Decimal,
    /// Caller reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The other side, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<Counterparty>,
}

/// Response of `GET /api/v1/rates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Units of target currency per unit of source currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}
