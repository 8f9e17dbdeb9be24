use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    /// Usable.
    Active,
    /// Closed by the holder.
    Inactive,
    /// Frozen by the provider.
    Suspended,
}

/// Balance of one currency inside a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Spendable now.
    #[serde(with = "rust_decimal::serde::float")]
    pub available_amount: Decimal,
    /// Incoming, not yet settled.
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_amount: Decimal,
    /// Held for outgoing transfers.
    #[serde(with = "rust_decimal::serde::float")]
    pub reserved_amount: Decimal,
    /// Sum of the three above.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// A multi-currency wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Provider wallet id.
    pub id: String,
    /// Per-currency balances.
    #[serde(default)]
    pub balances: Vec<WalletBalance>,
    /// Wallet status.
    pub status: WalletStatus,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 last update time.
    pub updated_at: String,
}

/// Body of `POST /api/v1/wallets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    /// Primary currency.
    pub currency: String,
    /// Wallet type; the provider only offers `multi_currency`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl CreateWalletRequest {
    /// A multi-currency wallet with `currency` as its primary currency.
    #[must_use]
    pub fn multi_currency(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            kind: "multi_currency".to_owned(),
        }
    }
}

/// How a top-up is funded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FundingMethod {
    /// A tokenized card.
    Card {
        /// Card token from the provider's card vault.
        card_token: String,
    },
    /// A linked bank account.
    BankTransfer {
        /// Provider id of the linked account.
        bank_account_id: String,
    },
}

/// Body of `POST /api/v1/wallets/{id}/top-up`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpRequest {
    /// Amount to add.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Funding source.
    pub payment_method: FundingMethod,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_top_up_wire_shape() {
        let req = TopUpRequest {
            amount: Decimal::from_str("25.50").unwrap(),
            currency: "USD".into(),
            payment_method: FundingMethod::Card {
                card_token: "tok_visa".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "amount": 25.5,
                "currency": "USD",
                "payment_method": {"type": "card", "card_token": "tok_visa"}
            })
        );
    }

    #[test]
    fn test_wallet_decodes() {
        let wallet: Wallet = serde_json::from_value(json!({
            "id": "w_1",
            "status": "active",
            "balances": [{
                "currency": "USD",
                "available_amount": 120.25,
                "pending_amount": 0,
                "reserved_amount": 5,
                "total_amount": 125.25
            }],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(wallet.status, WalletStatus::Active);
        assert_eq!(
            wallet.balances[0].available_amount,
            Decimal::from_str("120.25").unwrap()
        );
    }
}
