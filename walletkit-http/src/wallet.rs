//! Typed wallet API over [`ResilientClient`].
//!
//! Every mutating call takes an *operation key* naming the user action
//! (for example `"send:tx1"`). The token for that key comes from the
//! session's [`IdempotencyRegistry`], so re-submitting the same action
//! after a crash or a double tap presents the same `X-Idempotency-Key`
//! and the provider deduplicates it.
//!
//! With [`WalletApi::with_login`] the API key is first exchanged for a
//! bearer token at [`LOGIN_PATH`]. The token is cached for the session and
//! sent on every call; a 401 triggers one fresh login and one replay of the
//! rejected call with the same idempotency token.

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::form_urlencoded;
use walletkit::IdempotencyRegistry;
use walletkit::RequestTrace;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use walletkit::proto::{
    Beneficiary, CreateTransferRequest, CreateWalletRequest, ExchangeRate, LoginRequest,
    LoginResponse, Page, TopUpRequest, Transaction, Transfer, Wallet, WalletBalance,
    WalletToWalletTransfer,
};

use crate::client::ResilientClient;
use crate::constants::{AUTHORIZATION_HEADER, LOGIN_PATH};
use crate::error::SendError;
use crate::request::SendOptions;
use crate::response::SendResult;

const WALLETS: &str = "/api/v1/wallets";
const TRANSFERS: &str = "/api/v1/transfers";
const WALLET_TRANSFERS: &str = "/api/v1/wallet-transfers";
const BENEFICIARIES: &str = "/api/v1/beneficiaries";
const RATES: &str = "/api/v1/rates";

/// Default page size for transaction history.
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 50;

/// Errors from [`WalletApi`] calls.
#[derive(Debug, thiserror::Error)]
pub enum WalletApiError {
    /// The request could not be sent.
    #[error(transparent)]
    Send(#[from] SendError),

    /// The provider answered with a non-2xx status.
    #[error("{context} failed with HTTP {status}: {message}")]
    Status {
        /// Operation that failed, e.g. `"create transfer"`.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// Provider error code, e.g. `"insufficient_fund"`, when the body
        /// carried one.
        code: Option<String>,
        /// Provider message or status reason.
        message: String,
        /// Redacted capture of the failing exchange.
        trace: Box<RequestTrace>,
    },

    /// The provider refused to exchange the API key for a token.
    ///
    /// No trace is kept: the login request body holds the API key.
    #[error("login failed with HTTP {status}: {message}")]
    Auth {
        /// HTTP status code.
        status: u16,
        /// Provider message or status reason.
        message: String,
    },

    /// A 2xx body did not match the expected shape.
    #[error("{context}: unexpected response body: {source}")]
    Decode {
        /// Operation whose response failed to decode.
        context: &'static str,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be converted to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl WalletApiError {
    /// HTTP status of a [`WalletApiError::Status`] or
    /// [`WalletApiError::Auth`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider error code of a [`WalletApiError::Status`].
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Trace of the failing exchange, when there was one.
    #[must_use]
    pub fn trace(&self) -> Option<&RequestTrace> {
        match self {
            Self::Status { trace, .. } => Some(trace.as_ref()),
            _ => None,
        }
    }
}

/// Decoded payload plus the trace of the exchange that produced it.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Decoded response body.
    pub data: T,
    /// Redacted capture of the exchange.
    pub trace: RequestTrace,
}

impl<T> ApiResponse<T> {
    /// Transforms the payload, keeping the trace.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            trace: self.trace,
        }
    }
}

/// Filters for [`WalletApi::transactions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Page size.
    pub limit: u32,
    /// Entries to skip.
    pub offset: u32,
    /// Only entries in this currency.
    pub currency: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TRANSACTION_LIMIT,
            offset: 0,
            currency: None,
        }
    }
}

/// Credentials for the login exchange and the cached bearer token.
struct TokenAuth {
    client_id: String,
    api_key: String,
    token: RwLock<Option<String>>,
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuth")
            .field("client_id", &self.client_id)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TokenAuth {
    /// Returns the cached token, logging in when there is none or when the
    /// cached one equals `stale`.
    ///
    /// Concurrent callers share one login: the write lock is held across it
    /// and the cache is checked again once the lock is taken.
    async fn bearer(
        &self,
        client: &ResilientClient,
        stale: Option<&str>,
    ) -> Result<String, WalletApiError> {
        let usable = |token: &String| stale != Some(token.as_str());

        let cached = self.token.read().await.clone();
        if let Some(token) = cached.filter(usable) {
            return Ok(token);
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.clone().filter(usable) {
            return Ok(token);
        }
        let token = self.login(client).await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn login(&self, client: &ResilientClient) -> Result<String, WalletApiError> {
        let request = LoginRequest {
            x_client_id: self.client_id.clone(),
            x_api_key: self.api_key.clone(),
        };
        let body = serde_json::to_value(&request).map_err(WalletApiError::Encode)?;
        let result = client.send(LOGIN_PATH, SendOptions::post(body)).await?;
        if !result.success {
            return Err(WalletApiError::Auth {
                status: result.status,
                message: result.message().unwrap_or_default(),
            });
        }
        let response: LoginResponse = result
            .json()
            .map_err(|source| WalletApiError::Decode {
                context: "login",
                source,
            })?;
        debug!(attempts = result.attempts, "Obtained bearer token");
        Ok(response.token)
    }
}

/// Wallet operations against the payments provider.
#[derive(Debug, Clone)]
pub struct WalletApi {
    client: ResilientClient,
    registry: Arc<IdempotencyRegistry>,
    auth: Option<Arc<TokenAuth>>,
}

impl WalletApi {
    /// Wraps `client` with a fresh idempotency registry.
    #[must_use]
    pub fn new(client: ResilientClient) -> Self {
        Self::with_registry(client, Arc::new(IdempotencyRegistry::new()))
    }

    /// Wraps `client`, sharing `registry` with other holders of the same
    /// session.
    #[must_use]
    pub const fn with_registry(client: ResilientClient, registry: Arc<IdempotencyRegistry>) -> Self {
        Self {
            client,
            registry,
            auth: None,
        }
    }

    /// Authenticates with a bearer token obtained by posting `client_id`
    /// and `api_key` to [`LOGIN_PATH`], instead of sending the client's
    /// configured credential.
    ///
    /// The first call logs in; the token is then cached and shared by
    /// clones of this `WalletApi`.
    #[must_use]
    pub fn with_login(mut self, client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.auth = Some(Arc::new(TokenAuth {
            client_id: client_id.into(),
            api_key: api_key.into(),
            token: RwLock::new(None),
        }));
        self
    }

    /// Drops the cached bearer token so the next call logs in again.
    pub async fn logout(&self) {
        if let Some(auth) = &self.auth {
            *auth.token.write().await = None;
        }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &ResilientClient {
        &self.client
    }

    /// The session's idempotency registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<IdempotencyRegistry> {
        &self.registry
    }

    /// Creates a multi-currency wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn create_wallet(
        &self,
        operation_key: &str,
        request: &CreateWalletRequest,
    ) -> Result<ApiResponse<Wallet>, WalletApiError> {
        self.mutate("create wallet", Method::POST, WALLETS.to_owned(), request, operation_key)
            .await
    }

    /// Fetches a wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn wallet(&self, wallet_id: &str) -> Result<ApiResponse<Wallet>, WalletApiError> {
        self.get("get wallet", format!("{WALLETS}/{}", segment(wallet_id)))
            .await
    }

    /// Lists per-currency balances of a wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn wallet_balances(
        &self,
        wallet_id: &str,
    ) -> Result<ApiResponse<Vec<WalletBalance>>, WalletApiError> {
        let response: ApiResponse<Page<WalletBalance>> = self
            .get(
                "get balances",
                format!("{WALLETS}/{}/balances", segment(wallet_id)),
            )
            .await?;
        Ok(response.map(|page| page.items))
    }

    /// Creates a bank payout.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn create_transfer(
        &self,
        operation_key: &str,
        request: &CreateTransferRequest,
    ) -> Result<ApiResponse<Transfer>, WalletApiError> {
        self.mutate(
            "create transfer",
            Method::POST,
            TRANSFERS.to_owned(),
            request,
            operation_key,
        )
        .await
    }

    /// Fetches a transfer.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn transfer(&self, transfer_id: &str) -> Result<ApiResponse<Transfer>, WalletApiError> {
        self.get("get transfer", format!("{TRANSFERS}/{}", segment(transfer_id)))
            .await
    }

    /// Lists transfers, newest first.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn transfers(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<ApiResponse<Vec<Transfer>>, WalletApiError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .finish();
        let response: ApiResponse<Page<Transfer>> = self
            .get("list transfers", format!("{TRANSFERS}?{query}"))
            .await?;
        Ok(response.map(|page| page.items))
    }

    /// Moves money between two wallets held with the provider.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn wallet_transfer(
        &self,
        operation_key: &str,
        request: &WalletToWalletTransfer,
    ) -> Result<ApiResponse<Transfer>, WalletApiError> {
        self.mutate(
            "wallet transfer",
            Method::POST,
            WALLET_TRANSFERS.to_owned(),
            request,
            operation_key,
        )
        .await
    }

    /// Lists a wallet's transaction history.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn transactions(
        &self,
        wallet_id: &str,
        query: &TransactionQuery,
    ) -> Result<ApiResponse<Vec<Transaction>>, WalletApiError> {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params
            .append_pair("limit", &query.limit.to_string())
            .append_pair("offset", &query.offset.to_string());
        if let Some(currency) = &query.currency {
            params.append_pair("currency", currency);
        }
        let path = format!(
            "{WALLETS}/{}/transactions?{}",
            segment(wallet_id),
            params.finish()
        );
        let response: ApiResponse<Page<Transaction>> =
            self.get("list transactions", path).await?;
        Ok(response.map(|page| page.items))
    }

    /// Registers a payout recipient.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn create_beneficiary(
        &self,
        operation_key: &str,
        beneficiary: &Beneficiary,
    ) -> Result<ApiResponse<Beneficiary>, WalletApiError> {
        self.mutate(
            "create beneficiary",
            Method::POST,
            BENEFICIARIES.to_owned(),
            beneficiary,
            operation_key,
        )
        .await
    }

    /// Lists payout recipients.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn beneficiaries(&self) -> Result<ApiResponse<Vec<Beneficiary>>, WalletApiError> {
        let response: ApiResponse<Page<Beneficiary>> = self
            .get("list beneficiaries", BENEFICIARIES.to_owned())
            .await?;
        Ok(response.map(|page| page.items))
    }

    /// Quotes the rate from `source` to `target` currency.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn exchange_rate(
        &self,
        source: &str,
        target: &str,
    ) -> Result<ApiResponse<Decimal>, WalletApiError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("source_currency", source)
            .append_pair("target_currency", target)
            .finish();
        let response: ApiResponse<ExchangeRate> =
            self.get("get exchange rate", format!("{RATES}?{query}")).await?;
        Ok(response.map(|quote| quote.rate))
    }

    /// Funds a wallet from a card or bank account.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn top_up(
        &self,
        operation_key: &str,
        wallet_id: &str,
        request: &TopUpRequest,
    ) -> Result<ApiResponse<Transaction>, WalletApiError> {
        self.mutate(
            "top up",
            Method::POST,
            format!("{WALLETS}/{}/top-up", segment(wallet_id)),
            request,
            operation_key,
        )
        .await
    }

    /// Pays `amount` out to a beneficiary's bank account in the same
    /// currency.
    ///
    /// # Errors
    ///
    /// See [`WalletApiError`].
    pub async fn withdraw_to_bank(
        &self,
        operation_key: &str,
        amount: Decimal,
        currency: &str,
        beneficiary_id: &str,
        reference: &str,
    ) -> Result<ApiResponse<Transfer>, WalletApiError> {
        let request = CreateTransferRequest::withdrawal(amount, currency, beneficiary_id, reference);
        self.create_transfer(operation_key, &request).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        context: &'static str,
        path: String,
    ) -> Result<ApiResponse<T>, WalletApiError> {
        let result = self.dispatch(&path, SendOptions::get()).await?;
        decode(context, result)
    }

    async fn mutate<B, T>(
        &self,
        context: &'static str,
        method: Method,
        path: String,
        body: &B,
        operation_key: &str,
    ) -> Result<ApiResponse<T>, WalletApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(WalletApiError::Encode)?;
        let token = self.registry.get_or_create(Some(operation_key));
        let options = SendOptions::new(method)
            .with_body(body)
            .with_idempotency_key(token);
        let result = self.dispatch(&path, options).await?;
        decode(context, result)
    }

    /// Sends through the client, adding the session's bearer token when
    /// login is configured. A 401 answered to a cached token is replayed
    /// once after a fresh login.
    async fn dispatch(&self, path: &str, options: SendOptions) -> Result<SendResult, WalletApiError> {
        let Some(auth) = &self.auth else {
            return Ok(self.client.send(path, options).await?);
        };

        let token = auth.bearer(&self.client, None).await?;
        let result = self
            .client
            .send(path, with_bearer(options.clone(), &token))
            .await?;
        if result.status != StatusCode::UNAUTHORIZED.as_u16() {
            return Ok(result);
        }

        warn!(path, "Bearer token rejected, logging in again");
        let token = auth.bearer(&self.client, Some(&token)).await?;
        Ok(self.client.send(path, with_bearer(options, &token)).await?)
    }
}

fn with_bearer(options: SendOptions, token: &str) -> SendOptions {
    options.with_header(AUTHORIZATION_HEADER, format!("Bearer {token}"))
}

fn decode<T: DeserializeOwned>(
    context: &'static str,
    result: SendResult,
) -> Result<ApiResponse<T>, WalletApiError> {
    if !result.success {
        return Err(WalletApiError::Status {
            context,
            status: result.status,
            code: result.error_body().map(|e| e.code).filter(|c| !c.is_empty()),
            message: result.message().unwrap_or_default(),
            trace: Box::new(result.trace),
        });
    }
    let data = result
        .json()
        .map_err(|source| WalletApiError::Decode { context, source })?;
    Ok(ApiResponse {
        data,
        trace: result.trace,
    })
}

/// Percent-encodes one path segment.
///
/// `byte_serialize` is the form encoder and turns a space into `+`, which a
/// path does not decode. A literal `+` comes out as `%2B`, so every `+` left
/// in the output stands for a space.
fn segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::{Value, json};
    use walletkit::proto::{FundingMethod, TransferStatus};
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::RecordingSleeper;

    fn api(server: &MockServer) -> WalletApi {
        let client = ResilientClient::new(ClientConfig::new(server.uri()).with_api_key("sk_test"))
            .unwrap()
            .with_sleeper(RecordingSleeper::default());
        WalletApi::new(client)
    }

    fn transfer_json(id: &str) -> Value {
        json!({
            "id": id,
            "source_currency": "USD",
            "target_currency": "USD",
            "source_amount": 10.0,
            "target_amount": 10.0,
            "purpose_code": "personal_transfer",
            "reference": "tx1",
            "status": "created",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    async fn idempotency_keys(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|r| r.headers.get("x-idempotency-key"))
            .map(|v| v.to_str().unwrap().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_resubmitted_operation_reuses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transfers"))
            .respond_with(ResponseTemplate::new(201).set_body_json(transfer_json("tr_1")))
            .mount(&server)
            .await;

        let api = api(&server);
        let request =
            CreateTransferRequest::withdrawal(Decimal::from_str("10").unwrap(), "USD", "ben_1", "tx1");
        api.create_transfer("send:tx1", &request).await.unwrap();
        api.create_transfer("send:tx1", &request).await.unwrap();
        api.create_transfer("send:tx2", &request).await.unwrap();

        let keys = idempotency_keys(&server).await;
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_eq!(api.registry().snapshot().get("send:tx1"), Some(&keys[0]));
    }

    #[tokio::test]
    async fn test_cleared_registry_mints_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(transfer_json("tr_1")))
            .mount(&server)
            .await;

        let api = api(&server);
        let request =
            CreateTransferRequest::withdrawal(Decimal::from_str("10").unwrap(), "USD", "ben_1", "tx1");
        api.create_transfer("send:tx1", &request).await.unwrap();
        api.registry().clear();
        api.create_transfer("send:tx1", &request).await.unwrap();

        let keys = idempotency_keys(&server).await;
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_withdraw_sends_same_currency_personal_transfer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transfers"))
            .and(body_partial_json(json!({
                "source_currency": "EUR",
                "target_currency": "EUR",
                "source_amount": 40.5,
                "purpose_code": "personal_transfer",
                "beneficiary_id": "ben_9"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(transfer_json("tr_9")))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server)
            .withdraw_to_bank("withdraw:1", Decimal::from_str("40.5").unwrap(), "EUR", "ben_9", "rent")
            .await
            .unwrap();
        assert_eq!(response.data.id, "tr_9");
        assert_eq!(response.data.status, TransferStatus::Created);
        assert_eq!(response.trace.status(), 201);
    }

    #[tokio::test]
    async fn test_status_error_carries_message_and_trace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "insufficient_fund",
                "message": "Insufficient balance"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = TopUpRequest {
            amount: Decimal::from_str("5").unwrap(),
            currency: "USD".into(),
            payment_method: FundingMethod::Card {
                card_token: "tok_1".into(),
            },
        };
        let err = api(&server)
            .top_up("topup:1", "w/1", &request)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.code(), Some("insufficient_fund"));
        let trace = err.trace().unwrap();
        assert!(trace.url().ends_with("/api/v1/wallets/w%2F1/top-up"));
        assert_eq!(trace.req_headers().get("authorization"), Some("[REDACTED]"));
        assert!(err.to_string().contains("Insufficient balance"));
    }

    #[tokio::test]
    async fn test_status_error_without_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = api(&server).wallet("w_1").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.code().is_none());
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let err = api(&server).wallet("w_1").await.unwrap_err();
        assert!(matches!(err, WalletApiError::Decode { context: "get wallet", .. }));
    }

    #[tokio::test]
    async fn test_balances_unwraps_list_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1/balances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "currency": "USD",
                    "available_amount": 100.25,
                    "pending_amount": 0,
                    "reserved_amount": 0,
                    "total_amount": 100.25
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let balances = api(&server).wallet_balances("w_1").await.unwrap().data;
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].available_amount, Decimal::from_str("100.25").unwrap());
    }

    #[tokio::test]
    async fn test_transactions_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1/transactions"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", "0"))
            .and(query_param("currency", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let query = TransactionQuery {
            currency: Some("EUR".into()),
            ..TransactionQuery::default()
        };
        let response = api(&server).transactions("w_1", &query).await.unwrap();
        assert!(response.data.is_empty());
        assert!(response.trace.req_headers().get("x-idempotency-key").is_none());
    }

    #[tokio::test]
    async fn test_exchange_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/rates"))
            .and(query_param("source_currency", "USD"))
            .and(query_param("target_currency", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 0.92})))
            .expect(1)
            .mount(&server)
            .await;

        let rate = api(&server).exchange_rate("USD", "EUR").await.unwrap().data;
        assert_eq!(rate, Decimal::from_str("0.92").unwrap());
    }

    fn wallet_json(id: &str) -> Value {
        json!({
            "id": id,
            "balances": [],
            "status": "active",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    fn login_api(server: &MockServer) -> WalletApi {
        api(server).with_login("cid", "sk_secret")
    }

    /// Mounts one login response per token, handed out in order.
    async fn mount_logins(server: &MockServer, tokens: &[&str]) {
        for token in tokens {
            Mock::given(method("POST"))
                .and(path(LOGIN_PATH))
                .and(body_json(json!({"x_client_id": "cid", "x_api_key": "sk_secret"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
                .up_to_n_times(1)
                .expect(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_login_token_is_cached_and_sent_as_bearer() {
        let server = MockServer::start().await;
        mount_logins(&server, &["tok_1"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1/balances"))
            .and(header("authorization", "Bearer tok_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(3)
            .mount(&server)
            .await;

        let api = login_api(&server);
        let (a, b) = tokio::join!(api.wallet_balances("w_1"), api.wallet_balances("w_1"));
        a.unwrap();
        b.unwrap();
        let response = api.clone().wallet_balances("w_1").await.unwrap();

        assert_eq!(response.trace.req_headers().get("authorization"), Some("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_unauthorized_logs_in_again_and_replays_once() {
        let server = MockServer::start().await;
        mount_logins(&server, &["tok_1", "tok_2"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1"))
            .and(header("authorization", "Bearer tok_1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1"))
            .and(header("authorization", "Bearer tok_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wallet_json("w_1")))
            .expect(1)
            .mount(&server)
            .await;

        let response = login_api(&server).wallet("w_1").await.unwrap();
        assert_eq!(response.data.id, "w_1");
        assert_eq!(response.trace.status(), 200);
    }

    #[tokio::test]
    async fn test_replay_after_unauthorized_keeps_idempotency_key() {
        let server = MockServer::start().await;
        mount_logins(&server, &["tok_1", "tok_2"]).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transfers"))
            .and(header("authorization", "Bearer tok_1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/transfers"))
            .and(header("authorization", "Bearer tok_2"))
            .respond_with(ResponseTemplate::new(201).set_body_json(transfer_json("tr_1")))
            .expect(1)
            .mount(&server)
            .await;

        let api = login_api(&server);
        let request =
            CreateTransferRequest::withdrawal(Decimal::from_str("10").unwrap(), "USD", "ben_1", "tx1");
        api.create_transfer("send:tx1", &request).await.unwrap();

        let transfer_keys: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/api/v1/transfers")
            .filter_map(|r| r.headers.get("x-idempotency-key"))
            .map(|v| v.to_str().unwrap().to_owned())
            .collect();
        assert_eq!(transfer_keys.len(), 2);
        assert_eq!(transfer_keys[0], transfer_keys[1]);
        assert_eq!(api.registry().snapshot().get("send:tx1"), Some(&transfer_keys[0]));
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned_without_looping() {
        let server = MockServer::start().await;
        mount_logins(&server, &["tok_1", "tok_2"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/wallets/w_1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "revoked"})))
            .expect(2)
            .mount(&server)
            .await;

        let err = login_api(&server).wallet("w_1").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("revoked"));
    }

    #[tokio::test]
    async fn test_login_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "invalid credentials"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = login_api(&server);
        let err = api.wallet("w_1").await.unwrap_err();
        assert!(matches!(err, WalletApiError::Auth { status: 401, ref message } if message == "invalid credentials"));
        assert!(err.trace().is_none());
        assert!(!err.to_string().contains("sk_secret"));
        assert!(!format!("{api:?}").contains("sk_secret"));

        // Nothing but the login was sent.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_forces_new_login() {
        let server = MockServer::start().await;
        mount_logins(&server, &["tok_1", "tok_2"]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/rates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 1.0})))
            .expect(2)
            .mount(&server)
            .await;

        let api = login_api(&server);
        api.exchange_rate("USD", "USD").await.unwrap();
        api.logout().await;
        api.exchange_rate("USD", "USD").await.unwrap();

        let bearers: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/api/v1/rates")
            .map(|r| r.headers.get("authorization").unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(bearers, vec!["Bearer tok_1", "Bearer tok_2"]);
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("w_1"), "w_1");
        assert_eq!(segment("a/b"), "a%2Fb");
        assert_eq!(segment("my wallet"), "my%20wallet");
        assert_eq!(segment("a+b"), "a%2Bb");
        assert_eq!(segment("a +b"), "a%20%2Bb");
    }

    #[tokio::test]
    async fn test_space_in_id_is_percent_encoded_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no wallet"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = api(&server).wallet("my wallet").await.unwrap_err();
        let trace = err.trace().unwrap();
        assert!(trace.url().ends_with("/api/v1/wallets/my%20wallet"));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.path(), "/api/v1/wallets/my%20wallet");
    }
}
