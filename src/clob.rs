use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::signers::LocalWallet;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::auth::{generate_headers, generate_l1_headers, get_timestamp};
use crate::types::{ApiCredentials, MarketsPage, Order, Orderbook, Side};

#[derive(Debug, Error)]
pub enum ClobError {
    /// The venue has nothing at this path (e.g. no order book for a token)
    #[error("not found: {0}")]
    NotFound(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CLOB API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl ClobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClobError::NotFound(_))
    }
}

/// Read side of the exchange used by the scan pipeline
#[async_trait]
pub trait Exchange: Send + Sync {
    /// One page of sampling markets starting at `cursor` ("" for the first page)
    async fn get_sampling_markets(&self, cursor: &str) -> Result<MarketsPage, ClobError>;

    /// Quoted price for a token and side, `None` when the venue has no quote
    async fn get_price(&self, token_id: &str, side: Side) -> Result<Option<Decimal>, ClobError>;

    async fn get_order_book(&self, token_id: &str) -> Result<Orderbook, ClobError>;
}

#[derive(Clone)]
pub struct ClobClient {
    client: Client,
    base_url: String,
    credentials: Option<ApiCredentials>,
    address: String,
}

impl ClobClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent("py_clob_client")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            address: String::new(),
        })
    }

    /// Enable L2-authenticated calls (order submission)
    pub fn with_credentials(mut self, credentials: ApiCredentials, address: &str) -> Self {
        self.credentials = Some(credentials);
        self.address = address.to_string();
        self
    }

    pub fn credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ClobError> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(ClobError::NotFound(format!("{}: {}", what, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClobError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        trace!("{} fetched in {:?}", what, start.elapsed());

        serde_json::from_slice(&bytes)
            .map_err(|e| ClobError::Decode(format!("{}: {}", what, e)))
    }

    /// Derive API key (deterministic from private key)
    pub async fn derive_api_key(
        &self,
        wallet: &LocalWallet,
        nonce: u64,
    ) -> Result<ApiCredentials, ClobError> {
        let url = format!("{}/auth/derive-api-key", self.base_url);
        let headers = l1_headers(wallet, nonce)?;

        debug!("Deriving API key");
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        self.send_json(request, "derive-api-key").await
    }

    pub async fn create_api_key(
        &self,
        wallet: &LocalWallet,
        nonce: u64,
    ) -> Result<ApiCredentials, ClobError> {
        let url = format!("{}/auth/api-key", self.base_url);
        let headers = l1_headers(wallet, nonce)?;

        debug!("Creating API key");
        let mut request = self.client.post(&url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        self.send_json(request, "api-key").await
    }

    /// Derive existing credentials, creating them on first use
    pub async fn create_or_derive_api_creds(&self, wallet: &LocalWallet) -> Result<ApiCredentials> {
        match self.derive_api_key(wallet, 0).await {
            Ok(creds) => Ok(creds),
            Err(e) => {
                warn!("Deriving API key failed ({}), creating a new one", e);
                self.create_api_key(wallet, 0)
                    .await
                    .context("Failed to create or derive API credentials")
            }
        }
    }

    /// Post a signed order to CLOB
    pub async fn post_order(&self, order: &Order) -> Result<serde_json::Value> {
        let creds = self
            .credentials
            .as_ref()
            .context("API credentials required to post orders")?;

        let path = "/order";
        let body = serde_json::to_string(order)?;
        let headers = generate_headers(creds, &self.address, "POST", path, &body)?;

        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        for (key, value) in headers {
            request = request.header(&key, &value);
        }

        let start = Instant::now();
        let response = request.body(body).send().await.context("Failed to post order")?;
        let status = response.status();
        let result: serde_json::Value =
            response.json().await.context("Failed to parse order response")?;

        info!("CLOB POST /order: status={} in {:?}", status, start.elapsed());

        if !status.is_success() {
            anyhow::bail!("Order failed: {} - {:?}", status, result);
        }

        Ok(result)
    }
}

#[async_trait]
impl Exchange for ClobClient {
    async fn get_sampling_markets(&self, cursor: &str) -> Result<MarketsPage, ClobError> {
        let url = format!("{}/sampling-markets", self.base_url);
        let request = self.client.get(&url).query(&[("next_cursor", cursor)]);
        self.send_json(request, "sampling-markets").await
    }

    async fn get_price(&self, token_id: &str, side: Side) -> Result<Option<Decimal>, ClobError> {
        let url = format!("{}/price", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("token_id", token_id), ("side", side.as_str())]);

        quote_from_response(self.send_json(request, "price").await)
    }

    async fn get_order_book(&self, token_id: &str) -> Result<Orderbook, ClobError> {
        let url = format!("{}/book", self.base_url);
        let request = self.client.get(&url).query(&[("token_id", token_id)]);
        self.send_json(request, "book").await
    }
}

fn l1_headers(wallet: &LocalWallet, nonce: u64) -> Result<Vec<(String, String)>, ClobError> {
    generate_l1_headers(wallet, get_timestamp(), nonce)
        .map_err(|e| ClobError::Signing(format!("L1 auth: {}", e)))
}

/// A 404 or a body without a usable price is an absent quote
fn quote_from_response(
    response: Result<serde_json::Value, ClobError>,
) -> Result<Option<Decimal>, ClobError> {
    match response {
        Ok(body) => Ok(parse_price(&body)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// `{"price": "0.45"}`; numbers are accepted too
fn parse_price(response: &serde_json::Value) -> Option<Decimal> {
    match response.get("price")? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
