use async_trait::async_trait;
use rust_decimal::Decimal;

use super::metadata::MarketMetadataSource;
use crate::error::Result;
use crate::http::{with_query, HttpClient};
use crate::types::{FeeRateResponse, NegRiskResponse, OrderBookSummary, TickSizeResponse, TokenId};

/// Client for the public (L0) CLOB endpoints
///
/// Serves the market metadata order construction depends on: tick size,
/// neg-risk flag, fee rate and the order book.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http_client: HttpClient,
}

impl ClobClient {
    /// Create a new ClobClient
    ///
    /// # Arguments
    /// * `host` - The base URL for the API (e.g., "https://clob.polymarket.com")
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(host),
        }
    }

    /// Check if the server is responsive
    pub async fn get_ok(&self) -> Result<serde_json::Value> {
        self.http_client.get("/", None).await
    }

    /// Get current server time
    pub async fn get_server_time(&self) -> Result<serde_json::Value> {
        self.http_client.get("/time", None).await
    }

    /// Get the minimum tick size for a token
    pub async fn get_tick_size(&self, token_id: &TokenId) -> Result<TickSizeResponse> {
        let path = with_query("/tick-size", &[("token_id", token_id.to_string())]);
        self.http_client.get(&path, None).await
    }

    /// Check whether a token belongs to a neg-risk market
    pub async fn get_neg_risk(&self, token_id: &TokenId) -> Result<NegRiskResponse> {
        let path = with_query("/neg-risk", &[("token_id", token_id.to_string())]);
        self.http_client.get(&path, None).await
    }

    /// Get the market's base fee rate in basis points
    pub async fn get_fee_rate(&self, token_id: &TokenId) -> Result<FeeRateResponse> {
        let path = with_query("/fee-rate", &[("token_id", token_id.to_string())]);
        self.http_client.get(&path, None).await
    }

    /// Get the order book for a token
    pub async fn get_order_book(&self, token_id: &TokenId) -> Result<OrderBookSummary> {
        let path = with_query("/book", &[("token_id", token_id.to_string())]);
        self.http_client.get(&path, None).await
    }
}

#[async_trait]
impl MarketMetadataSource for ClobClient {
    async fn tick_size(&self, token_id: &TokenId) -> Result<Decimal> {
        Ok(self.get_tick_size(token_id).await?.minimum_tick_size)
    }

    async fn neg_risk(&self, token_id: &TokenId) -> Result<bool> {
        Ok(self.get_neg_risk(token_id).await?.neg_risk)
    }

    async fn fee_rate_bps(&self, token_id: &TokenId) -> Result<u64> {
        Ok(self.get_fee_rate(token_id).await?.base_fee)
    }

    async fn order_book(&self, token_id: &TokenId) -> Result<OrderBookSummary> {
        self.get_order_book(token_id).await
    }
}
