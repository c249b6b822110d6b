use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::serde_helpers::{deserialize_decimal, deserialize_u64};

/// A single price level of the order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    #[serde(deserialize_with = "deserialize_decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub size: Decimal,
}

impl OrderSummary {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Order book snapshot for one token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSummary {
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub bids: Vec<OrderSummary>,
    #[serde(default)]
    pub asks: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSizeResponse {
    #[serde(deserialize_with = "deserialize_decimal")]
    pub minimum_tick_size: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegRiskResponse {
    pub neg_risk: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRateResponse {
    #[serde(deserialize_with = "deserialize_u64")]
    pub base_fee: u64,
}
