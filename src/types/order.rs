use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::serde_helpers::serialize_checksummed;
use super::{OrderType, Side, SignatureType, TokenId};

/// Limit order intent
#[derive(Debug, Clone)]
pub struct OrderArgs {
    pub token_id: TokenId,
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
}

impl OrderArgs {
    pub fn new(token_id: impl Into<TokenId>, price: Decimal, size: Decimal, side: Side) -> Self {
        Self {
            token_id: token_id.into(),
            price,
            size,
            side,
        }
    }
}

/// Market order intent
///
/// `amount` is collateral to spend for a BUY and shares to sell for a SELL.
#[derive(Debug, Clone)]
pub struct MarketOrderArgs {
    pub token_id: TokenId,
    pub amount: Decimal,
    pub side: Side,
    /// Worst acceptable price; derived from the book when absent
    pub price: Option<Decimal>,
    pub order_type: OrderType,
}

impl MarketOrderArgs {
    pub fn new(token_id: impl Into<TokenId>, amount: Decimal, side: Side) -> Self {
        Self {
            token_id: token_id.into(),
            amount,
            side,
            price: None,
            order_type: OrderType::FOK,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }
}

/// Optional order fields
#[derive(Debug, Clone)]
pub struct ExtraOrderArgs {
    pub fee_rate_bps: u32,
    pub nonce: U256,
    pub taker: Address,
}

impl Default for ExtraOrderArgs {
    fn default() -> Self {
        Self {
            fee_rate_bps: 0,
            nonce: U256::ZERO,
            taker: Address::ZERO,
        }
    }
}

/// Market parameters supplied by the caller instead of looked up remotely
#[derive(Debug, Clone, Default)]
pub struct CreateOrderOptions {
    pub tick_size: Option<Decimal>,
    pub neg_risk: Option<bool>,
    /// Skip every remote lookup; `tick_size` and `neg_risk` become mandatory
    pub raw: bool,
}

impl CreateOrderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_size(mut self, tick_size: Decimal) -> Self {
        self.tick_size = Some(tick_size);
        self
    }

    pub fn neg_risk(mut self, neg_risk: bool) -> Self {
        self.neg_risk = Some(neg_risk);
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// A fully signed exchange order in the order book service's wire format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrderRequest {
    pub salt: u64,
    #[serde(serialize_with = "serialize_checksummed")]
    pub maker: Address,
    #[serde(serialize_with = "serialize_checksummed")]
    pub signer: Address,
    #[serde(serialize_with = "serialize_checksummed")]
    pub taker: Address,
    pub token_id: String,
    pub maker_amount: String,
    pub taker_amount: String,
    pub expiration: String,
    pub nonce: String,
    pub fee_rate_bps: String,
    pub side: Side,
    pub signature_type: SignatureType,
    pub signature: String,
}

/// Body of `POST /order`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOrder {
    pub order: SignedOrderRequest,
    pub owner: String,
    pub order_type: OrderType,
    pub post_only: bool,
}

impl PostOrder {
    pub fn new(order: SignedOrderRequest, owner: String, order_type: OrderType, post_only: bool) -> Self {
        Self {
            order,
            owner,
            order_type,
            post_only,
        }
    }
}

/// A signed order paired with how it should rest on the book
#[derive(Debug, Clone)]
pub struct PostOrdersArgs {
    pub order: SignedOrderRequest,
    pub order_type: OrderType,
    pub post_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_msg: String,
    #[serde(rename = "orderID", default)]
    pub order_id: String,
    #[serde(default)]
    pub order_hashes: Vec<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrdersResponse {
    #[serde(default)]
    pub canceled: Vec<String>,
    #[serde(default)]
    pub not_canceled: HashMap<String, String>,
}
