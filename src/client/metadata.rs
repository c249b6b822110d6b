use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

use crate::error::Result;
use crate::types::{OrderBookSummary, TokenId};

/// Source of per-token market parameters used to build orders
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketMetadataSource: Send + Sync {
    async fn tick_size(&self, token_id: &TokenId) -> Result<Decimal>;
    async fn neg_risk(&self, token_id: &TokenId) -> Result<bool>;
    async fn fee_rate_bps(&self, token_id: &TokenId) -> Result<u64>;
    async fn order_book(&self, token_id: &TokenId) -> Result<OrderBookSummary>;
}

/// Read-mostly cache in front of a [`MarketMetadataSource`].
///
/// Tick size, neg-risk flag and fee rate never change for a token, so they are
/// cached for the life of the cache. Concurrent misses for the same token
/// both fetch and the last write wins. Order books are never cached.
pub struct CachedMetadata<S> {
    source: S,
    tick_sizes: RwLock<HashMap<TokenId, Decimal>>,
    neg_risk: RwLock<HashMap<TokenId, bool>>,
    fee_rates: RwLock<HashMap<TokenId, u64>>,
}

impl<S: MarketMetadataSource> CachedMetadata<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tick_sizes: RwLock::new(HashMap::new()),
            neg_risk: RwLock::new(HashMap::new()),
            fee_rates: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Seed the cache with values known ahead of time
    pub fn insert_tick_size(&self, token_id: TokenId, tick_size: Decimal) {
        self.tick_sizes.write().insert(token_id, tick_size);
    }

    pub fn insert_neg_risk(&self, token_id: TokenId, neg_risk: bool) {
        self.neg_risk.write().insert(token_id, neg_risk);
    }

    pub fn insert_fee_rate(&self, token_id: TokenId, fee_rate_bps: u64) {
        self.fee_rates.write().insert(token_id, fee_rate_bps);
    }
}

fn cached<K: Hash + Eq, V: Copy>(map: &RwLock<HashMap<K, V>>, key: &K) -> Option<V> {
    map.read().get(key).copied()
}

#[async_trait]
impl<S: MarketMetadataSource> MarketMetadataSource for CachedMetadata<S> {
    async fn tick_size(&self, token_id: &TokenId) -> Result<Decimal> {
        if let Some(tick) = cached(&self.tick_sizes, token_id) {
            return Ok(tick);
        }
        let tick = self.source.tick_size(token_id).await?;
        debug!(%token_id, %tick, "cached tick size");
        self.tick_sizes.write().insert(token_id.clone(), tick);
        Ok(tick)
    }

    async fn neg_risk(&self, token_id: &TokenId) -> Result<bool> {
        if let Some(neg_risk) = cached(&self.neg_risk, token_id) {
            return Ok(neg_risk);
        }
        let neg_risk = self.source.neg_risk(token_id).await?;
        debug!(%token_id, neg_risk, "cached neg-risk flag");
        self.neg_risk.write().insert(token_id.clone(), neg_risk);
        Ok(neg_risk)
    }

    async fn fee_rate_bps(&self, token_id: &TokenId) -> Result<u64> {
        if let Some(fee) = cached(&self.fee_rates, token_id) {
            return Ok(fee);
        }
        let fee = self.source.fee_rate_bps(token_id).await?;
        debug!(%token_id, fee, "cached fee rate");
        self.fee_rates.write().insert(token_id.clone(), fee);
        Ok(fee)
    }

    async fn order_book(&self, token_id: &TokenId) -> Result<OrderBookSummary> {
        self.source.order_book(token_id).await
    }
}
