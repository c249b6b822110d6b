//! Immutable configuration shared by the clients.
//!
//! A [`Registry`] is built once (usually [`Registry::polymarket`]) and passed
//! around as `Arc<Registry>`.

use alloy_primitives::{address, Address};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::orders::RoundingTable;

pub const POLYGON: u64 = 137;
pub const AMOY: u64 = 80002;

pub const DEFAULT_CLOB_HOST: &str = "https://clob.polymarket.com";

/// Contract addresses for one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub exchange: Address,
    pub neg_risk_exchange: Address,
    pub collateral: Address,
    pub conditional_tokens: Address,
    pub neg_risk_adapter: Address,
    pub proxy_factory: Address,
    pub safe_proxy_factory: Address,
}

impl ChainConfig {
    pub fn polygon() -> Self {
        Self {
            exchange: address!("4bFB41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"),
            neg_risk_exchange: address!("C5d563A36AE78145C45a50134d48A1215220f80a"),
            collateral: address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
            conditional_tokens: address!("4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
            neg_risk_adapter: address!("d91E80cF2E7be2e162c6513ceD06f1dD0dA35296"),
            proxy_factory: address!("aB45c5A4B0c941a2F231C04C3f49182e1A254052"),
            safe_proxy_factory: address!("aacFeEa03eb1561C4e67d661e40682Bd20E3541b"),
        }
    }

    pub fn amoy() -> Self {
        Self {
            exchange: address!("dFE02Eb6733538f8Ea35D585af8DE5958AD99E40"),
            neg_risk_exchange: address!("d91E80cF2E7be2e162c6513ceD06f1dD0dA35296"),
            collateral: address!("9c4e1703476e875070ee25b56a58b008cfb8fa78"),
            conditional_tokens: address!("69308FB512518e39F9b16112fA8d994F4e2Bf8bB"),
            neg_risk_adapter: address!("d91E80cF2E7be2e162c6513ceD06f1dD0dA35296"),
            proxy_factory: address!("aB45c5A4B0c941a2F231C04C3f49182e1A254052"),
            safe_proxy_factory: address!("aacFeEa03eb1561C4e67d661e40682Bd20E3541b"),
        }
    }

    /// Exchange contract that verifies orders for this kind of market
    pub fn exchange_for(&self, neg_risk: bool) -> Address {
        if neg_risk {
            self.neg_risk_exchange
        } else {
            self.exchange
        }
    }
}

/// Rounding table and per-chain contract addresses
#[derive(Debug, Clone)]
pub struct Registry {
    rounding: RoundingTable,
    chains: HashMap<u64, ChainConfig>,
}

impl Registry {
    /// A registry with no chains and the given rounding table
    pub fn new(rounding: RoundingTable) -> Self {
        Self {
            rounding,
            chains: HashMap::new(),
        }
    }

    /// Polygon mainnet and Amoy with the exchange tick sizes
    pub fn polymarket() -> Self {
        Self::new(RoundingTable::polymarket())
            .with_chain(POLYGON, ChainConfig::polygon())
            .with_chain(AMOY, ChainConfig::amoy())
    }

    pub fn with_chain(mut self, chain_id: u64, config: ChainConfig) -> Self {
        self.chains.insert(chain_id, config);
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingTable) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn rounding(&self) -> &RoundingTable {
        &self.rounding
    }

    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.chains
            .get(&chain_id)
            .ok_or_else(|| Error::Config(format!("no contract config for chain {}", chain_id)))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::polymarket()
    }
}

/// Gas-less relay endpoints and relay contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub relay_url: String,
    /// Remote service that signs relay requests when no builder credentials are set
    pub sign_url: String,
    pub relay_hub: Address,
    /// Relay node used when the relay does not name one
    pub default_relay: Address,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_url: "https://relayer-v2.polymarket.com".to_string(),
            sign_url: "https://builder-signing-server.vercel.app/sign".to_string(),
            relay_hub: address!("D216153c06E857cD7f72665E0aF1d7D82172F494"),
            default_relay: address!("7db63fe6d62eb73fb01f8009416f4c2bb4fbda6a"),
        }
    }
}

impl RelayConfig {
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }

    pub fn with_sign_url(mut self, url: impl Into<String>) -> Self {
        self.sign_url = url.into();
        self
    }
}

/// Receipt polling budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiptPolling {
    /// Total time to wait before giving up
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl ReceiptPolling {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gas limit rule: `estimate * multiplier + buffer`, or `fallback` when estimation fails
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasLimitRule {
    pub multiplier: f64,
    pub buffer: u64,
    pub fallback: u64,
}

impl GasLimitRule {
    pub fn apply(&self, estimate: Option<u64>) -> u64 {
        match estimate {
            Some(gas) => (gas as f64 * self.multiplier) as u64 + self.buffer,
            None => self.fallback,
        }
    }
}

/// Gas rules for relayed and directly sent transactions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasPolicy {
    pub relay_single: GasLimitRule,
    pub relay_batch: GasLimitRule,
    /// Direct calls from an EOA
    pub direct: GasLimitRule,
    /// Direct calls wrapped in a proxy or Safe wallet
    pub direct_wallet: GasLimitRule,
    pub gas_price_multiplier: f64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            relay_single: GasLimitRule {
                multiplier: 1.3,
                buffer: 100_000,
                fallback: 10_000_000,
            },
            relay_batch: GasLimitRule {
                multiplier: 1.5,
                buffer: 200_000,
                fallback: 15_000_000,
            },
            direct: GasLimitRule {
                multiplier: 1.05,
                buffer: 0,
                fallback: 500_000,
            },
            direct_wallet: GasLimitRule {
                multiplier: 1.05,
                buffer: 100_000,
                fallback: 500_000,
            },
            gas_price_multiplier: 1.05,
        }
    }
}
