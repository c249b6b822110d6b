use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types_eth::{
    TransactionInput, TransactionReceipt as RpcReceipt, TransactionRequest,
};
use alloy_transport_http::Http;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::ReceiptPolling;
use crate::error::{Error, Result};

/// Event log emitted by a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub tx_hash: B256,
    /// 1 on success, 0 on revert
    pub status: u64,
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub from: Address,
    pub to: Option<Address>,
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

impl From<RpcReceipt> for TransactionReceipt {
    fn from(raw: RpcReceipt) -> Self {
        let logs = raw
            .inner
            .logs()
            .iter()
            .map(|log| Log {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
            })
            .collect();

        Self {
            tx_hash: raw.transaction_hash,
            status: u64::from(raw.status()),
            block_number: raw.block_number.unwrap_or_default(),
            gas_used: u64::try_from(raw.gas_used).unwrap_or(u64::MAX),
            effective_gas_price: raw.effective_gas_price,
            from: raw.from,
            to: raw.to,
            logs,
        }
    }
}

/// Capability to talk to an Ethereum-compatible node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EthRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> Result<u64>;

    async fn gas_price(&self) -> Result<u128>;

    /// Pending transaction count, used as the next account nonce
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn balance(&self, address: Address) -> Result<U256>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256>;

    /// `None` until the transaction is mined
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;
}

/// Node access over HTTP through an alloy provider
pub struct HttpRpcClient {
    provider: RootProvider<Http<Client>>,
}

impl HttpRpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let url = url
            .parse()
            .map_err(|e| Error::Config(format!("invalid RPC url {}: {}", url, e)))?;
        Ok(Self::from_provider(ProviderBuilder::new().on_http(url)))
    }

    pub fn from_provider(provider: RootProvider<Http<Client>>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &RootProvider<Http<Client>> {
        &self.provider
    }
}

impl fmt::Debug for HttpRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRpcClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl EthRpc for HttpRpcClient {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        Ok(self.provider.call(&tx).await?)
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> Result<u64> {
        let tx = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(TransactionInput::new(data));
        Ok(self.provider.estimate_gas(&tx).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256> {
        let pending = self.provider.send_raw_transaction(&raw).await?;
        debug!(tx_hash = %pending.tx_hash(), "raw transaction accepted by node");
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(TransactionReceipt::from))
    }
}

/// Exponential backoff calculator
#[derive(Debug, Clone)]
struct ExponentialBackoff {
    current_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    fn new(initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            current_delay: initial_delay,
            max_delay,
            multiplier,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay;
        self.current_delay = std::cmp::min(
            Duration::from_secs_f64(delay.as_secs_f64() * self.multiplier),
            self.max_delay,
        );
        delay
    }
}

/// Poll for a receipt until it is mined or `polling.timeout` elapses.
///
/// A missing receipt and a failed lookup are both retried. Dropping the
/// returned future cancels the wait.
pub async fn wait_for_receipt(
    rpc: &dyn EthRpc,
    hash: B256,
    polling: &ReceiptPolling,
) -> Result<TransactionReceipt> {
    let deadline = Instant::now() + polling.timeout;
    let mut backoff =
        ExponentialBackoff::new(polling.initial_delay, polling.max_delay, polling.multiplier);

    loop {
        match rpc.transaction_receipt(hash).await {
            Ok(Some(receipt)) => return Ok(receipt),
            Ok(None) => debug!(%hash, "receipt not available yet"),
            Err(e) => warn!(%hash, error = %e, "receipt lookup failed, retrying"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout(format!(
                "no receipt for {} after {:?}",
                hash, polling.timeout
            )));
        }
        sleep(backoff.next_delay().min(deadline - now)).await;
    }
}
