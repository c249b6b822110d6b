//! On-chain settlement: split, merge, redeem and convert positions, either
//! through the gas-less relayer ([`GaslessClient`]) or by sending transactions
//! directly ([`Web3Client`]).

pub mod contracts;
mod direct;
mod gasless;
mod locks;
pub mod proxy;
pub mod relay;
pub mod rpc;
pub mod safe;

pub use contracts::ContractCall;
pub use direct::Web3Client;
pub use gasless::GaslessClient;
pub use locks::WalletLocks;
pub use relay::{RelayApi, RelayAuth, RelayClient, RelayResponse, RelaySubmitRequest};
pub use rpc::{wait_for_receipt, EthRpc, HttpRpcClient, Log, TransactionReceipt};

use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;

use crate::config::ChainConfig;
use crate::error::{Error, Result};
use crate::orders::{to_token_decimals, TOKEN_DECIMALS};
use crate::types::SignatureType;

/// One market to redeem in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemPosition {
    pub condition_id: B256,
    pub neg_risk: bool,
    /// Per-outcome amounts; only used by neg-risk markets
    pub amounts: Vec<Decimal>,
}

impl RedeemPosition {
    pub fn new(condition_id: B256) -> Self {
        Self {
            condition_id,
            neg_risk: false,
            amounts: vec![],
        }
    }

    pub fn neg_risk(condition_id: B256, amounts: Vec<Decimal>) -> Self {
        Self {
            condition_id,
            neg_risk: true,
            amounts,
        }
    }
}

/// Collateral or outcome token amount in 6-decimal base units
pub(crate) fn to_base_units(amount: Decimal) -> Result<U256> {
    Ok(U256::from(to_token_decimals(amount)?))
}

/// Base units back to a decimal amount
pub(crate) fn from_base_units(value: U256, decimals: u32) -> Result<Decimal> {
    let raw = i128::try_from(value)
        .map_err(|_| Error::Rpc(format!("balance {} out of range", value)))?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map_err(|_| Error::Rpc(format!("balance {} out of range", value)))
}

pub(crate) fn token_units(value: U256) -> Result<Decimal> {
    from_base_units(value, TOKEN_DECIMALS)
}

/// Address that holds funds for `owner` under the given wallet scheme
pub(crate) async fn wallet_address(
    rpc: &dyn EthRpc,
    chain: &ChainConfig,
    signature_type: SignatureType,
    owner: Address,
) -> Result<Address> {
    match signature_type {
        SignatureType::Eoa => Ok(owner),
        SignatureType::PolyProxy => contracts::poly_proxy_address(rpc, chain, owner).await,
        SignatureType::PolyGnosisSafe => contracts::safe_address(rpc, chain, owner).await,
    }
}
