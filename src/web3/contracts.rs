//! Contract bindings and calldata encoders for settlement actions.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};

use super::rpc::EthRpc;
use crate::config::ChainConfig;
use crate::error::{Error, Result};

sol! {
    interface IConditionalTokens {
        function splitPosition(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external;
        function mergePositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external;
        function redeemPositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] indexSets) external;
        function balanceOf(address owner, uint256 id) external view returns (uint256 balance);
        function setApprovalForAll(address operator, bool approved) external;
        function safeTransferFrom(address from, address to, uint256 id, uint256 value, bytes data) external;
    }

    interface INegRiskAdapter {
        function splitPosition(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external;
        function mergePositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external;
        function redeemPositions(bytes32 conditionId, uint256[] amounts) external;
        function convertPositions(bytes32 marketId, uint256 indexSet, uint256 amount) external;
    }

    interface IERC20 {
        function approve(address spender, uint256 value) external returns (bool success);
        function transfer(address to, uint256 value) external returns (bool success);
        function balanceOf(address account) external view returns (uint256 balance);
    }

    interface IProxyWalletFactory {
        struct ProxyTransaction {
            uint8 typeCode;
            address to;
            uint256 value;
            bytes data;
        }

        function proxy(ProxyTransaction[] calls) external payable returns (bytes[] returnValues);
    }

    interface ICtfExchange {
        function getPolyProxyWalletAddress(address owner) external view returns (address wallet);
    }

    interface ISafeProxyFactory {
        function computeProxyAddress(address owner) external view returns (address wallet);
    }

    interface IGnosisSafe {
        function nonce() external view returns (uint256 value);
        function getTransactionHash(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, uint256 _nonce) external view returns (bytes32 txHash);
        function execTransaction(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, bytes signatures) external payable returns (bool success);
    }
}

/// `CALL` type code inside a proxy wallet batch
pub const PROXY_CALL_TYPE: u8 = 1;

/// Safe `operation` for a plain call
pub const SAFE_OPERATION_CALL: u8 = 0;

/// A contract call: target and ABI-encoded calldata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
}

impl ContractCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }
}

fn binary_partition() -> Vec<U256> {
    vec![U256::from(1u64), U256::from(2u64)]
}

/// Split collateral into a full set of outcome tokens
pub fn split_position(
    chain: &ChainConfig,
    condition_id: B256,
    amount: U256,
    neg_risk: bool,
) -> ContractCall {
    if neg_risk {
        let call = INegRiskAdapter::splitPositionCall {
            collateralToken: chain.collateral,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            partition: binary_partition(),
            amount,
        };
        ContractCall::new(chain.neg_risk_adapter, call.abi_encode())
    } else {
        let call = IConditionalTokens::splitPositionCall {
            collateralToken: chain.collateral,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            partition: binary_partition(),
            amount,
        };
        ContractCall::new(chain.conditional_tokens, call.abi_encode())
    }
}

/// Merge a full set of outcome tokens back into collateral
pub fn merge_positions(
    chain: &ChainConfig,
    condition_id: B256,
    amount: U256,
    neg_risk: bool,
) -> ContractCall {
    if neg_risk {
        let call = INegRiskAdapter::mergePositionsCall {
            collateralToken: chain.collateral,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            partition: binary_partition(),
            amount,
        };
        ContractCall::new(chain.neg_risk_adapter, call.abi_encode())
    } else {
        let call = IConditionalTokens::mergePositionsCall {
            collateralToken: chain.collateral,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            partition: binary_partition(),
            amount,
        };
        ContractCall::new(chain.conditional_tokens, call.abi_encode())
    }
}

/// Redeem resolved positions.
///
/// Neg-risk markets redeem through the adapter and need one amount per
/// outcome; standard markets redeem both index sets and ignore `amounts`.
pub fn redeem_positions(
    chain: &ChainConfig,
    condition_id: B256,
    neg_risk: bool,
    amounts: &[U256],
) -> Result<ContractCall> {
    if neg_risk {
        if amounts.is_empty() {
            return Err(Error::InvalidParameter(
                "neg-risk redemption needs per-outcome amounts".to_string(),
            ));
        }
        let call = INegRiskAdapter::redeemPositionsCall {
            conditionId: condition_id,
            amounts: amounts.to_vec(),
        };
        Ok(ContractCall::new(chain.neg_risk_adapter, call.abi_encode()))
    } else {
        let call = IConditionalTokens::redeemPositionsCall {
            collateralToken: chain.collateral,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            indexSets: binary_partition(),
        };
        Ok(ContractCall::new(chain.conditional_tokens, call.abi_encode()))
    }
}

/// Convert NO positions of a neg-risk market into YES positions and collateral
pub fn convert_positions(
    chain: &ChainConfig,
    question_ids: &[B256],
    amount: U256,
) -> Result<ContractCall> {
    let first = question_ids.first().ok_or_else(|| {
        Error::InvalidParameter("convert needs at least one question id".to_string())
    })?;
    let call = INegRiskAdapter::convertPositionsCall {
        marketId: neg_risk_market_id(first),
        indexSet: index_set(question_ids),
        amount,
    };
    Ok(ContractCall::new(chain.neg_risk_adapter, call.abi_encode()))
}

/// Neg-risk market id: the question id with its index byte cleared
pub fn neg_risk_market_id(question_id: &B256) -> B256 {
    let mut id = *question_id;
    id[31] = 0;
    id
}

/// Bit set with `1 << index` for every question id, index being its last byte
pub fn index_set(question_ids: &[B256]) -> U256 {
    question_ids
        .iter()
        .fold(U256::ZERO, |set, qid| set | (U256::from(1u64) << qid[31] as usize))
}

/// Unlimited collateral allowance for `spender`
pub fn approve_collateral(chain: &ChainConfig, spender: Address) -> ContractCall {
    let call = IERC20::approveCall {
        spender,
        value: U256::MAX,
    };
    ContractCall::new(chain.collateral, call.abi_encode())
}

/// Operator approval on the conditional tokens contract
pub fn approve_conditional_tokens(chain: &ChainConfig, operator: Address) -> ContractCall {
    let call = IConditionalTokens::setApprovalForAllCall {
        operator,
        approved: true,
    };
    ContractCall::new(chain.conditional_tokens, call.abi_encode())
}

pub fn transfer_collateral(chain: &ChainConfig, to: Address, amount: U256) -> ContractCall {
    let call = IERC20::transferCall { to, value: amount };
    ContractCall::new(chain.collateral, call.abi_encode())
}

pub fn transfer_token(
    chain: &ChainConfig,
    from: Address,
    to: Address,
    token_id: U256,
    amount: U256,
) -> ContractCall {
    let call = IConditionalTokens::safeTransferFromCall {
        from,
        to,
        id: token_id,
        value: amount,
        data: Bytes::new(),
    };
    ContractCall::new(chain.conditional_tokens, call.abi_encode())
}

/// Calldata for `ProxyWalletFactory.proxy` wrapping `calls` in one meta-transaction
pub fn proxy_calldata(calls: &[ContractCall]) -> Bytes {
    let calls = calls
        .iter()
        .map(|call| IProxyWalletFactory::ProxyTransaction {
            typeCode: PROXY_CALL_TYPE,
            to: call.to,
            value: U256::ZERO,
            data: call.data.clone(),
        })
        .collect();
    IProxyWalletFactory::proxyCall { calls }.abi_encode().into()
}

/// Calldata for `execTransaction` on a Safe, zero gas refund parameters
pub fn safe_exec_calldata(call: &ContractCall, signatures: Bytes) -> Bytes {
    IGnosisSafe::execTransactionCall {
        to: call.to,
        value: U256::ZERO,
        data: call.data.clone(),
        operation: SAFE_OPERATION_CALL,
        safeTxGas: U256::ZERO,
        baseGas: U256::ZERO,
        gasPrice: U256::ZERO,
        gasToken: Address::ZERO,
        refundReceiver: Address::ZERO,
        signatures,
    }
    .abi_encode()
    .into()
}

/// Proxy wallet the exchange assigns to `owner`
pub async fn poly_proxy_address(
    rpc: &dyn EthRpc,
    chain: &ChainConfig,
    owner: Address,
) -> Result<Address> {
    let call = ICtfExchange::getPolyProxyWalletAddressCall { owner };
    let output = rpc.call(chain.exchange, call.abi_encode().into()).await?;
    Ok(ICtfExchange::getPolyProxyWalletAddressCall::abi_decode_returns(&output, true)?.wallet)
}

/// Safe address the Safe proxy factory derives for `owner`
pub async fn safe_address(rpc: &dyn EthRpc, chain: &ChainConfig, owner: Address) -> Result<Address> {
    let call = ISafeProxyFactory::computeProxyAddressCall { owner };
    let output = rpc
        .call(chain.safe_proxy_factory, call.abi_encode().into())
        .await?;
    Ok(ISafeProxyFactory::computeProxyAddressCall::abi_decode_returns(&output, true)?.wallet)
}

/// The Safe's own transaction counter
pub async fn safe_nonce(rpc: &dyn EthRpc, safe: Address) -> Result<U256> {
    let output = rpc
        .call(safe, IGnosisSafe::nonceCall {}.abi_encode().into())
        .await?;
    Ok(IGnosisSafe::nonceCall::abi_decode_returns(&output, true)?.value)
}

/// Hash the Safe expects its owners to sign for `call` at `nonce`
pub async fn safe_transaction_hash(
    rpc: &dyn EthRpc,
    safe: Address,
    call: &ContractCall,
    nonce: U256,
) -> Result<B256> {
    let request = IGnosisSafe::getTransactionHashCall {
        to: call.to,
        value: U256::ZERO,
        data: call.data.clone(),
        operation: SAFE_OPERATION_CALL,
        safeTxGas: U256::ZERO,
        baseGas: U256::ZERO,
        gasPrice: U256::ZERO,
        gasToken: Address::ZERO,
        refundReceiver: Address::ZERO,
        _nonce: nonce,
    };
    let output = rpc.call(safe, request.abi_encode().into()).await?;
    Ok(IGnosisSafe::getTransactionHashCall::abi_decode_returns(&output, true)?.txHash)
}

/// Collateral balance in base units
pub async fn collateral_balance(
    rpc: &dyn EthRpc,
    chain: &ChainConfig,
    account: Address,
) -> Result<U256> {
    let call = IERC20::balanceOfCall { account };
    let output = rpc.call(chain.collateral, call.abi_encode().into()).await?;
    Ok(IERC20::balanceOfCall::abi_decode_returns(&output, true)?.balance)
}

/// Outcome token balance in base units
pub async fn token_balance(
    rpc: &dyn EthRpc,
    chain: &ChainConfig,
    owner: Address,
    token_id: U256,
) -> Result<U256> {
    let call = IConditionalTokens::balanceOfCall {
        owner,
        id: token_id,
    };
    let output = rpc
        .call(chain.conditional_tokens, call.abi_encode().into())
        .await?;
    Ok(IConditionalTokens::balanceOfCall::abi_decode_returns(&output, true)?.balance)
}
