use alloy_primitives::{hex, Address, Bytes, B256, U256};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::contracts::{self, ContractCall};
use super::locks::WalletLocks;
use super::proxy::{sign_proxy_relay, ProxyRelayStruct};
use super::relay::{RelayApi, RelaySubmitRequest, SignatureParams};
use super::rpc::{wait_for_receipt, EthRpc, TransactionReceipt};
use super::safe::{self, sign_safe_transaction};
use super::{to_base_units, wallet_address, RedeemPosition};
use crate::config::{ChainConfig, GasLimitRule, GasPolicy, ReceiptPolling, RelayConfig};
use crate::error::{Error, Result};
use crate::signing::EthSigner;
use crate::types::SignatureType;

/// Settlement through the gas-less relayer.
///
/// The owner key authorizes meta-transactions for its proxy wallet or Safe and
/// the relayer pays gas. Submissions for one wallet are serialized through
/// [`WalletLocks`]; clients acting for the same wallet must share them.
pub struct GaslessClient {
    signer: Arc<dyn EthSigner>,
    signature_type: SignatureType,
    wallet: Address,
    chain: ChainConfig,
    rpc: Arc<dyn EthRpc>,
    relay: Arc<dyn RelayApi>,
    relay_config: RelayConfig,
    gas_policy: GasPolicy,
    polling: ReceiptPolling,
    locks: Arc<WalletLocks>,
}

impl GaslessClient {
    /// Create a client and resolve the owner's wallet address on-chain.
    ///
    /// Only proxy and Safe wallets can be relayed. `locks` guard the relay
    /// nonce and must be the same instance for every client of the wallet.
    pub async fn new(
        signer: Arc<dyn EthSigner>,
        signature_type: SignatureType,
        chain: ChainConfig,
        rpc: Arc<dyn EthRpc>,
        relay: Arc<dyn RelayApi>,
        locks: Arc<WalletLocks>,
    ) -> Result<Self> {
        if signature_type.relay_type().is_none() {
            return Err(Error::Config(format!(
                "signature type {:?} cannot use the relayer",
                signature_type
            )));
        }
        let wallet = wallet_address(rpc.as_ref(), &chain, signature_type, signer.address()).await?;
        debug!(owner = %signer.address(), %wallet, "resolved relay wallet");

        Ok(Self {
            signer,
            signature_type,
            wallet,
            chain,
            rpc,
            relay,
            relay_config: RelayConfig::default(),
            gas_policy: GasPolicy::default(),
            polling: ReceiptPolling::default(),
            locks,
        })
    }

    pub fn with_relay_config(mut self, relay_config: RelayConfig) -> Self {
        self.relay_config = relay_config;
        self
    }

    pub fn with_gas_policy(mut self, gas_policy: GasPolicy) -> Self {
        self.gas_policy = gas_policy;
        self
    }

    pub fn with_receipt_polling(mut self, polling: ReceiptPolling) -> Self {
        self.polling = polling;
        self
    }

    /// Signing key address
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    /// Proxy wallet or Safe that holds the positions
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// Relay one call from the wallet and wait for its receipt.
    ///
    /// `metadata` is forwarded to the relayer and used as the log label.
    pub async fn execute(&self, call: ContractCall, metadata: &str) -> Result<TransactionReceipt> {
        self.relay_and_wait(&[call], false, metadata).await
    }

    /// Relay several calls as one proxy wallet meta-transaction
    pub async fn execute_batch(
        &self,
        calls: Vec<ContractCall>,
        metadata: &str,
    ) -> Result<TransactionReceipt> {
        if calls.is_empty() {
            return Err(Error::InvalidParameter("batch has no calls".to_string()));
        }
        if self.signature_type != SignatureType::PolyProxy {
            return Err(Error::InvalidParameter(
                "batched execution is only supported for proxy wallets".to_string(),
            ));
        }
        self.relay_and_wait(&calls, true, metadata).await
    }

    /// Split `amount` collateral into a YES/NO pair
    pub async fn split(
        &self,
        condition_id: B256,
        amount: Decimal,
        neg_risk: bool,
    ) -> Result<TransactionReceipt> {
        let call = contracts::split_position(&self.chain, condition_id, to_base_units(amount)?, neg_risk);
        self.execute(call, "Split Position").await
    }

    /// Merge `amount` YES/NO pairs back into collateral
    pub async fn merge(
        &self,
        condition_id: B256,
        amount: Decimal,
        neg_risk: bool,
    ) -> Result<TransactionReceipt> {
        let call = contracts::merge_positions(&self.chain, condition_id, to_base_units(amount)?, neg_risk);
        self.execute(call, "Merge Positions").await
    }

    /// Redeem a resolved market; neg-risk markets need one amount per outcome
    pub async fn redeem(
        &self,
        condition_id: B256,
        neg_risk: bool,
        amounts: &[Decimal],
    ) -> Result<TransactionReceipt> {
        let call = self.redeem_call(&RedeemPosition {
            condition_id,
            neg_risk,
            amounts: amounts.to_vec(),
        })?;
        self.execute(call, "Redeem Positions").await
    }

    /// Convert NO positions of the given neg-risk questions
    pub async fn convert(
        &self,
        question_ids: &[B256],
        amount: Decimal,
    ) -> Result<TransactionReceipt> {
        let call = contracts::convert_positions(&self.chain, question_ids, to_base_units(amount)?)?;
        self.execute(call, "Convert Positions").await
    }

    /// Redeem several markets in a single proxy wallet meta-transaction
    pub async fn redeem_many(&self, positions: &[RedeemPosition]) -> Result<TransactionReceipt> {
        let calls = positions
            .iter()
            .map(|position| self.redeem_call(position))
            .collect::<Result<Vec<_>>>()?;
        self.execute_batch(calls, "Batch Redeem").await
    }

    fn redeem_call(&self, position: &RedeemPosition) -> Result<ContractCall> {
        let amounts = position
            .amounts
            .iter()
            .map(|amount| to_base_units(*amount))
            .collect::<Result<Vec<_>>>()?;
        contracts::redeem_positions(&self.chain, position.condition_id, position.neg_risk, &amounts)
    }

    async fn relay_and_wait(
        &self,
        calls: &[ContractCall],
        batch: bool,
        metadata: &str,
    ) -> Result<TransactionReceipt> {
        let response = {
            let _guard = self.locks.lock(self.wallet).await;
            let request = match self.signature_type {
                SignatureType::PolyProxy => self.build_proxy_request(calls, batch, metadata).await?,
                SignatureType::PolyGnosisSafe => match calls {
                    [call] => self.build_safe_request(call, metadata).await?,
                    _ => {
                        return Err(Error::InvalidParameter(
                            "Safe relay transactions carry exactly one call".to_string(),
                        ))
                    }
                },
                SignatureType::Eoa => {
                    return Err(Error::Config("EOA wallets cannot use the relayer".to_string()))
                }
            };
            debug!(nonce = %request.nonce, wallet_type = %request.wallet_type, %metadata, "submitting to relay");
            self.relay.submit(serde_json::to_string(&request)?).await?
        };

        if response.transaction_hash.is_empty() {
            return Err(Error::Relay(format!(
                "no transaction hash in relay response (id {:?}, state {:?})",
                response.transaction_id, response.state
            )));
        }
        let tx_hash: B256 = response.transaction_hash.parse().map_err(|_| {
            Error::Relay(format!(
                "invalid transaction hash in relay response: {}",
                response.transaction_hash
            ))
        })?;
        info!(%metadata, %tx_hash, state = %response.state, "relay transaction submitted");

        let receipt = wait_for_receipt(self.rpc.as_ref(), tx_hash, &self.polling).await?;
        if receipt.succeeded() {
            info!(%metadata, %tx_hash, block = receipt.block_number, "relay transaction succeeded");
        } else {
            warn!(%metadata, %tx_hash, block = receipt.block_number, "relay transaction reverted");
        }
        Ok(receipt)
    }

    async fn gas_limit(
        &self,
        from: Address,
        to: Address,
        data: &Bytes,
        rule: &GasLimitRule,
    ) -> u64 {
        let estimate = match self.rpc.estimate_gas(from, to, data.clone()).await {
            Ok(gas) => Some(gas),
            Err(e) => {
                warn!(error = %e, fallback = rule.fallback, "gas estimation failed, using fallback limit");
                None
            }
        };
        rule.apply(estimate)
    }

    async fn build_proxy_request(
        &self,
        calls: &[ContractCall],
        batch: bool,
        metadata: &str,
    ) -> Result<RelaySubmitRequest> {
        let owner = self.signer.address();
        let payload = self.relay.relay_payload(owner, "PROXY").await?;
        let relay = if payload.address.is_zero() {
            self.relay_config.default_relay
        } else {
            payload.address
        };

        let data = contracts::proxy_calldata(calls);
        let rule = if batch {
            self.gas_policy.relay_batch
        } else {
            self.gas_policy.relay_single
        };
        let gas_limit = self.gas_limit(owner, self.chain.proxy_factory, &data, &rule).await;

        let relay_struct = ProxyRelayStruct {
            from: owner,
            to: self.chain.proxy_factory,
            data: &data,
            relayer_fee: U256::ZERO,
            gas_price: U256::ZERO,
            gas_limit: U256::from(gas_limit),
            nonce: U256::from(payload.nonce),
            relay_hub: self.relay_config.relay_hub,
            relay,
        };
        let signature = sign_proxy_relay(self.signer.as_ref(), &relay_struct)?;

        Ok(RelaySubmitRequest {
            data: hex::encode_prefixed(&data),
            from: owner.to_checksum(None),
            metadata: metadata.to_string(),
            nonce: payload.nonce.to_string(),
            proxy_wallet: self.wallet.to_checksum(None),
            signature,
            signature_params: SignatureParams::Proxy {
                gas_price: "0".to_string(),
                gas_limit: gas_limit.to_string(),
                relayer_fee: "0".to_string(),
                relay_hub: self.relay_config.relay_hub.to_checksum(None),
                relay: relay.to_checksum(None),
            },
            to: self.chain.proxy_factory.to_checksum(None),
            wallet_type: "PROXY".to_string(),
        })
    }

    async fn build_safe_request(
        &self,
        call: &ContractCall,
        metadata: &str,
    ) -> Result<RelaySubmitRequest> {
        let owner = self.signer.address();
        let nonce = self.relay.nonce(owner, "SAFE").await?;
        let safe_tx_hash =
            contracts::safe_transaction_hash(self.rpc.as_ref(), self.wallet, call, U256::from(nonce))
                .await?;
        let signature = sign_safe_transaction(self.signer.as_ref(), &safe_tx_hash)?;

        Ok(RelaySubmitRequest {
            data: hex::encode_prefixed(&call.data),
            from: owner.to_checksum(None),
            metadata: metadata.to_string(),
            nonce: nonce.to_string(),
            proxy_wallet: self.wallet.to_checksum(None),
            signature: safe::signature_hex(&signature),
            signature_params: SignatureParams::Safe {
                base_gas: "0".to_string(),
                gas_price: "0".to_string(),
                gas_token: Address::ZERO.to_checksum(None),
                operation: contracts::SAFE_OPERATION_CALL.to_string(),
                refund_receiver: Address::ZERO.to_checksum(None),
                safe_txn_gas: "0".to_string(),
            },
            to: call.to.to_checksum(None),
            wallet_type: "SAFE".to_string(),
        })
    }
}

impl std::fmt::Debug for GaslessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaslessClient")
            .field("owner", &self.signer.address())
            .field("wallet", &self.wallet)
            .field("signature_type", &self.signature_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::test_utils::test_signer;
    use crate::web3::contracts::{IGnosisSafe, IProxyWalletFactory};
    use crate::web3::relay::{MockRelayApi, RelayPayload, RelayResponse};
    use crate::web3::rpc::test_utils::receipt;
    use crate::web3::rpc::MockEthRpc;
    use alloy_primitives::{address, eip191_hash_message, PrimitiveSignature};
    use alloy_sol_types::{SolCall, SolValue};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const PROXY_WALLET: Address = address!("1111111111111111111111111111111111111111");
    const SAFE_WALLET: Address = address!("2222222222222222222222222222222222222222");
    const RELAY_NODE: Address = address!("3333333333333333333333333333333333333333");

    fn tx_hash_for(nonce: u64) -> String {
        format!("{:#x}", B256::with_last_byte(nonce as u8 + 1))
    }

    /// Node mock that resolves both wallet kinds and mines everything instantly
    fn rpc_with_estimate(estimate: Option<u64>) -> MockEthRpc {
        let chain = ChainConfig::polygon();
        let mut rpc = MockEthRpc::new();
        rpc.expect_call()
            .withf(move |to, _| *to == chain.exchange)
            .returning(|_, _| Ok(PROXY_WALLET.abi_encode().into()));
        rpc.expect_call()
            .withf(move |to, _| *to == chain.safe_proxy_factory)
            .returning(|_, _| Ok(SAFE_WALLET.abi_encode().into()));
        rpc.expect_call()
            .withf(|to, _| *to == SAFE_WALLET)
            .returning(|_, _| Ok(B256::repeat_byte(0x5a).abi_encode().into()));
        rpc.expect_estimate_gas().returning(move |_, _, _| {
            estimate.ok_or_else(|| Error::Rpc("execution reverted".to_string()))
        });
        rpc.expect_transaction_receipt()
            .returning(|hash| Ok(Some(receipt(hash, 1))));
        rpc
    }

    fn capturing_relay(nonce: u64, captured: Arc<Mutex<Vec<String>>>) -> MockRelayApi {
        let mut relay = MockRelayApi::new();
        relay.expect_relay_payload().returning(move |_, wallet_type| {
            assert_eq!(wallet_type, "PROXY");
            Ok(RelayPayload {
                address: RELAY_NODE,
                nonce,
            })
        });
        relay.expect_nonce().returning(move |_, wallet_type| {
            assert_eq!(wallet_type, "SAFE");
            Ok(nonce)
        });
        relay.expect_submit().returning(move |body| {
            captured.lock().push(body);
            Ok(RelayResponse {
                transaction_hash: tx_hash_for(nonce),
                transaction_id: "tx-1".to_string(),
                state: "STATE_NEW".to_string(),
            })
        });
        relay
    }

    async fn client(
        signature_type: SignatureType,
        rpc: MockEthRpc,
        relay: impl RelayApi + 'static,
    ) -> GaslessClient {
        GaslessClient::new(
            Arc::new(test_signer()),
            signature_type,
            ChainConfig::polygon(),
            Arc::new(rpc),
            Arc::new(relay),
            Arc::new(WalletLocks::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_eoa_is_rejected() {
        let err = GaslessClient::new(
            Arc::new(test_signer()),
            SignatureType::Eoa,
            ChainConfig::polygon(),
            Arc::new(MockEthRpc::new()),
            Arc::new(MockRelayApi::new()),
            Arc::new(WalletLocks::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_resolves_wallets() {
        let proxy = client(SignatureType::PolyProxy, rpc_with_estimate(None), MockRelayApi::new()).await;
        assert_eq!(proxy.wallet(), PROXY_WALLET);
        let safe = client(SignatureType::PolyGnosisSafe, rpc_with_estimate(None), MockRelayApi::new()).await;
        assert_eq!(safe.wallet(), SAFE_WALLET);
    }

    #[tokio::test]
    async fn test_proxy_split_request() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(
            SignatureType::PolyProxy,
            rpc_with_estimate(Some(100_000)),
            capturing_relay(7, captured.clone()),
        )
        .await;

        let condition = B256::repeat_byte(0x42);
        let result = gasless.split(condition, dec!(5), false).await.unwrap();
        assert!(result.succeeded());
        assert_eq!(result.tx_hash, tx_hash_for(7).parse::<B256>().unwrap());

        let body = captured.lock()[0].clone();
        let request: RelaySubmitRequest = serde_json::from_str(&body).unwrap();
        let chain = ChainConfig::polygon();
        assert_eq!(request.wallet_type, "PROXY");
        assert_eq!(request.nonce, "7");
        assert_eq!(request.metadata, "Split Position");
        assert_eq!(request.to, chain.proxy_factory.to_checksum(None));
        assert_eq!(request.proxy_wallet, PROXY_WALLET.to_checksum(None));
        assert_eq!(request.from, gasless.owner().to_checksum(None));

        let SignatureParams::Proxy { gas_limit, relay, relay_hub, .. } = &request.signature_params else {
            panic!("expected proxy signature params");
        };
        assert_eq!(gas_limit, "230000");
        assert_eq!(relay, &RELAY_NODE.to_checksum(None));

        let data: Bytes = request.data.parse().unwrap();
        let decoded = IProxyWalletFactory::proxyCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.calls.len(), 1);
        assert_eq!(decoded.calls[0].to, chain.conditional_tokens);
        assert_eq!(
            decoded.calls[0].data,
            contracts::split_position(&chain, condition, U256::from(5_000_000u64), false).data
        );

        let relay_struct = ProxyRelayStruct {
            from: gasless.owner(),
            to: chain.proxy_factory,
            data: &data,
            relayer_fee: U256::ZERO,
            gas_price: U256::ZERO,
            gas_limit: U256::from(230_000u64),
            nonce: U256::from(7u64),
            relay_hub: relay_hub.parse().unwrap(),
            relay: RELAY_NODE,
        };
        let raw = hex::decode(&request.signature).unwrap();
        let signature = PrimitiveSignature::try_from(raw.as_slice()).unwrap();
        assert_eq!(
            signature
                .recover_address_from_prehash(&eip191_hash_message(relay_struct.hash()))
                .unwrap(),
            gasless.owner()
        );
    }

    #[tokio::test]
    async fn test_estimate_failure_uses_fallback() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(
            SignatureType::PolyProxy,
            rpc_with_estimate(None),
            capturing_relay(0, captured.clone()),
        )
        .await;

        gasless
            .merge(B256::repeat_byte(1), dec!(1.5), true)
            .await
            .unwrap();

        let request: RelaySubmitRequest = serde_json::from_str(&captured.lock()[0]).unwrap();
        let SignatureParams::Proxy { gas_limit, .. } = request.signature_params else {
            panic!("expected proxy signature params");
        };
        assert_eq!(gas_limit, "10000000");
    }

    #[tokio::test]
    async fn test_redeem_many_batches_into_one_submission() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(
            SignatureType::PolyProxy,
            rpc_with_estimate(Some(100_000)),
            capturing_relay(2, captured.clone()),
        )
        .await;

        let positions = vec![
            RedeemPosition::new(B256::repeat_byte(1)),
            RedeemPosition::neg_risk(B256::repeat_byte(2), vec![dec!(3), dec!(0)]),
            RedeemPosition::new(B256::repeat_byte(3)),
        ];
        gasless.redeem_many(&positions).await.unwrap();

        let submissions = captured.lock();
        assert_eq!(submissions.len(), 1);
        let request: RelaySubmitRequest = serde_json::from_str(&submissions[0]).unwrap();
        let SignatureParams::Proxy { gas_limit, .. } = &request.signature_params else {
            panic!("expected proxy signature params");
        };
        assert_eq!(gas_limit, "350000");

        let data: Bytes = request.data.parse().unwrap();
        let decoded = IProxyWalletFactory::proxyCall::abi_decode(&data, true).unwrap();
        let chain = ChainConfig::polygon();
        assert_eq!(decoded.calls.len(), 3);
        assert_eq!(decoded.calls[1].to, chain.neg_risk_adapter);
        assert_eq!(decoded.calls[2].to, chain.conditional_tokens);
    }

    #[tokio::test]
    async fn test_batch_validation() {
        let gasless = client(SignatureType::PolyProxy, rpc_with_estimate(None), MockRelayApi::new()).await;
        assert!(matches!(
            gasless.redeem_many(&[]).await,
            Err(Error::InvalidParameter(_))
        ));

        let safe = client(SignatureType::PolyGnosisSafe, rpc_with_estimate(None), MockRelayApi::new()).await;
        let err = safe
            .redeem_many(&[RedeemPosition::new(B256::repeat_byte(1))])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_safe_redeem_request() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(
            SignatureType::PolyGnosisSafe,
            rpc_with_estimate(Some(100_000)),
            capturing_relay(5, captured.clone()),
        )
        .await;

        let condition = B256::repeat_byte(0x42);
        gasless.redeem(condition, false, &[]).await.unwrap();

        let request: RelaySubmitRequest = serde_json::from_str(&captured.lock()[0]).unwrap();
        let chain = ChainConfig::polygon();
        let expected = contracts::redeem_positions(&chain, condition, false, &[]).unwrap();
        assert_eq!(request.wallet_type, "SAFE");
        assert_eq!(request.nonce, "5");
        assert_eq!(request.to, chain.conditional_tokens.to_checksum(None));
        assert_eq!(request.data, hex::encode_prefixed(&expected.data));
        assert_eq!(request.proxy_wallet, SAFE_WALLET.to_checksum(None));
        assert!(matches!(request.signature_params, SignatureParams::Safe { .. }));

        let mut raw = hex::decode(&request.signature).unwrap();
        assert!(raw[64] == 31 || raw[64] == 32);
        raw[64] -= 4;
        let signature = PrimitiveSignature::try_from(raw.as_slice()).unwrap();
        let digest = eip191_hash_message(B256::repeat_byte(0x5a));
        assert_eq!(
            signature.recover_address_from_prehash(&digest).unwrap(),
            gasless.owner()
        );
    }

    #[tokio::test]
    async fn test_safe_hash_uses_relay_nonce() {
        let chain = ChainConfig::polygon();
        let mut rpc = MockEthRpc::new();
        rpc.expect_call()
            .withf(move |to, _| *to == chain.safe_proxy_factory)
            .returning(|_, _| Ok(SAFE_WALLET.abi_encode().into()));
        rpc.expect_call()
            .withf(|to, data| {
                *to == SAFE_WALLET
                    && IGnosisSafe::getTransactionHashCall::abi_decode(data, true)
                        .map(|c| c._nonce == U256::from(9u64))
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|_, _| Ok(B256::repeat_byte(1).abi_encode().into()));
        rpc.expect_transaction_receipt()
            .returning(|hash| Ok(Some(receipt(hash, 1))));

        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(SignatureType::PolyGnosisSafe, rpc, capturing_relay(9, captured)).await;
        gasless
            .convert(&[B256::repeat_byte(0xaa)], dec!(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_transaction_hash_is_relay_error() {
        let mut relay = MockRelayApi::new();
        relay.expect_relay_payload().returning(|_, _| {
            Ok(RelayPayload {
                address: RELAY_NODE,
                nonce: 0,
            })
        });
        relay.expect_submit().returning(|_| {
            Ok(RelayResponse {
                state: "STATE_FAILED".to_string(),
                ..Default::default()
            })
        });

        let gasless = client(SignatureType::PolyProxy, rpc_with_estimate(Some(1)), relay).await;
        let err = gasless
            .split(B256::ZERO, dec!(1), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Relay(_)));
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_returned() {
        let chain = ChainConfig::polygon();
        let mut rpc = MockEthRpc::new();
        rpc.expect_call()
            .withf(move |to, _| *to == chain.exchange)
            .returning(|_, _| Ok(PROXY_WALLET.abi_encode().into()));
        rpc.expect_estimate_gas().returning(|_, _, _| Ok(50_000));
        rpc.expect_transaction_receipt()
            .returning(|hash| Ok(Some(receipt(hash, 0))));

        let captured = Arc::new(Mutex::new(Vec::new()));
        let gasless = client(SignatureType::PolyProxy, rpc, capturing_relay(0, captured)).await;
        let result = gasless.split(B256::ZERO, dec!(1), false).await.unwrap();
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn test_relay_rejection_surfaces_verbatim() {
        let mut relay = MockRelayApi::new();
        relay.expect_relay_payload().returning(|_, _| {
            Ok(RelayPayload {
                address: RELAY_NODE,
                nonce: 0,
            })
        });
        relay.expect_submit().returning(|_| {
            Err(Error::Api {
                status: 401,
                message: "invalid builder signature".to_string(),
            })
        });

        let gasless = client(SignatureType::PolyProxy, rpc_with_estimate(Some(1)), relay).await;
        let err = gasless.split(B256::ZERO, dec!(1), false).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 401, ref message } if message == "invalid builder signature"));
    }

    /// Relay that hands out its current nonce and only accepts that nonce once
    #[derive(Default)]
    struct SequentialNonceRelay {
        next_nonce: Mutex<u64>,
        accepted: Mutex<Vec<u64>>,
        rejected: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl RelayApi for SequentialNonceRelay {
        async fn relay_payload(&self, _owner: Address, _wallet_type: &str) -> Result<RelayPayload> {
            let nonce = *self.next_nonce.lock();
            // network latency between nonce fetch and submit
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(RelayPayload {
                address: RELAY_NODE,
                nonce,
            })
        }

        async fn nonce(&self, _owner: Address, _wallet_type: &str) -> Result<u64> {
            Ok(*self.next_nonce.lock())
        }

        async fn submit(&self, body: String) -> Result<RelayResponse> {
            let request: RelaySubmitRequest = serde_json::from_str(&body)?;
            let nonce: u64 = request
                .nonce
                .parse()
                .map_err(|_| Error::InvalidParameter("nonce".to_string()))?;

            let mut next = self.next_nonce.lock();
            if nonce != *next {
                self.rejected.lock().push(nonce);
                return Err(Error::Api {
                    status: 400,
                    message: format!("invalid nonce {}, expected {}", nonce, *next),
                });
            }
            *next += 1;
            self.accepted.lock().push(nonce);
            Ok(RelayResponse {
                transaction_hash: tx_hash_for(nonce),
                transaction_id: format!("tx-{}", nonce),
                state: "STATE_NEW".to_string(),
            })
        }
    }

    async fn concurrent_splits(share_locks: bool) -> (Arc<SequentialNonceRelay>, Vec<Result<TransactionReceipt>>) {
        let relay = Arc::new(SequentialNonceRelay::default());
        let locks = Arc::new(WalletLocks::new());

        let mut clients = Vec::new();
        for _ in 0..2 {
            let locks = if share_locks {
                locks.clone()
            } else {
                Arc::new(WalletLocks::new())
            };
            let gasless = GaslessClient::new(
                Arc::new(test_signer()),
                SignatureType::PolyProxy,
                ChainConfig::polygon(),
                Arc::new(rpc_with_estimate(Some(100_000))),
                relay.clone(),
                locks,
            )
            .await
            .unwrap();
            clients.push(gasless);
        }

        let (a, b) = tokio::join!(
            clients[0].split(B256::repeat_byte(1), dec!(1), false),
            clients[1].split(B256::repeat_byte(2), dec!(1), false),
        );
        (relay, vec![a, b])
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_locks_serialize_nonces() {
        let (relay, results) = concurrent_splits(true).await;

        assert!(results.iter().all(|r| r.as_ref().map(|rc| rc.succeeded()).unwrap_or(false)));
        assert_eq!(*relay.accepted.lock(), vec![0, 1]);
        assert!(relay.rejected.lock().is_empty());

        let hashes: Vec<B256> = results.into_iter().map(|r| r.unwrap().tx_hash).collect();
        assert_ne!(hashes[0], hashes[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserialized_submissions_race_on_nonce() {
        let (relay, results) = concurrent_splits(false).await;

        assert_eq!(*relay.accepted.lock(), vec![0]);
        assert_eq!(*relay.rejected.lock(), vec![0]);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::Api { status: 400, .. }))));
    }
}
