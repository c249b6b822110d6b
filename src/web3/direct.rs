use alloy_consensus::SignableTransaction;
use alloy_eips::eip2718::Encodable2718;
use alloy_network::{EthereumWallet, TransactionBuilder, TxSigner};
use alloy_primitives::{Address, Bytes, PrimitiveSignature, B256};
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::contracts::{self, ContractCall};
use super::locks::WalletLocks;
use super::rpc::{wait_for_receipt, EthRpc, TransactionReceipt};
use super::safe::sign_safe_transaction;
use super::{from_base_units, to_base_units, token_units, wallet_address};
use crate::config::{ChainConfig, GasLimitRule, GasPolicy, ReceiptPolling};
use crate::error::{Error, Result};
use crate::signing::EthSigner;
use crate::types::{SignatureType, TokenId};

const NATIVE_DECIMALS: u32 = 18;

/// Owner key exposed as an alloy transaction signer
struct OwnerTxSigner(Arc<dyn EthSigner>);

#[async_trait]
impl TxSigner<PrimitiveSignature> for OwnerTxSigner {
    fn address(&self) -> Address {
        self.0.address()
    }

    async fn sign_transaction(
        &self,
        tx: &mut dyn SignableTransaction<PrimitiveSignature>,
    ) -> alloy_signer::Result<PrimitiveSignature> {
        self.0
            .sign_hash(&tx.signature_hash())
            .map_err(alloy_signer::Error::other)
    }
}

/// Settlement by sending signed transactions from the owner's key.
///
/// The owner pays gas. Proxy wallets are driven through the proxy factory and
/// Safes through `execTransaction` with an owner signature.
pub struct Web3Client {
    signer: Arc<dyn EthSigner>,
    tx_wallet: EthereumWallet,
    signature_type: SignatureType,
    wallet: Address,
    chain_id: u64,
    chain: ChainConfig,
    rpc: Arc<dyn EthRpc>,
    gas_policy: GasPolicy,
    polling: ReceiptPolling,
    locks: Arc<WalletLocks>,
}

impl Web3Client {
    /// Create a client and resolve the wallet that holds the owner's funds.
    ///
    /// `locks` serialise account nonces; every client sending from the same
    /// key must be given the same instance.
    pub async fn new(
        signer: Arc<dyn EthSigner>,
        signature_type: SignatureType,
        chain_id: u64,
        chain: ChainConfig,
        rpc: Arc<dyn EthRpc>,
        locks: Arc<WalletLocks>,
    ) -> Result<Self> {
        let wallet = wallet_address(rpc.as_ref(), &chain, signature_type, signer.address()).await?;
        debug!(owner = %signer.address(), %wallet, ?signature_type, "resolved wallet");

        Ok(Self {
            tx_wallet: EthereumWallet::new(OwnerTxSigner(signer.clone())),
            signer,
            signature_type,
            wallet,
            chain_id,
            chain,
            rpc,
            gas_policy: GasPolicy::default(),
            polling: ReceiptPolling::default(),
            locks,
        })
    }

    pub fn with_gas_policy(mut self, gas_policy: GasPolicy) -> Self {
        self.gas_policy = gas_policy;
        self
    }

    pub fn with_receipt_polling(mut self, polling: ReceiptPolling) -> Self {
        self.polling = polling;
        self
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Send `call` from the wallet and wait for its receipt
    pub async fn execute(&self, call: ContractCall, operation: &str) -> Result<TransactionReceipt> {
        let tx_hash = {
            let owner = self.signer.address();
            let _guard = self.locks.lock(owner).await;

            let (to, input, rule) = match self.signature_type {
                SignatureType::Eoa => (call.to, call.data.clone(), self.gas_policy.direct),
                SignatureType::PolyProxy => (
                    self.chain.proxy_factory,
                    contracts::proxy_calldata(std::slice::from_ref(&call)),
                    self.gas_policy.direct_wallet,
                ),
                SignatureType::PolyGnosisSafe => {
                    let nonce = contracts::safe_nonce(self.rpc.as_ref(), self.wallet).await?;
                    let safe_tx_hash =
                        contracts::safe_transaction_hash(self.rpc.as_ref(), self.wallet, &call, nonce)
                            .await?;
                    let signature = sign_safe_transaction(self.signer.as_ref(), &safe_tx_hash)?;
                    (
                        self.wallet,
                        contracts::safe_exec_calldata(&call, signature),
                        self.gas_policy.direct_wallet,
                    )
                }
            };

            let gas_limit = self.gas_limit(&call, &rule).await;
            let raw = self.sign_transaction(to, input, gas_limit).await?;
            self.rpc.send_raw_transaction(raw).await?
        };
        info!(%operation, %tx_hash, "transaction sent");

        let receipt = wait_for_receipt(self.rpc.as_ref(), tx_hash, &self.polling).await?;
        if receipt.succeeded() {
            info!(%operation, %tx_hash, gas_used = receipt.gas_used, "transaction succeeded");
        } else {
            warn!(%operation, %tx_hash, "transaction reverted");
        }
        Ok(receipt)
    }

    /// Gas for the inner call as seen from the wallet
    async fn gas_limit(&self, call: &ContractCall, rule: &GasLimitRule) -> u64 {
        match self
            .rpc
            .estimate_gas(self.wallet, call.to, call.data.clone())
            .await
        {
            Ok(gas) => rule.apply(Some(gas)),
            Err(e) => {
                warn!(error = %e, fallback = rule.fallback, "gas estimation failed, using fallback limit");
                rule.apply(None)
            }
        }
    }

    async fn sign_transaction(&self, to: Address, input: Bytes, gas_limit: u64) -> Result<Bytes> {
        let owner = self.signer.address();
        let (nonce, gas_price) = futures_util::try_join!(
            self.rpc.transaction_count(owner),
            self.rpc.gas_price()
        )?;
        let gas_price = (gas_price as f64 * self.gas_policy.gas_price_multiplier) as u128;

        let request = TransactionRequest::default()
            .with_from(owner)
            .with_to(to)
            .with_input(input)
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit);
        debug!(nonce, gas_price, gas_limit, %to, "signing legacy transaction");

        let envelope = request
            .build(&self.tx_wallet)
            .await
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(envelope.encoded_2718().into())
    }

    pub async fn split(
        &self,
        condition_id: B256,
        amount: Decimal,
        neg_risk: bool,
    ) -> Result<TransactionReceipt> {
        let call = contracts::split_position(&self.chain, condition_id, to_base_units(amount)?, neg_risk);
        self.execute(call, "Split Position").await
    }

    pub async fn merge(
        &self,
        condition_id: B256,
        amount: Decimal,
        neg_risk: bool,
    ) -> Result<TransactionReceipt> {
        let call = contracts::merge_positions(&self.chain, condition_id, to_base_units(amount)?, neg_risk);
        self.execute(call, "Merge Positions").await
    }

    pub async fn redeem(
        &self,
        condition_id: B256,
        neg_risk: bool,
        amounts: &[Decimal],
    ) -> Result<TransactionReceipt> {
        let amounts = amounts
            .iter()
            .map(|amount| to_base_units(*amount))
            .collect::<Result<Vec<_>>>()?;
        let call = contracts::redeem_positions(&self.chain, condition_id, neg_risk, &amounts)?;
        self.execute(call, "Redeem Positions").await
    }

    pub async fn convert(
        &self,
        question_ids: &[B256],
        amount: Decimal,
    ) -> Result<TransactionReceipt> {
        let call = contracts::convert_positions(&self.chain, question_ids, to_base_units(amount)?)?;
        self.execute(call, "Convert Positions").await
    }

    /// Unlimited collateral allowance for `spender`
    pub async fn set_collateral_approval(&self, spender: Address) -> Result<TransactionReceipt> {
        let call = contracts::approve_collateral(&self.chain, spender);
        self.execute(call, "Collateral Approval").await
    }

    /// Let `operator` move the wallet's outcome tokens
    pub async fn set_conditional_tokens_approval(
        &self,
        operator: Address,
    ) -> Result<TransactionReceipt> {
        let call = contracts::approve_conditional_tokens(&self.chain, operator);
        self.execute(call, "Conditional Tokens Approval").await
    }

    /// Every approval trading and settlement need, in order.
    ///
    /// Stops at the first failure.
    pub async fn set_all_approvals(&self) -> Result<Vec<TransactionReceipt>> {
        let chain = self.chain;
        let collateral_spenders = [
            chain.conditional_tokens,
            chain.exchange,
            chain.neg_risk_exchange,
            chain.neg_risk_adapter,
        ];
        let token_operators = [chain.exchange, chain.neg_risk_exchange, chain.neg_risk_adapter];

        let mut receipts = Vec::with_capacity(collateral_spenders.len() + token_operators.len());
        for spender in collateral_spenders {
            receipts.push(self.set_collateral_approval(spender).await?);
        }
        for operator in token_operators {
            receipts.push(self.set_conditional_tokens_approval(operator).await?);
        }
        info!(count = receipts.len(), "all approvals set");
        Ok(receipts)
    }

    /// Send collateral from the wallet after checking its balance
    pub async fn transfer_collateral(
        &self,
        recipient: Address,
        amount: Decimal,
    ) -> Result<TransactionReceipt> {
        let balance = self.collateral_balance(None).await?;
        if balance < amount {
            return Err(Error::InvalidParameter(format!(
                "insufficient collateral balance: {} < {}",
                balance, amount
            )));
        }
        let call = contracts::transfer_collateral(&self.chain, recipient, to_base_units(amount)?);
        self.execute(call, "Collateral Transfer").await
    }

    /// Send outcome tokens from the wallet after checking its balance
    pub async fn transfer_token(
        &self,
        token_id: &TokenId,
        recipient: Address,
        amount: Decimal,
    ) -> Result<TransactionReceipt> {
        let balance = self.token_balance(token_id, None).await?;
        if balance < amount {
            return Err(Error::InvalidParameter(format!(
                "insufficient balance of token {}: {} < {}",
                token_id, balance, amount
            )));
        }
        let call = contracts::transfer_token(
            &self.chain,
            self.wallet,
            recipient,
            token_id.to_u256()?,
            to_base_units(amount)?,
        );
        self.execute(call, "Token Transfer").await
    }

    /// Native gas token balance of the owner key
    pub async fn native_balance(&self) -> Result<Decimal> {
        let balance = self.rpc.balance(self.signer.address()).await?;
        from_base_units(balance, NATIVE_DECIMALS)
    }

    /// Collateral balance of `account`, defaulting to the wallet
    pub async fn collateral_balance(&self, account: Option<Address>) -> Result<Decimal> {
        let account = account.unwrap_or(self.wallet);
        token_units(contracts::collateral_balance(self.rpc.as_ref(), &self.chain, account).await?)
    }

    /// Outcome token balance of `account`, defaulting to the wallet
    pub async fn token_balance(&self, token_id: &TokenId, account: Option<Address>) -> Result<Decimal> {
        let account = account.unwrap_or(self.wallet);
        let balance =
            contracts::token_balance(self.rpc.as_ref(), &self.chain, account, token_id.to_u256()?)
                .await?;
        token_units(balance)
    }
}

impl std::fmt::Debug for Web3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web3Client")
            .field("owner", &self.signer.address())
            .field("wallet", &self.wallet)
            .field("signature_type", &self.signature_type)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
