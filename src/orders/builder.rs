use alloy_primitives::{Address, U256};
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use super::amounts::{get_market_order_amounts, get_order_amounts, OrderAmounts};
use super::rounding::RoundConfig;
use crate::error::Result;
use crate::signing::{sign_order, EthSigner, Order};
use crate::types::{ExtraOrderArgs, MarketOrderArgs, OrderArgs, SignatureType, SignedOrderRequest, TokenId};

/// Where a signed order will be verified
#[derive(Debug, Clone, Copy)]
pub struct OrderContext {
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub round_config: RoundConfig,
}

/// Builds and signs exchange orders for one signer.
///
/// For proxy and Safe wallets the funder (the wallet holding the funds) is the
/// order maker while the EOA key signs.
#[derive(Clone)]
pub struct OrderBuilder {
    signer: Arc<dyn EthSigner>,
    signature_type: SignatureType,
    funder: Option<Address>,
    salt_generator: fn() -> u64,
}

impl OrderBuilder {
    pub fn new(
        signer: impl EthSigner + 'static,
        signature_type: Option<SignatureType>,
        funder: Option<Address>,
    ) -> Self {
        Self::from_arc(Arc::new(signer), signature_type, funder)
    }

    pub fn from_arc(
        signer: Arc<dyn EthSigner>,
        signature_type: Option<SignatureType>,
        funder: Option<Address>,
    ) -> Self {
        Self {
            signer,
            signature_type: signature_type.unwrap_or_default(),
            funder,
            salt_generator: random_salt,
        }
    }

    /// Replace the salt source, e.g. for reproducible signatures
    pub fn with_salt_generator(mut self, salt_generator: fn() -> u64) -> Self {
        self.salt_generator = salt_generator;
        self
    }

    pub fn signer(&self) -> &Arc<dyn EthSigner> {
        &self.signer
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Address that funds the order
    pub fn maker(&self) -> Address {
        self.funder.unwrap_or_else(|| self.signer.address())
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// Compute amounts for a limit order and sign it
    pub fn create_order(
        &self,
        ctx: &OrderContext,
        args: &OrderArgs,
        expiration: u64,
        extras: &ExtraOrderArgs,
    ) -> Result<SignedOrderRequest> {
        let amounts = get_order_amounts(args.side, args.size, args.price, &ctx.round_config)?;
        self.build_signed_order(ctx, &args.token_id, amounts, expiration, extras)
    }

    /// Compute amounts for a market order at `price` and sign it
    pub fn create_market_order(
        &self,
        ctx: &OrderContext,
        args: &MarketOrderArgs,
        price: rust_decimal::Decimal,
        extras: &ExtraOrderArgs,
    ) -> Result<SignedOrderRequest> {
        let amounts = get_market_order_amounts(args.side, args.amount, price, &ctx.round_config)?;
        self.build_signed_order(ctx, &args.token_id, amounts, 0, extras)
    }

    fn build_signed_order(
        &self,
        ctx: &OrderContext,
        token_id: &TokenId,
        amounts: OrderAmounts,
        expiration: u64,
        extras: &ExtraOrderArgs,
    ) -> Result<SignedOrderRequest> {
        let salt = to_ieee_754_int((self.salt_generator)());
        let order = Order {
            salt: U256::from(salt),
            maker: self.maker(),
            signer: self.signer.address(),
            taker: extras.taker,
            tokenId: token_id.to_u256()?,
            makerAmount: U256::from(amounts.maker_amount),
            takerAmount: U256::from(amounts.taker_amount),
            expiration: U256::from(expiration),
            nonce: extras.nonce,
            feeRateBps: U256::from(extras.fee_rate_bps),
            side: amounts.side.as_u8(),
            signatureType: self.signature_type.as_u8(),
        };

        let signature = sign_order(
            self.signer.as_ref(),
            &order,
            ctx.chain_id,
            ctx.verifying_contract,
        )?;
        debug!(
            token_id = %token_id,
            side = %amounts.side,
            maker_amount = amounts.maker_amount,
            taker_amount = amounts.taker_amount,
            "signed order"
        );

        Ok(SignedOrderRequest {
            salt,
            maker: order.maker,
            signer: order.signer,
            taker: order.taker,
            token_id: token_id.as_str().to_string(),
            maker_amount: amounts.maker_amount.to_string(),
            taker_amount: amounts.taker_amount.to_string(),
            expiration: expiration.to_string(),
            nonce: extras.nonce.to_string(),
            fee_rate_bps: extras.fee_rate_bps.to_string(),
            side: amounts.side,
            signature_type: self.signature_type,
            signature,
        })
    }
}

impl std::fmt::Debug for OrderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBuilder")
            .field("signer", &self.signer.address())
            .field("signature_type", &self.signature_type)
            .field("funder", &self.funder)
            .finish()
    }
}

fn random_salt() -> u64 {
    rand::thread_rng().gen()
}

/// Salts are parsed as IEEE 754 doubles by the backend, keep them <= 2^53 - 1
fn to_ieee_754_int(salt: u64) -> u64 {
    salt & ((1 << 53) - 1)
}
