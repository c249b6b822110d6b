use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::{eip712_domain, sol, Eip712Domain, SolStruct};

use super::{signature_hex, EthSigner};
use crate::error::Result;

pub const CLOB_DOMAIN_NAME: &str = "ClobAuthDomain";
pub const CLOB_DOMAIN_VERSION: &str = "1";
pub const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

pub const EXCHANGE_DOMAIN_NAME: &str = "Polymarket CTF Exchange";
pub const EXCHANGE_DOMAIN_VERSION: &str = "1";

sol! {
    /// Authentication challenge signed for L1 endpoints
    struct ClobAuth {
        address address;
        string timestamp;
        uint256 nonce;
        string message;
    }

    /// Exchange order as hashed by the CTF exchange contracts
    #[derive(Debug, PartialEq, Eq)]
    struct Order {
        uint256 salt;
        address maker;
        address signer;
        address taker;
        uint256 tokenId;
        uint256 makerAmount;
        uint256 takerAmount;
        uint256 expiration;
        uint256 nonce;
        uint256 feeRateBps;
        uint8 side;
        uint8 signatureType;
    }
}

/// EIP-712 digest of the CLOB authentication challenge.
///
/// The domain carries only name, version and chain id.
pub fn clob_auth_digest(chain_id: u64, address: Address, timestamp: &str, nonce: U256) -> B256 {
    let domain = eip712_domain! {
        name: CLOB_DOMAIN_NAME,
        version: CLOB_DOMAIN_VERSION,
        chain_id: chain_id,
    };
    let auth = ClobAuth {
        address,
        timestamp: timestamp.to_string(),
        nonce,
        message: CLOB_AUTH_MESSAGE.to_string(),
    };

    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain.separator().as_slice());
    buf[34..66].copy_from_slice(auth.eip712_hash_struct().as_slice());
    keccak256(buf)
}

/// Sign the CLOB authentication challenge, returning the hex signature
pub fn sign_clob_auth_message(
    signer: &dyn EthSigner,
    chain_id: u64,
    timestamp: &str,
    nonce: U256,
) -> Result<String> {
    let digest = clob_auth_digest(chain_id, signer.address(), timestamp, nonce);
    let signature = signer.sign_hash(&digest)?;
    Ok(signature_hex(&signature))
}

/// Domain of the exchange contract that settles the order
pub fn order_domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    eip712_domain! {
        name: EXCHANGE_DOMAIN_NAME,
        version: EXCHANGE_DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: verifying_contract,
    }
}

pub fn order_signing_hash(order: &Order, chain_id: u64, verifying_contract: Address) -> B256 {
    order.eip712_signing_hash(&order_domain(chain_id, verifying_contract))
}

/// Sign an exchange order, returning the hex signature
pub fn sign_order(
    signer: &dyn EthSigner,
    order: &Order,
    chain_id: u64,
    verifying_contract: Address,
) -> Result<String> {
    let hash = order_signing_hash(order, chain_id, verifying_contract);
    let signature = signer.sign_hash(&hash)?;
    Ok(signature_hex(&signature))
}
