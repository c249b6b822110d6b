//! Signing primitives: the [`EthSigner`] capability, EIP-712 digests and
//! HMAC request signatures.

mod eip712;
mod hmac;

pub use eip712::{
    clob_auth_digest, order_domain, order_signing_hash, sign_clob_auth_message, sign_order, Order,
    CLOB_AUTH_MESSAGE, CLOB_DOMAIN_NAME, CLOB_DOMAIN_VERSION, EXCHANGE_DOMAIN_NAME,
    EXCHANGE_DOMAIN_VERSION,
};
pub use hmac::build_hmac_signature;

use alloy_primitives::{eip191_hash_message, hex, Address, PrimitiveSignature, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::error::Result;

/// Capability to sign 32-byte digests with an Ethereum key
pub trait EthSigner: Send + Sync {
    /// Address derived from the signing key
    fn address(&self) -> Address;

    /// ECDSA-sign a raw digest (no message prefix is applied)
    fn sign_hash(&self, hash: &B256) -> Result<PrimitiveSignature>;
}

impl EthSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    fn sign_hash(&self, hash: &B256) -> Result<PrimitiveSignature> {
        Ok(self.sign_hash_sync(hash)?)
    }
}

/// Sign `hash` with the personal-message prefix (`"\x19Ethereum Signed Message:\n32"`)
pub fn sign_personal_hash(signer: &dyn EthSigner, hash: &B256) -> Result<PrimitiveSignature> {
    signer.sign_hash(&eip191_hash_message(hash))
}

/// `0x`-prefixed lowercase hex of the 65-byte `r ‖ s ‖ v` signature, v in {27, 28}
pub fn signature_hex(signature: &PrimitiveSignature) -> String {
    hex::encode_prefixed(signature.as_bytes())
}
