//! Owner signatures for Gnosis Safe wallets.

use alloy_primitives::{hex, Bytes, B256};

use crate::error::Result;
use crate::signing::{sign_personal_hash, EthSigner};

/// Safe marks `eth_sign` owner signatures with v in {31, 32}
pub(crate) fn remap_v(mut signature: [u8; 65]) -> [u8; 65] {
    signature[64] = match signature[64] {
        0 | 27 => 31,
        1 | 28 => 32,
        v => v,
    };
    signature
}

/// Personal-sign a Safe transaction hash in the Safe's packed format
pub fn sign_safe_transaction(signer: &dyn EthSigner, safe_tx_hash: &B256) -> Result<Bytes> {
    let signature = sign_personal_hash(signer, safe_tx_hash)?;
    Ok(Bytes::from(remap_v(signature.as_bytes()).to_vec()))
}

pub(crate) fn signature_hex(signature: &Bytes) -> String {
    hex::encode_prefixed(signature)
}
