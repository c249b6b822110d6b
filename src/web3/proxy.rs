//! Relay authorization for Polymarket proxy wallets.

use alloy_primitives::{hex, keccak256, Address, Bytes, B256, U256};

use crate::error::Result;
use crate::signing::{sign_personal_hash, EthSigner};

const RELAY_PREFIX: &[u8] = b"rlx:";

/// Fields covered by a proxy relay signature
#[derive(Debug, Clone)]
pub struct ProxyRelayStruct<'a> {
    pub from: Address,
    /// Proxy wallet factory that receives the relayed call
    pub to: Address,
    pub data: &'a Bytes,
    pub relayer_fee: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub nonce: U256,
    pub relay_hub: Address,
    pub relay: Address,
}

impl ProxyRelayStruct<'_> {
    /// Packed encoding: prefix, addresses and raw data, numbers as 32-byte words
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 20 * 4 + self.data.len() + 32 * 4);
        out.extend_from_slice(RELAY_PREFIX);
        out.extend_from_slice(self.from.as_slice());
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(self.data);
        out.extend_from_slice(&self.relayer_fee.to_be_bytes::<32>());
        out.extend_from_slice(&self.gas_price.to_be_bytes::<32>());
        out.extend_from_slice(&self.gas_limit.to_be_bytes::<32>());
        out.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        out.extend_from_slice(self.relay_hub.as_slice());
        out.extend_from_slice(self.relay.as_slice());
        out
    }

    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }
}

/// Force the recovery byte into {27, 28}
pub(crate) fn normalize_v(mut signature: [u8; 65]) -> [u8; 65] {
    if signature[64] < 27 {
        signature[64] += 27;
    }
    signature
}

/// Personal-sign the struct hash for the relay
pub fn sign_proxy_relay(signer: &dyn EthSigner, relay_struct: &ProxyRelayStruct<'_>) -> Result<String> {
    let signature = sign_personal_hash(signer, &relay_struct.hash())?;
    Ok(hex::encode_prefixed(normalize_v(signature.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::test_utils::test_signer;
    use alloy_primitives::{address, eip191_hash_message, PrimitiveSignature};

    fn sample(data: &Bytes) -> ProxyRelayStruct<'_> {
        ProxyRelayStruct {
            from: address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
            to: address!("ab45c5a4b0c941a2f231c04c3f49182e1a254052"),
            data,
            relayer_fee: U256::ZERO,
            gas_price: U256::ZERO,
            gas_limit: U256::from(230_000u64),
            nonce: U256::from(7u64),
            relay_hub: address!("d216153c06e857cd7f72665e0af1d7d82172f494"),
            relay: address!("7db63fe6d62eb73fb01f8009416f4c2bb4fbda6a"),
        }
    }

    #[test]
    fn test_encode_layout() {
        let data = Bytes::from(vec![0xaa, 0xbb, 0xcc]);
        let relay_struct = sample(&data);
        let encoded = relay_struct.encode();

        assert_eq!(encoded.len(), 4 + 20 + 20 + 3 + 32 * 4 + 20 + 20);
        assert_eq!(&encoded[..4], b"rlx:");
        assert_eq!(&encoded[4..24], relay_struct.from.as_slice());
        assert_eq!(&encoded[24..44], relay_struct.to.as_slice());
        assert_eq!(&encoded[44..47], &[0xaa, 0xbb, 0xcc]);

        let gas_limit_word = &encoded[47 + 64..47 + 96];
        assert_eq!(U256::from_be_slice(gas_limit_word), U256::from(230_000u64));
        let nonce_word = &encoded[47 + 96..47 + 128];
        assert_eq!(nonce_word[31], 7);

        assert_eq!(&encoded[encoded.len() - 20..], relay_struct.relay.as_slice());
        assert_eq!(relay_struct.hash(), keccak256(&encoded));
    }

    #[test]
    fn test_hash_covers_nonce() {
        let data = Bytes::from(vec![1u8]);
        let a = sample(&data);
        let mut b = sample(&data);
        b.nonce = U256::from(8u64);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_normalize_v() {
        let mut raw = [0u8; 65];
        raw[64] = 1;
        assert_eq!(normalize_v(raw)[64], 28);
        raw[64] = 27;
        assert_eq!(normalize_v(raw)[64], 27);
    }

    #[test]
    fn test_signature_recovers_owner() {
        let signer = test_signer();
        let data = Bytes::from(vec![0x01, 0x02]);
        let relay_struct = sample(&data);

        let sig_hex = sign_proxy_relay(&signer, &relay_struct).unwrap();
        let raw = hex::decode(&sig_hex).unwrap();
        assert!(raw[64] == 27 || raw[64] == 28);

        let signature = PrimitiveSignature::try_from(raw.as_slice()).unwrap();
        let digest = eip191_hash_message(relay_struct.hash());
        assert_eq!(
            signature.recover_address_from_prehash(&digest).unwrap(),
            relay_struct.from
        );
    }
}
