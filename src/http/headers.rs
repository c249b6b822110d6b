use alloy_primitives::U256;
use std::collections::HashMap;

use crate::error::Result;
use crate::signing::{build_hmac_signature, sign_clob_auth_message, EthSigner};
use crate::types::{ApiCreds, BuilderCreds};

pub(crate) type Headers = HashMap<String, String>;

const POLY_ADDRESS: &str = "POLY_ADDRESS";
const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";
const POLY_NONCE: &str = "POLY_NONCE";
const POLY_API_KEY: &str = "POLY_API_KEY";
const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";

const POLY_BUILDER_API_KEY: &str = "POLY_BUILDER_API_KEY";
const POLY_BUILDER_PASSPHRASE: &str = "POLY_BUILDER_PASSPHRASE";
const POLY_BUILDER_SIGNATURE: &str = "POLY_BUILDER_SIGNATURE";
const POLY_BUILDER_TIMESTAMP: &str = "POLY_BUILDER_TIMESTAMP";

fn unix_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// L1 headers: an EIP-712 signature over the CLOB auth challenge
pub(crate) fn create_l1_headers(
    signer: &dyn EthSigner,
    chain_id: u64,
    nonce: Option<U256>,
) -> Result<Headers> {
    let timestamp = unix_timestamp().to_string();
    let nonce = nonce.unwrap_or(U256::ZERO);
    let signature = sign_clob_auth_message(signer, chain_id, &timestamp, nonce)?;

    Ok(HashMap::from([
        (POLY_ADDRESS.to_string(), signer.address().to_checksum(None)),
        (POLY_SIGNATURE.to_string(), signature),
        (POLY_TIMESTAMP.to_string(), timestamp),
        (POLY_NONCE.to_string(), nonce.to_string()),
    ]))
}

/// L2 headers: HMAC over the request with the API secret
pub(crate) fn create_l2_headers(
    signer: &dyn EthSigner,
    creds: &ApiCreds,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<Headers> {
    let timestamp = unix_timestamp();
    let signature = build_hmac_signature(&creds.secret, timestamp, method, path, body)?;

    Ok(HashMap::from([
        (POLY_ADDRESS.to_string(), signer.address().to_checksum(None)),
        (POLY_SIGNATURE.to_string(), signature),
        (POLY_TIMESTAMP.to_string(), timestamp.to_string()),
        (POLY_API_KEY.to_string(), creds.api_key.clone()),
        (POLY_PASSPHRASE.to_string(), creds.passphrase.clone()),
    ]))
}

/// Builder headers used to authenticate relay submissions
pub(crate) fn create_builder_headers(
    creds: &BuilderCreds,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<Headers> {
    let timestamp = unix_timestamp();
    let signature = build_hmac_signature(&creds.secret, timestamp, method, path, body)?;

    Ok(HashMap::from([
        (POLY_BUILDER_API_KEY.to_string(), creds.key.clone()),
        (POLY_BUILDER_PASSPHRASE.to_string(), creds.passphrase.clone()),
        (POLY_BUILDER_SIGNATURE.to_string(), signature),
        (POLY_BUILDER_TIMESTAMP.to_string(), timestamp.to_string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{clob_auth_digest, test_utils::test_signer};
    use alloy_primitives::{hex, PrimitiveSignature};

    const SECRET: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

    #[test]
    fn test_l1_headers() {
        let signer = test_signer();
        let headers = create_l1_headers(&signer, 137, Some(U256::from(3u64))).unwrap();
        assert_eq!(headers[POLY_ADDRESS], "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(headers[POLY_NONCE], "3");

        let digest = clob_auth_digest(137, signer.address(), &headers[POLY_TIMESTAMP], U256::from(3u64));
        let bytes = hex::decode(&headers[POLY_SIGNATURE]).unwrap();
        let signature = PrimitiveSignature::try_from(bytes.as_slice()).unwrap();
        assert_eq!(signature.recover_address_from_prehash(&digest).unwrap(), signer.address());
    }

    #[test]
    fn test_l2_headers_sign_exact_body() {
        let signer = test_signer();
        let creds = ApiCreds::new("key".into(), SECRET.into(), "pass".into());
        let body = r#"{"orderID":"0x1"}"#;
        let headers = create_l2_headers(&signer, &creds, "DELETE", "/order", Some(body)).unwrap();

        let timestamp: u64 = headers[POLY_TIMESTAMP].parse().unwrap();
        let expected = build_hmac_signature(SECRET, timestamp, "DELETE", "/order", Some(body)).unwrap();
        assert_eq!(headers[POLY_SIGNATURE], expected);
        assert_eq!(headers[POLY_API_KEY], "key");
        assert_eq!(headers[POLY_PASSPHRASE], "pass");
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn test_builder_headers() {
        let creds = BuilderCreds::new("bkey", SECRET, "bpass");
        let headers = create_builder_headers(&creds, "POST", "/submit", Some("{}")).unwrap();
        assert_eq!(headers[POLY_BUILDER_API_KEY], "bkey");
        assert_eq!(headers[POLY_BUILDER_PASSPHRASE], "bpass");
        assert!(headers.contains_key(POLY_BUILDER_SIGNATURE));
        assert!(headers.contains_key(POLY_BUILDER_TIMESTAMP));
        assert!(!headers.contains_key(POLY_API_KEY));
    }
}
