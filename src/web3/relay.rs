use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::RelayConfig;
use crate::error::Result;
use crate::http::{create_builder_headers, with_query, Headers, HttpClient};
use crate::types::serde_helpers::deserialize_u64;
use crate::types::BuilderCreds;

pub(crate) const SUBMIT_PATH: &str = "/submit";

/// Relay node and nonce to use for the next proxy meta-transaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayPayload {
    pub address: Address,
    #[serde(deserialize_with = "deserialize_u64")]
    pub nonce: u64,
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    #[serde(deserialize_with = "deserialize_u64")]
    nonce: u64,
}

/// Relay acknowledgement of a submitted meta-transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default, rename = "transactionID")]
    pub transaction_id: String,
    #[serde(default)]
    pub state: String,
}

/// Gas and relay parameters the signature was produced over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignatureParams {
    #[serde(rename_all = "camelCase")]
    Proxy {
        gas_price: String,
        gas_limit: String,
        relayer_fee: String,
        relay_hub: String,
        relay: String,
    },
    #[serde(rename_all = "camelCase")]
    Safe {
        base_gas: String,
        gas_price: String,
        gas_token: String,
        operation: String,
        refund_receiver: String,
        safe_txn_gas: String,
    },
}

/// Body of `POST /submit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySubmitRequest {
    pub data: String,
    pub from: String,
    pub metadata: String,
    pub nonce: String,
    pub proxy_wallet: String,
    pub signature: String,
    pub signature_params: SignatureParams,
    pub to: String,
    #[serde(rename = "type")]
    pub wallet_type: String,
}

/// Gas-less relay service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Relay node and current nonce for a proxy wallet owner
    async fn relay_payload(&self, owner: Address, wallet_type: &str) -> Result<RelayPayload>;

    /// Current relay nonce for a wallet owner
    async fn nonce(&self, owner: Address, wallet_type: &str) -> Result<u64>;

    /// Submit a serialized [`RelaySubmitRequest`]; the string is sent as-is
    async fn submit(&self, body: String) -> Result<RelayResponse>;
}

/// How relay submissions are authenticated
#[derive(Debug, Clone)]
pub enum RelayAuth {
    /// Sign locally with builder API credentials
    Builder(BuilderCreds),
    /// Ask a signing service for the headers
    Remote { sign_url: String },
}

/// Resolved submit authentication; the signing service shares the relay connection pool
#[derive(Debug, Clone)]
enum SubmitAuth {
    Builder(BuilderCreds),
    Remote(HttpClient),
}

/// HTTP client for the Polymarket relayer
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: HttpClient,
    auth: SubmitAuth,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>, auth: RelayAuth) -> Self {
        let client = Client::new();
        let auth = match auth {
            RelayAuth::Builder(creds) => SubmitAuth::Builder(creds),
            RelayAuth::Remote { sign_url } => {
                SubmitAuth::Remote(HttpClient::with_client(client.clone(), sign_url))
            }
        };
        Self {
            http_client: HttpClient::with_client(client, relay_url),
            auth,
        }
    }

    /// Client for `config.relay_url`, signing locally when builder credentials are given
    /// and through `config.sign_url` otherwise
    pub fn from_config(config: &RelayConfig, builder_creds: Option<BuilderCreds>) -> Self {
        let auth = match builder_creds {
            Some(creds) => RelayAuth::Builder(creds),
            None => RelayAuth::Remote {
                sign_url: config.sign_url.clone(),
            },
        };
        Self::new(config.relay_url.as_str(), auth)
    }

    async fn submit_headers(&self, body: &str) -> Result<Headers> {
        match &self.auth {
            SubmitAuth::Builder(creds) => {
                create_builder_headers(creds, "POST", SUBMIT_PATH, Some(body))
            }
            SubmitAuth::Remote(signer) => {
                debug!(sign_url = %signer.base_url(), "requesting relay headers from signing service");
                let request = json!({
                    "method": "POST",
                    "path": SUBMIT_PATH,
                    "body": body,
                });
                signer.post("", Some(request.to_string()), None).await
            }
        }
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn relay_payload(&self, owner: Address, wallet_type: &str) -> Result<RelayPayload> {
        let path = with_query(
            "/relay-payload",
            &[
                ("address", owner.to_checksum(None)),
                ("type", wallet_type.to_string()),
            ],
        );
        self.http_client.get(&path, None).await
    }

    async fn nonce(&self, owner: Address, wallet_type: &str) -> Result<u64> {
        let path = with_query(
            "/nonce",
            &[
                ("address", owner.to_checksum(None)),
                ("type", wallet_type.to_string()),
            ],
        );
        let response: NonceResponse = self.http_client.get(&path, None).await?;
        Ok(response.nonce)
    }

    async fn submit(&self, body: String) -> Result<RelayResponse> {
        let headers = self.submit_headers(&body).await?;
        self.http_client
            .post(SUBMIT_PATH, Some(body), Some(headers))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_picks_auth() {
        let config = RelayConfig::default();
        let remote = RelayClient::from_config(&config, None);
        assert!(matches!(remote.auth, SubmitAuth::Remote(ref signer) if signer.base_url() == config.sign_url));
        assert_eq!(remote.http_client.base_url(), "https://relayer-v2.polymarket.com");

        let creds = BuilderCreds::new("key", "c2VjcmV0", "pass");
        let local = RelayClient::from_config(&config, Some(creds));
        assert!(matches!(local.auth, SubmitAuth::Builder(_)));
    }

    #[test]
    fn test_payload_nonce_as_string() {
        let payload: RelayPayload = serde_json::from_str(
            r#"{"address":"0x7db63fe6d62eb73fb01f8009416f4c2bb4fbda6a","nonce":"31"}"#,
        )
        .unwrap();
        assert_eq!(payload.nonce, 31);
        assert_eq!(
            payload.address.to_checksum(None).to_lowercase(),
            "0x7db63fe6d62eb73fb01f8009416f4c2bb4fbda6a"
        );

        let nonce: NonceResponse = serde_json::from_str(r#"{"nonce":4}"#).unwrap();
        assert_eq!(nonce.nonce, 4);
    }

    #[test]
    fn test_response_fields() {
        let response: RelayResponse = serde_json::from_str(
            r#"{"transactionHash":"0xabc","transactionID":"id-1","state":"STATE_NEW"}"#,
        )
        .unwrap();
        assert_eq!(response.transaction_hash, "0xabc");
        assert_eq!(response.transaction_id, "id-1");

        let empty: RelayResponse = serde_json::from_str(r#"{"state":"STATE_FAILED"}"#).unwrap();
        assert!(empty.transaction_hash.is_empty());
    }

    #[test]
    fn test_submit_request_wire_names() {
        let request = RelaySubmitRequest {
            data: "0x01".to_string(),
            from: "0xfrom".to_string(),
            metadata: "Redeem".to_string(),
            nonce: "3".to_string(),
            proxy_wallet: "0xwallet".to_string(),
            signature: "0xsig".to_string(),
            signature_params: SignatureParams::Proxy {
                gas_price: "0".to_string(),
                gas_limit: "230000".to_string(),
                relayer_fee: "0".to_string(),
                relay_hub: "0xhub".to_string(),
                relay: "0xrelay".to_string(),
            },
            to: "0xfactory".to_string(),
            wallet_type: "PROXY".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["proxyWallet"], "0xwallet");
        assert_eq!(value["type"], "PROXY");
        assert_eq!(value["signatureParams"]["gasLimit"], "230000");
        assert_eq!(value["signatureParams"]["relayerFee"], "0");
        assert_eq!(value["signatureParams"]["relayHub"], "0xhub");

        let safe = SignatureParams::Safe {
            base_gas: "0".to_string(),
            gas_price: "0".to_string(),
            gas_token: "0x0".to_string(),
            operation: "0".to_string(),
            refund_receiver: "0x0".to_string(),
            safe_txn_gas: "0".to_string(),
        };
        let value = serde_json::to_value(&safe).unwrap();
        assert_eq!(value["safeTxnGas"], "0");
        assert_eq!(value["refundReceiver"], "0x0");
    }

    #[test]
    fn test_builder_headers_cover_exact_body() {
        let creds = BuilderCreds::new("key", "c2VjcmV0c2VjcmV0c2VjcmV0", "pass");
        let a = create_builder_headers(&creds, "POST", SUBMIT_PATH, Some(r#"{"nonce":"1"}"#)).unwrap();
        let b = create_builder_headers(&creds, "POST", SUBMIT_PATH, Some(r#"{"nonce":"2"}"#)).unwrap();
        assert_eq!(a["POLY_BUILDER_API_KEY"], "key");
        if a["POLY_BUILDER_TIMESTAMP"] == b["POLY_BUILDER_TIMESTAMP"] {
            assert_ne!(a["POLY_BUILDER_SIGNATURE"], b["POLY_BUILDER_SIGNATURE"]);
        }
    }
}
