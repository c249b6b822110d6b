use alloy_primitives::U256;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{create_l1_headers, create_l2_headers, HttpClient};
use crate::signing::EthSigner;
use crate::types::{ApiCreds, ApiKeysResponse};

/// Client for API key management
///
/// Creating and deriving keys needs only the wallet signature (L1); listing
/// and deleting keys needs the API credentials as well (L2).
pub struct AuthenticatedClient {
    http_client: HttpClient,
    signer: Arc<dyn EthSigner>,
    chain_id: u64,
    api_creds: Option<ApiCreds>,
}

impl AuthenticatedClient {
    /// Create a new AuthenticatedClient
    ///
    /// # Arguments
    /// * `host` - The base URL for the API
    /// * `signer` - The Ethereum signer used for API authentication
    /// * `chain_id` - The chain ID (137 for Polygon, 80002 for Amoy testnet)
    /// * `api_creds` - Optional API credentials for L2 operations
    pub fn new(
        host: impl Into<String>,
        signer: impl EthSigner + 'static,
        chain_id: u64,
        api_creds: Option<ApiCreds>,
    ) -> Self {
        Self::from_arc(host, Arc::new(signer), chain_id, api_creds)
    }

    pub fn from_arc(
        host: impl Into<String>,
        signer: Arc<dyn EthSigner>,
        chain_id: u64,
        api_creds: Option<ApiCreds>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(host),
            signer,
            chain_id,
            api_creds,
        }
    }

    pub fn api_creds(&self) -> Option<&ApiCreds> {
        self.api_creds.as_ref()
    }

    /// Create a new API key (L1 authentication required)
    pub async fn create_api_key(&self, nonce: Option<U256>) -> Result<ApiCreds> {
        let headers = create_l1_headers(self.signer.as_ref(), self.chain_id, nonce)?;
        debug!(address = %self.signer.address(), "creating API key");
        self.http_client
            .post("/auth/api-key", None, Some(headers))
            .await
    }

    /// Derive the API key bound to a nonce (L1 authentication required)
    pub async fn derive_api_key(&self, nonce: Option<U256>) -> Result<ApiCreds> {
        let headers = create_l1_headers(self.signer.as_ref(), self.chain_id, nonce)?;
        self.http_client
            .get("/auth/derive-api-key", Some(headers))
            .await
    }

    /// Create an API key, falling back to deriving the existing one
    pub async fn create_or_derive_api_key(&self, nonce: Option<U256>) -> Result<ApiCreds> {
        match self.create_api_key(nonce).await {
            Ok(creds) => Ok(creds),
            Err(e) => {
                debug!(error = %e, "API key creation failed, deriving");
                self.derive_api_key(nonce).await
            }
        }
    }

    /// Get all API keys for the current user (L2 authentication required)
    pub async fn get_api_keys(&self) -> Result<ApiKeysResponse> {
        let creds = self.require_creds()?;
        let path = "/auth/api-keys";
        let headers = create_l2_headers(self.signer.as_ref(), creds, "GET", path, None)?;
        self.http_client.get(path, Some(headers)).await
    }

    /// Delete the API key in use (L2 authentication required)
    pub async fn delete_api_key(&self) -> Result<serde_json::Value> {
        let creds = self.require_creds()?;
        let path = "/auth/api-key";
        let headers = create_l2_headers(self.signer.as_ref(), creds, "DELETE", path, None)?;
        self.http_client.delete(path, None, Some(headers)).await
    }

    fn require_creds(&self) -> Result<&ApiCreds> {
        self.api_creds
            .as_ref()
            .ok_or_else(|| Error::AuthRequired("API credentials are required (L2)".to_string()))
    }
}
