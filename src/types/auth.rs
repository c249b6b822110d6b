use serde::{Deserialize, Serialize};
use std::fmt;

/// L2 API credentials issued by the order book service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCreds {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl ApiCreds {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            secret,
            passphrase,
        }
    }
}

impl fmt::Debug for ApiCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCreds")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Builder credentials used to authenticate relay submissions
#[derive(Clone, PartialEq, Eq)]
pub struct BuilderCreds {
    pub key: String,
    pub secret: String,
    pub passphrase: String,
}

impl BuilderCreds {
    pub fn new(key: impl Into<String>, secret: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }
}

impl fmt::Debug for BuilderCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderCreds")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeysResponse {
    #[serde(rename = "apiKeys", default)]
    pub api_keys: Vec<String>,
}
