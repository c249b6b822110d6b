use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `timestamp + method + path + body`, base64url encoded.
///
/// `secret` is base64url encoded. When `body` is given it must be the exact
/// string that is sent on the wire.
pub fn build_hmac_signature(
    secret: &str,
    timestamp: u64,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<String> {
    let key = URL_SAFE
        .decode(secret)
        .map_err(|e| Error::Signing(format!("API secret is not base64url: {}", e)))?;

    let mut message = format!("{}{}{}", timestamp, method, path);
    if let Some(body) = body {
        message.push_str(body);
    }

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| Error::Signing(format!("invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}
