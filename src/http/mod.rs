mod headers;

pub(crate) use headers::{create_builder_headers, create_l1_headers, create_l2_headers, Headers};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::form_urlencoded;

use crate::error::{Error, Result};

/// Thin JSON-over-HTTP client bound to one base URL.
///
/// Bodies are passed as already-serialized strings so that the bytes covered
/// by an HMAC signature are exactly the bytes sent.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, headers: Option<Headers>) -> Result<T> {
        self.send(Method::GET, path, None, headers).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<String>,
        headers: Option<Headers>,
    ) -> Result<T> {
        self.send(Method::POST, path, body, headers).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<String>,
        headers: Option<Headers>,
    ) -> Result<T> {
        self.send(Method::DELETE, path, body, headers).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        headers: Option<Headers>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, &url);
        request = apply_headers(request, headers);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), %url, "request rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn apply_headers(mut request: RequestBuilder, headers: Option<Headers>) -> RequestBuilder {
    if let Some(headers) = headers {
        for (name, value) in headers {
            request = request.header(name, value);
        }
    }
    request
}

/// Append url-encoded `key=value` pairs to a path, skipping empty values
pub(crate) fn with_query(path: &str, params: &[(&str, String)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
        query.append_pair(key, value);
    }
    let query = query.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpClient::new("https://clob.polymarket.com/");
        assert_eq!(client.base_url(), "https://clob.polymarket.com");
    }

    #[test]
    fn test_with_query() {
        assert_eq!(
            with_query("/tick-size", &[("token_id", "123".to_string())]),
            "/tick-size?token_id=123"
        );
        assert_eq!(
            with_query("/nonce", &[("address", "0xabc".to_string()), ("type", String::new())]),
            "/nonce?address=0xabc"
        );
        assert_eq!(with_query("/time", &[]), "/time");
    }

    #[test]
    fn test_with_query_encodes_values() {
        assert_eq!(
            with_query("/markets", &[("cursor", "a b&c=d".to_string())]),
            "/markets?cursor=a+b%26c%3Dd"
        );
    }
}
