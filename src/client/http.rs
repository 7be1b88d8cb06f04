use crate::client::providers::ProviderError;
use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Status and decoded body of a provider response.
///
/// Non-success statuses are data, not errors: the body is still decoded so
/// callers can log or inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON body, `Value::Null` when the body is empty or not JSON
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP capability the providers are written against
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse, ProviderError>;

    async fn post(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse, ProviderError>;
}

/// `HttpClient` backed by a shared reqwest connection pool
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn send(&self, request: RequestBuilder) -> Result<HttpResponse, ProviderError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Network(format!("Request timed out: {e}"))
            } else if e.is_connect() {
                ProviderError::Network(format!("Connection failed: {e}"))
            } else {
                ProviderError::Network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to read response: {e}")))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                debug!("Response body is not JSON ({} bytes): {}", bytes.len(), e);
                Value::Null
            })
        };

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse, ProviderError> {
        debug!("GET {}", url);
        self.send(self.client.get(url.clone()).headers(headers)).await
    }

    async fn post(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse, ProviderError> {
        debug!("POST {}", url);
        self.send(self.client.post(url.clone()).headers(headers)).await
    }
}
