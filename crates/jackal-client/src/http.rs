use std::time::Duration;

use async_trait::async_trait;
use jackal_core::{MemoryError, MemoryService, ProvisionReceipt, SaveReceipt, UsageReport};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

/// Hosted deployment of the Jackal Memory service.
pub const DEFAULT_BASE_URL: &str = "https://web-production-5cce7.up.railway.app";

// The service itself imposes no deadline; without one a stalled connection
// hangs the invocation forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the remote service. Constructed explicitly by the
/// caller; this layer performs no environment lookups of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_token: String,
}

/// reqwest-backed `MemoryService`. Every request carries the bearer
/// credential; a blank credential is rejected at construction, before any
/// network traffic.
#[derive(Debug)]
pub struct HttpMemoryService {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    content: String,
}

impl HttpMemoryService {
    pub fn new(config: ServiceConfig) -> Result<Self, MemoryError> {
        let token = config.api_token.trim().to_string();
        if token.is_empty() {
            return Err(MemoryError::config(
                "API key is not set (JACKAL_MEMORY_API_KEY or config api_key)",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MemoryError::transport(None, e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn headers(&self) -> Result<HeaderMap, MemoryError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jackal-memory-cli"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| MemoryError::config(format!("API key is not a valid header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

#[async_trait]
impl MemoryService for HttpMemoryService {
    #[instrument(skip_all, fields(jackal_address))]
    async fn provision(&self, jackal_address: &str) -> Result<ProvisionReceipt, MemoryError> {
        let resp = self
            .client
            .post(self.url("/provision"))
            .headers(self.headers()?)
            .json(&json!({ "jackal_address": jackal_address }))
            .send()
            .await
            .map_err(send_err)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(send_err)
    }

    #[instrument(skip_all, fields(key))]
    async fn save(&self, key: &str, content: &str) -> Result<SaveReceipt, MemoryError> {
        let resp = self
            .client
            .post(self.url("/save"))
            .headers(self.headers()?)
            .json(&json!({ "key": key, "content": content }))
            .send()
            .await
            .map_err(send_err)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(send_err)
    }

    #[instrument(skip_all, fields(key))]
    async fn load(&self, key: &str) -> Result<String, MemoryError> {
        let resp = self
            .client
            .get(self.url(&format!("/load/{key}")))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(send_err)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(MemoryError::NotFound {
                key: key.to_string(),
            });
        }

        let resp = check_status(resp).await?;
        let body: LoadResponse = resp.json().await.map_err(send_err)?;
        Ok(body.content)
    }

    #[instrument(skip_all)]
    async fn usage(&self) -> Result<UsageReport, MemoryError> {
        let resp = self
            .client
            .get(self.url("/usage"))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(send_err)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(send_err)
    }
}

fn send_err(err: reqwest::Error) -> MemoryError {
    MemoryError::transport(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Surface non-2xx responses with status and body so failures are
/// diagnosable. 404 on load is handled before this point.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, MemoryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(MemoryError::transport(Some(status.as_u16()), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str) -> ServiceConfig {
        ServiceConfig {
            base_url: "https://memory.example.test/".into(),
            api_token: token.into(),
        }
    }

    #[test]
    fn blank_token_is_a_config_error_before_any_network_call() {
        for token in ["", "   ", "\n"] {
            let err = HttpMemoryService::new(config(token)).expect_err("should reject");
            assert!(matches!(err, MemoryError::Config { .. }), "token {token:?}");
        }
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let service = HttpMemoryService::new(config("tok")).expect("construct");
        assert_eq!(
            service.url("/load/note"),
            "https://memory.example.test/load/note"
        );
    }

    #[test]
    fn requests_carry_bearer_credential() {
        let service = HttpMemoryService::new(config("  tok-123  ")).expect("construct");
        let headers = service.headers().expect("headers");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok-123");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "jackal-memory-cli");
    }
}
