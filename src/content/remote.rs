use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote problem bank. Items come back as raw JSON; the engine validates
/// them before use.
#[async_trait]
pub trait RemoteItemSource: Send + Sync {
    /// Previously verified items tagged with `skill_id`, at most `limit`.
    async fn fetch_verified(&self, skill_id: &str, limit: usize) -> Result<Vec<Value>, RemoteError>;

    /// Asks the remote factory for freshly generated items.
    async fn generate_on_demand(
        &self,
        skill_id: &str,
        difficulty: f64,
    ) -> Result<Vec<Value>, RemoteError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FactoryRunRequest<'a> {
    skill_id: &'a str,
    difficulty: f64,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct FactoryRunResponse {
    #[serde(default)]
    items: Option<Vec<Value>>,
}

/// `GET {base}/problems` and `POST {base}/factory/run` over reqwest.
#[derive(Clone)]
pub struct HttpItemSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpItemSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::HttpStatus { status, body });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RemoteItemSource for HttpItemSource {
    async fn fetch_verified(&self, skill_id: &str, limit: usize) -> Result<Vec<Value>, RemoteError> {
        let url = format!("{}/problems", self.base_url);
        let limit = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("skillId", skill_id), ("limit", limit.as_str())])
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn generate_on_demand(
        &self,
        skill_id: &str,
        difficulty: f64,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = format!("{}/factory/run", self.base_url);
        let payload = FactoryRunRequest {
            skill_id,
            difficulty,
            count: 1,
        };
        let resp = self.client.post(&url).json(&payload).send().await?;
        let body: FactoryRunResponse = Self::decode(resp).await?;
        Ok(body.items.unwrap_or_default())
    }
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
