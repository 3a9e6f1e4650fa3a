use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::PixabayConfig;
use crate::constants::provider;

/// Errors from the image-search provider, split so callers can tell quota
/// exhaustion apart from everything else.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider signalled quota exhaustion (HTTP 429).
    #[error("rate limited: too many requests to the provider")]
    RateLimited,

    /// Request exceeded the configured timeout.
    #[error("request timeout")]
    Timeout,

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Non-success HTTP status other than 429.
    #[error("unexpected status: {0}")]
    Status(StatusCode),

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

/// One raw provider hit. `tags` stays comma-joined here; splitting it is
/// the orchestrator's transform.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageHit {
    pub id: i64,
    #[serde(rename = "webformatURL")]
    pub webformat_url: String,
    #[serde(rename = "previewURL")]
    pub preview_url: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    hits: Vec<ImageHit>,
}

/// Contract the search path consumes: one fixed-size page of ranked hits
/// for a free-text query, safe-search always on.
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    async fn search_images(&self, query: &str) -> Result<Vec<ImageHit>, ProviderError>;
}

#[derive(Clone)]
pub struct PixabayClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PixabayClient {
    pub fn new(config: &PixabayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .build()
            .unwrap_or_default();

        Self::with_shared_client(client, config)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &PixabayConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ImageProvider for PixabayClient {
    async fn search_images(&self, query: &str) -> Result<Vec<ImageHit>, ProviderError> {
        let url = format!(
            "{}?key={}&q={}&per_page={}&safesearch=true",
            self.base_url,
            self.api_key,
            urlencoding::encode(query),
            provider::PAGE_SIZE
        );

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: PixabayResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(body.hits)
    }
}

/// Asset URLs can be rebuilt from the image id alone, which lets cached and
/// historical results render without another provider call.
#[must_use]
pub fn webformat_url(id: i64) -> String {
    format!("{}/{id}_640.jpg", provider::CDN_BASE)
}

#[must_use]
pub fn preview_url(id: i64) -> String {
    format!("{}/{id}-180.jpg", provider::CDN_BASE)
}
