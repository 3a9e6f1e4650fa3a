//! Decides cache-hit vs cache-miss for image searches and keeps the
//! provider out of the loop whenever a live record exists.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::clients::pixabay::{self, ImageHit, ImageProvider, ProviderError};
use crate::constants::provider;
use crate::db::{SearchPayload, SearchRecord, Store};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query is required")]
    InvalidQuery,

    #[error("Too many requests to the image provider")]
    RateLimited,

    #[error("Image provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => Self::RateLimited,
            other => Self::Provider(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    Api,
}

/// Canonical image record: same shape whether it came fresh from the
/// provider or was rebuilt from a cached record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageResult {
    pub id: i64,
    #[serde(rename = "webformatURL")]
    pub webformat_url: String,
    #[serde(rename = "previewURL")]
    pub preview_url: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub source: ResultSource,
    pub images: Vec<ImageResult>,
    pub attribution: &'static str,
}

pub struct SearchService {
    store: Store,
    provider: Arc<dyn ImageProvider>,
    ttl: chrono::Duration,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn ImageProvider>, ttl_days: i64) -> Self {
        Self {
            store,
            provider,
            ttl: chrono::Duration::days(ttl_days),
        }
    }

    pub async fn search(
        &self,
        user_id: i32,
        raw_query: &str,
    ) -> Result<SearchOutcome, SearchError> {
        if raw_query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }

        // Queries are cached verbatim: "Cats" and "cats" are distinct keys.
        let cached = self
            .store
            .find_live_search_record(user_id, raw_query)
            .await
            .map_err(|e| SearchError::Database(e.to_string()))?;

        if let Some(record) = cached {
            debug!(user_id, query = raw_query, "search cache hit");
            return Ok(SearchOutcome {
                source: ResultSource::Cache,
                images: images_from_record(&record),
                attribution: provider::ATTRIBUTION,
            });
        }

        // Miss: a failed provider call writes nothing, so the next
        // identical request simply tries again.
        let hits = self.provider.search_images(raw_query).await?;
        let images: Vec<ImageResult> = hits.into_iter().map(canonical_image).collect();

        let payload = SearchPayload {
            image_ids: images.iter().map(|img| img.id).collect(),
            tags: images
                .iter()
                .filter(|img| !img.tags.is_empty())
                .map(|img| (img.id, img.tags.clone()))
                .collect(),
        };

        let record = self
            .store
            .upsert_search_record(user_id, raw_query, &payload, self.ttl)
            .await
            .map_err(|e| SearchError::Database(e.to_string()))?;

        info!(
            user_id,
            query = raw_query,
            results = record.payload.image_ids.len(),
            "cached provider results"
        );

        // A racing identical search may have won the insert; report
        // whatever the store kept.
        let images = if record.payload.image_ids == payload.image_ids {
            images
        } else {
            images_from_record(&record)
        };

        Ok(SearchOutcome {
            source: ResultSource::Api,
            images,
            attribution: provider::ATTRIBUTION,
        })
    }
}

fn canonical_image(hit: ImageHit) -> ImageResult {
    let tags = split_tags(&hit.tags);
    ImageResult {
        id: hit.id,
        webformat_url: hit.webformat_url,
        preview_url: hit.preview_url,
        tags,
    }
}

/// The provider reports tags as one comma-joined string.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Deterministic rebuild from stored ids and tags; URLs come from the
/// fixed templates, never from the network.
fn images_from_record(record: &SearchRecord) -> Vec<ImageResult> {
    record
        .payload
        .image_ids
        .iter()
        .map(|&id| ImageResult {
            id,
            webformat_url: pixabay::webformat_url(id),
            preview_url: pixabay::preview_url(id),
            tags: record.payload.tags.get(&id).cloned().unwrap_or_default(),
        })
        .collect()
}
