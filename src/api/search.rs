use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, auth::CurrentUser};
use crate::services::{HistoryEntry, SearchOutcome};

#[derive(Debug, Deserialize)]
pub struct ImageSearchQuery {
    pub search: Option<String>,
}

/// GET /search/image?search=<query>
///
/// Served from the per-user cache when a live record exists; otherwise one
/// provider call, persisted with the configured TTL.
pub async fn search_images(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ImageSearchQuery>,
) -> Result<Json<SearchOutcome>, ApiError> {
    // No trimming or case folding; cache keys are the submitted string
    let query = params.search.unwrap_or_default();

    let outcome = state.search_service().search(user.id, &query).await?;

    Ok(Json(outcome))
}

/// GET /search/history
///
/// Everything the user has searched, newest first, expired entries
/// included.
pub async fn search_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let entries = state.history_service().history(user.id).await?;

    Ok(Json(entries))
}
