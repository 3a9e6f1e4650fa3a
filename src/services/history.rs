//! Rebuilds a user's search history from persisted records. History is a
//! derived read over records owned by the user; the search path writes
//! nothing beyond the record itself.

use serde::Serialize;
use thiserror::Error;

use crate::clients::pixabay;
use crate::db::Store;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("User {0} not found")]
    UnknownUser(i32),

    #[error("Database error: {0}")]
    Database(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryImage {
    pub id: i64,
    pub thumbnail: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub images: Vec<HistoryImage>,
    pub date: String,
}

pub struct HistoryService {
    store: Store,
}

impl HistoryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// All searches the user has made, newest first. Expired cache records
    /// still show up here; only their cache-hit eligibility expired.
    pub async fn history(&self, user_id: i32) -> Result<Vec<HistoryEntry>, HistoryError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        if user.is_none() {
            return Err(HistoryError::UnknownUser(user_id));
        }

        let records = self
            .store
            .list_search_records_by_owner(user_id)
            .await
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let entries = records
            .into_iter()
            .map(|record| HistoryEntry {
                images: record
                    .payload
                    .image_ids
                    .iter()
                    .map(|&id| HistoryImage {
                        id,
                        thumbnail: pixabay::preview_url(id),
                        tags: record.payload.tags.get(&id).cloned().unwrap_or_default(),
                    })
                    .collect(),
                query: record.query,
                date: record.created_at,
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SearchPayload;
    use std::collections::HashMap;

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.expect("store")
    }

    fn payload(ids: &[i64], tagged: Option<(i64, &[&str])>) -> SearchPayload {
        let mut tags = HashMap::new();
        if let Some((id, list)) = tagged {
            tags.insert(id, list.iter().map(ToString::to_string).collect());
        }
        SearchPayload {
            image_ids: ids.to_vec(),
            tags,
        }
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let store = store().await;
        let service = HistoryService::new(store);

        let err = service.history(999).await.unwrap_err();
        assert!(matches!(err, HistoryError::UnknownUser(999)));
    }

    #[tokio::test]
    async fn new_user_has_empty_history() {
        let store = store().await;
        let service = HistoryService::new(store);

        // Seeded admin user, no searches yet
        let entries = service.history(1).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn history_includes_expired_records_newest_first() {
        let store = store().await;

        store
            .upsert_search_record(1, "dogs", &payload(&[7], None), chrono::Duration::seconds(-1))
            .await
            .unwrap();
        store
            .upsert_search_record(
                1,
                "cats",
                &payload(&[101, 102], Some((101, &["cat", "pet"]))),
                chrono::Duration::days(3),
            )
            .await
            .unwrap();

        let service = HistoryService::new(store);
        let entries = service.history(1).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "cats");
        assert_eq!(entries[1].query, "dogs");
        assert!(entries[0].date >= entries[1].date);

        let first = &entries[0];
        assert_eq!(first.images.len(), 2);
        assert_eq!(
            first.images[0].thumbnail,
            "https://pixabay.com/get/101-180.jpg"
        );
        assert_eq!(first.images[0].tags, vec!["cat", "pet"]);
        assert!(first.images[1].tags.is_empty());
    }

    #[tokio::test]
    async fn history_never_crosses_owners() {
        let store = store().await;

        store
            .upsert_search_record(1, "cats", &payload(&[1], None), chrono::Duration::days(3))
            .await
            .unwrap();

        let service = HistoryService::new(store.clone());
        let entries = service.history(1).await.unwrap();
        assert_eq!(entries.len(), 1);

        // A second user exists but owns nothing
        let other = store
            .create_user(
                "nadia",
                "Nadia K",
                "nadia@example.com",
                "correct horse",
                &crate::config::SecurityConfig::default(),
            )
            .await
            .unwrap();

        let empty = service.history(other.id).await.unwrap();
        assert!(empty.is_empty());
    }
}
