use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{prelude::*, search_records};

/// What gets persisted for one search: the provider-ranked image ids plus
/// the tags reported for each id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPayload {
    pub image_ids: Vec<i64>,
    pub tags: HashMap<i64, Vec<String>>,
}

/// A cached search owned by one user. Immutable once written; a row only
/// changes when an expired record is refreshed in place by a new search
/// for the same key.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub id: i32,
    pub user_id: i32,
    pub query: String,
    pub payload: SearchPayload,
    pub created_at: String,
    pub expires_at: String,
}

impl SearchRecord {
    fn from_model(model: search_records::Model) -> Result<Self> {
        let image_ids: Vec<i64> = serde_json::from_str(&model.image_ids_json)?;
        let tags: HashMap<i64, Vec<String>> = serde_json::from_str(&model.tags_json)?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            query: model.query,
            payload: SearchPayload { image_ids, tags },
            created_at: model.created_at,
            expires_at: model.expires_at,
        })
    }
}

pub struct SearchRecordRepository {
    conn: DatabaseConnection,
}

impl SearchRecordRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a record for `(user_id, query)` unless a live one already
    /// exists, then returns whichever record the store kept.
    ///
    /// The whole decision rides on one statement: the unique
    /// `(user_id, query)` index turns a concurrent identical insert into a
    /// conflict, and the conflict update only touches rows whose
    /// `expires_at` has passed. A live row therefore survives every race;
    /// an expired row is refreshed in place, which keeps one row per key
    /// for history.
    pub async fn upsert_if_absent(
        &self,
        user_id: i32,
        query: &str,
        payload: &SearchPayload,
        ttl: chrono::Duration,
    ) -> Result<SearchRecord> {
        let now = chrono::Utc::now();
        let created_at = now.to_rfc3339();
        let expires_at = (now + ttl).to_rfc3339();

        let active = search_records::ActiveModel {
            user_id: Set(user_id),
            query: Set(query.to_string()),
            image_ids_json: Set(serde_json::to_string(&payload.image_ids)?),
            tags_json: Set(serde_json::to_string(&payload.tags)?),
            created_at: Set(created_at.clone()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        SearchRecords::insert(active)
            .on_conflict(
                OnConflict::columns([
                    search_records::Column::UserId,
                    search_records::Column::Query,
                ])
                .update_columns([
                    search_records::Column::ImageIdsJson,
                    search_records::Column::TagsJson,
                    search_records::Column::CreatedAt,
                    search_records::Column::ExpiresAt,
                ])
                .action_and_where(
                    Expr::col(search_records::Column::ExpiresAt).lte(created_at.clone()),
                )
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        let row = SearchRecords::find()
            .filter(search_records::Column::UserId.eq(user_id))
            .filter(search_records::Column::Query.eq(query))
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Search record missing after upsert"))?;

        SearchRecord::from_model(row)
    }

    /// Cache lookup. Expired rows behave as absent; they stay stored so
    /// history can still list them.
    pub async fn find_live(&self, user_id: i32, query: &str) -> Result<Option<SearchRecord>> {
        let now = chrono::Utc::now().to_rfc3339();

        let entry = SearchRecords::find()
            .filter(search_records::Column::UserId.eq(user_id))
            .filter(search_records::Column::Query.eq(query))
            .filter(search_records::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        entry.map(SearchRecord::from_model).transpose()
    }

    /// Every search the owner has made, newest first, expired or not.
    pub async fn list_by_owner(&self, user_id: i32) -> Result<Vec<SearchRecord>> {
        let rows = SearchRecords::find()
            .filter(search_records::Column::UserId.eq(user_id))
            .order_by_desc(search_records::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(SearchRecord::from_model).collect()
    }
}
