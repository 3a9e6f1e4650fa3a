use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// The query exactly as submitted; keys are never normalized.
    pub query: String,

    /// JSON array of image ids, provider ranking order.
    #[sea_orm(column_type = "Text")]
    pub image_ids_json: String,

    /// JSON object: image id -> tag list. Keys are a subset of the ids.
    #[sea_orm(column_type = "Text")]
    pub tags_json: String,

    pub created_at: String, // SQLite doesn't strictly enforce types, but typically strings for ISO8601
    pub expires_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
