use crate::entities::prelude::Users;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key (regenerate after first login)
const DEFAULT_API_KEY: &str = "pixarr_default_api_key_please_regenerate";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed default admin user with hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::FullName,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::ApiKey,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                "Administrator".into(),
                "admin@localhost".into(),
                password_hash.into(),
                DEFAULT_API_KEY.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchRecords::UserId).integer().not_null())
                    .col(ColumnDef::new(SearchRecords::Query).string().not_null())
                    .col(
                        ColumnDef::new(SearchRecords::ImageIdsJson)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchRecords::TagsJson).text().not_null())
                    .col(
                        ColumnDef::new(SearchRecords::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SearchRecords::ExpiresAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_records_user")
                    .table(SearchRecords::Table)
                    .col(SearchRecords::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_records_user_query")
                    .table(SearchRecords::Table)
                    .col(SearchRecords::UserId)
                    .col(SearchRecords::Query)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchRecords::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum SearchRecords {
    Table,
    Id,
    UserId,
    Query,
    ImageIdsJson,
    TagsJson,
    CreatedAt,
    ExpiresAt,
}
