use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::search_record::{SearchPayload, SearchRecord};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // In-memory SQLite is per-connection; a single-connection pool keeps
        // every handle on the same database.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn search_record_repo(&self) -> repositories::search_record::SearchRecordRepository {
        repositories::search_record::SearchRecordRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn upsert_search_record(
        &self,
        user_id: i32,
        query: &str,
        payload: &SearchPayload,
        ttl: chrono::Duration,
    ) -> Result<SearchRecord> {
        self.search_record_repo()
            .upsert_if_absent(user_id, query, payload, ttl)
            .await
    }

    pub async fn find_live_search_record(
        &self,
        user_id: i32,
        query: &str,
    ) -> Result<Option<SearchRecord>> {
        self.search_record_repo().find_live(user_id, query).await
    }

    pub async fn list_search_records_by_owner(&self, user_id: i32) -> Result<Vec<SearchRecord>> {
        self.search_record_repo().list_by_owner(user_id).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, full_name, email, password, security)
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, security)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }
}
