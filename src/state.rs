use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::pixabay::PixabayClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{HistoryService, SearchService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reusing one client across services enables connection pooling and
/// avoids socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Pixarr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub pixabay: Arc<PixabayClient>,

    pub search_service: Arc<SearchService>,

    pub history_service: Arc<HistoryService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.pixabay.request_timeout_seconds.into())?;

        let pixabay = Arc::new(PixabayClient::with_shared_client(
            http_client,
            &config.pixabay,
        ));

        let search_service = Arc::new(SearchService::new(
            store.clone(),
            pixabay.clone(),
            config.pixabay.cache_ttl_days,
        ));

        let history_service = Arc::new(HistoryService::new(store.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            pixabay,
            search_service,
            history_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
