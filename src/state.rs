use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::products::repo::{PgProductRepository, ProductStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url, config.max_connections).await?;
        let store = Arc::new(PgProductRepository::new(pool)) as Arc<dyn ProductStore>;
        Ok(Self { store })
    }

    pub fn from_store(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::products::repo::memory::MemoryStore;

        Self::from_store(Arc::new(MemoryStore::default()))
    }
}
