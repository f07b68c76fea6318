use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::products::repo::ProductStore;

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Creates the products table and index if missing. Callers treat an error
/// here as fatal.
pub async fn init_schema(store: &dyn ProductStore) -> anyhow::Result<()> {
    tracing::info!("ensuring database schema");
    match store.ensure_schema().await {
        Ok(()) => {
            tracing::info!("database schema initialized");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = ?e, "failed to initialize database schema");
            Err(e)
        }
    }
}
