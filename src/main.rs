use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use benefits_api::app::{router, AppState};
use benefits_api::config::{AppConfig, StorageBackend};
use benefits_api::database::{DatabaseManager, DynStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("benefits_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!("Starting Benefits API in {:?} mode", config.environment);

    let store: DynStore = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let db = DatabaseManager::connect(&config.database)
                .await
                .context("connecting to PostgreSQL")?;
            db.ensure_schema().await.context("creating schema")?;
            Arc::new(PgStore::new(db))
        }
    };

    let bind_addr = config.bind_addr();
    let app = router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Benefits API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
