use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use catalog_api::config;
use catalog_api::database::{DatabaseManager, MemoryStore, PgCatalogStore};
use catalog_api::server::{router, AppState};
use catalog_api::services::Repositories;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting catalog API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set outside development");
    }

    let (repos, manager) = match config.database.url {
        Some(_) => {
            let manager = DatabaseManager::connect(&config.database).await?;
            let store = PgCatalogStore::new(manager.pool().clone(), config.database.query_timeout());
            (Repositories::from_store(store), Some(manager))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory catalog store");
            (Repositories::from_store(MemoryStore::new()), None)
        }
    };

    let app = router(AppState::new(repos, config), config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(manager) = manager {
        manager.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
