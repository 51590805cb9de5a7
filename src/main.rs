use anyhow::Context;
use tracing_subscriber::EnvFilter;

use notes_api::config::{self, Environment};
use notes_api::database::{DatabaseManager, MemoryStore, PgStore};
use notes_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notes_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    config.validate()?;
    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let (state, pool) = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            let store = PgStore::new(pool.clone());
            store.ensure_schema().await?;
            (AppState::postgres(config, store)?, Some(pool))
        }
        None => {
            if config.environment != Environment::Development {
                anyhow::bail!("DATABASE_URL is required outside development");
            }
            tracing::warn!("DATABASE_URL not set; notes are kept in memory and lost on restart");
            (AppState::in_memory(config, MemoryStore::new())?, None)
        }
    };

    let app = notes_api::app(config, state);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Closed database pool");
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
