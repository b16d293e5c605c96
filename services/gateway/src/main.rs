use anyhow::Context;
use book_gateway::cache::MemoryRateCache;
use book_gateway::config::GatewayConfig;
use book_gateway::router::create_router;
use book_gateway::spawn_cache_sweeper;
use book_gateway::state::AppState;
use persistence::{BookStore, JournalConfig, JournaledStore, MemoryStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    tracing::info!(?config, "Starting book gateway");

    let store: Arc<dyn BookStore> = match &config.store_dir {
        Some(dir) => {
            let journal = JournalConfig::new(dir.clone());
            let store = tokio::task::spawn_blocking(move || JournaledStore::open(journal))
                .await?
                .with_context(|| format!("opening store in {}", dir.display()))?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("STORE_DIR not set, books are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let cache = Arc::new(MemoryRateCache::new());
    spawn_cache_sweeper(cache.clone(), config.cache_sweep_interval);

    let state = AppState::from_config(&config, store, cache)?;
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
