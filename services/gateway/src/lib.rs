//! Book Gateway
//!
//! HTTP service that enriches `[title, author]` rows with e-book catalog
//! data and the NBP exchange rate for the book's release date, then stores
//! the resulting authors and books.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod persister;
pub mod pipeline;
pub mod rates;
pub mod router;
pub mod state;
pub mod term;

use cache::MemoryRateCache;
use std::sync::Arc;
use std::time::Duration;

/// Periodically drop expired rate quotes.
pub fn spawn_cache_sweeper(
    cache: Arc<MemoryRateCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = cache.len(), "Expired rate quotes purged");
            }
        }
    })
}
