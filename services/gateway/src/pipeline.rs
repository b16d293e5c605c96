//! Per-row enrichment pipeline
//!
//! Rows are handled one at a time, in input order:
//! build term, search catalog, look up the rate (cache first), assemble the
//! entry and stage it for persistence. The first failing row aborts the
//! batch; books are only inserted once every row has succeeded.

use crate::cache::RateCache;
use crate::catalog::CatalogApi;
use crate::error::{AppError, Stage};
use crate::persister::BatchPersister;
use crate::rates::RateApi;
use crate::term::build_term;
use chrono::Utc;
use persistence::BookStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use types::entry::EnrichedEntry;
use types::rate::{RateQuote, RateQuoteKey};
use types::record::BookRecord;
use types::row::Row;

/// Result of a fully successful batch
#[derive(Debug)]
pub struct BatchOutcome {
    /// One entry per input row, in input order
    pub entries: Vec<EnrichedEntry>,
    pub books: Vec<BookRecord>,
}

#[derive(Clone)]
pub struct Pipeline {
    catalog: Arc<dyn CatalogApi>,
    rates: Arc<dyn RateApi>,
    cache: Arc<dyn RateCache>,
    cache_ttl: Duration,
    store: Arc<dyn BookStore>,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        rates: Arc<dyn RateApi>,
        cache: Arc<dyn RateCache>,
        cache_ttl: Duration,
        store: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            catalog,
            rates,
            cache,
            cache_ttl,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn BookStore> {
        &self.store
    }

    pub async fn run(&self, rows: Vec<Row>) -> Result<BatchOutcome, AppError> {
        let mut persister = BatchPersister::new(Arc::clone(&self.store), Utc::now());
        let mut entries = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            debug!(row = index, content = %row, "Enriching row");
            let entry = self.enrich(&row).await?;
            persister.stage(&row, &entry).await?;
            entries.push(entry);
        }

        let books = persister.commit().await?;
        info!(rows = entries.len(), books = books.len(), "Batch enriched");
        Ok(BatchOutcome { entries, books })
    }

    async fn enrich(&self, row: &Row) -> Result<EnrichedEntry, AppError> {
        let term = build_term(row).map_err(|source| AppError::MalformedRow {
            row: row.clone(),
            source,
        })?;

        let catalog = self
            .catalog
            .search(&term)
            .await
            .map_err(|source| AppError::Lookup {
                row: row.clone(),
                stage: Stage::QueryCatalog,
                source,
            })?;

        let key = RateQuoteKey::new(catalog.currency.clone(), catalog.release_date);
        let quote = self.quote(row, &key).await?;

        Ok(EnrichedEntry::new(catalog, quote))
    }

    async fn quote(&self, row: &Row, key: &RateQuoteKey) -> Result<RateQuote, AppError> {
        let url = self.rates.lookup_url(key);
        if let Some(quote) = self.cache.get(&url).await {
            debug!(key = %key, "Rate cache hit");
            return Ok(quote);
        }

        let quote = self
            .rates
            .fetch(key)
            .await
            .map_err(|source| AppError::Lookup {
                row: row.clone(),
                stage: Stage::QueryRate,
                source,
            })?;
        self.cache.set(&url, quote.clone(), self.cache_ttl).await;
        Ok(quote)
    }
}
