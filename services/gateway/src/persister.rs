//! Batch persistence of enriched rows
//!
//! Authors are committed as soon as a row is staged. Book drafts are held
//! until [`BatchPersister::commit`], which writes them in one bulk insert.
//! A batch aborted before commit therefore leaves its authors behind but
//! never a book.

use crate::error::{AppError, Stage};
use chrono::{DateTime, Utc};
use persistence::validate::validate_draft;
use persistence::{BookStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info};
use types::entry::EnrichedEntry;
use types::record::{BookDraft, BookRecord};
use types::row::Row;

/// Run a store call on the blocking pool.
pub async fn with_store<T, F>(store: &Arc<dyn BookStore>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&dyn BookStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("store task failed")))?;
    Ok(result?)
}

pub struct BatchPersister {
    store: Arc<dyn BookStore>,
    query_date: DateTime<Utc>,
    drafts: Vec<BookDraft>,
}

impl BatchPersister {
    pub fn new(store: Arc<dyn BookStore>, query_date: DateTime<Utc>) -> Self {
        Self {
            store,
            query_date,
            drafts: Vec::new(),
        }
    }

    pub fn query_date(&self) -> DateTime<Utc> {
        self.query_date
    }

    pub fn staged(&self) -> usize {
        self.drafts.len()
    }

    /// Resolve the entry's author and stage its book draft.
    pub async fn stage(&mut self, row: &Row, entry: &EnrichedEntry) -> Result<(), AppError> {
        let name = entry.catalog.artist_name.clone();
        let author = match with_store(&self.store, move |s| s.get_or_create_author(&name)).await {
            Ok(author) => author,
            Err(AppError::Store(source)) => {
                return Err(AppError::RowStore {
                    row: row.clone(),
                    stage: Stage::StageRecord,
                    source,
                });
            }
            Err(e) => return Err(e),
        };

        let draft = BookDraft {
            author_id: author.id,
            title: entry.catalog.track_name.clone(),
            currency: entry.catalog.currency.clone(),
            price: entry.catalog.price,
            publish_date: entry.catalog.release_date,
            query_date: self.query_date,
            rate: entry.quote.rate,
            table_no: entry.quote.table_no.clone(),
        };
        validate_draft(&draft).map_err(|source| AppError::Validation {
            row: row.clone(),
            source,
        })?;

        debug!(author_id = %author.id, title = %draft.title, "Book staged");
        self.drafts.push(draft);
        Ok(())
    }

    /// Insert every staged draft at once.
    pub async fn commit(self) -> Result<Vec<BookRecord>, AppError> {
        if self.drafts.is_empty() {
            return Ok(Vec::new());
        }
        let drafts = self.drafts;
        let records = match with_store(&self.store, move |s| s.bulk_insert(drafts)).await {
            Ok(records) => records,
            Err(AppError::Store(source)) => return Err(AppError::Commit(source)),
            Err(e) => return Err(e),
        };
        info!(count = records.len(), query_date = %self.query_date, "Batch committed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use persistence::MemoryStore;
    use serde_json::json;
    use types::catalog::CatalogMatch;
    use types::rate::RateQuote;
    use types::record::AuthorRecord;

    fn entry(artist: &str, title: &str, rate: f64) -> EnrichedEntry {
        EnrichedEntry::new(
            CatalogMatch {
                artist_name: artist.to_string(),
                track_name: title.to_string(),
                currency: "USD".to_string(),
                price: 9.99,
                release_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            },
            RateQuote::new(rate, "001/A/NBP/2024"),
        )
    }

    fn row() -> Row {
        Row::new(json!(["Dune", "Herbert"]))
    }

    #[tokio::test]
    async fn test_books_wait_for_commit() {
        let store: Arc<dyn BookStore> = Arc::new(MemoryStore::new());
        let mut persister = BatchPersister::new(store.clone(), Utc::now());

        persister.stage(&row(), &entry("Frank Herbert", "Dune", 4.0)).await.unwrap();
        persister.stage(&row(), &entry("Frank Herbert", "Dune Messiah", 4.0)).await.unwrap();

        assert_eq!(persister.staged(), 2);
        assert_eq!(store.list_authors().unwrap().len(), 1);
        assert!(store.list_books().unwrap().is_empty());

        let records = persister.commit().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.check_invariant()));
        assert_eq!(store.list_books().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_records_share_query_date() {
        let store: Arc<dyn BookStore> = Arc::new(MemoryStore::new());
        let mut persister = BatchPersister::new(store, Utc::now());
        let query_date = persister.query_date();

        persister.stage(&row(), &entry("A", "One", 4.0)).await.unwrap();
        persister.stage(&row(), &entry("B", "Two", 4.0)).await.unwrap();

        let records = persister.commit().await.unwrap();
        assert!(records.iter().all(|r| r.query_date == query_date));
    }

    #[tokio::test]
    async fn test_invalid_draft_names_row() {
        let store: Arc<dyn BookStore> = Arc::new(MemoryStore::new());
        let mut persister = BatchPersister::new(store, Utc::now());

        let err = persister
            .stage(&row(), &entry("Frank Herbert", "Dune", f64::INFINITY))
            .await
            .unwrap_err();
        match err {
            AppError::Validation { row: failed, source } => {
                assert_eq!(failed, row());
                assert_eq!(source.field, "rate");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(persister.staged(), 0);
    }

    /// Store failing every bulk insert, and author creation unless `authors_ok`
    struct BrokenStore {
        inner: MemoryStore,
        authors_ok: bool,
    }

    impl BookStore for BrokenStore {
        fn get_or_create_author(&self, full_name: &str) -> Result<AuthorRecord, StoreError> {
            if self.authors_ok {
                self.inner.get_or_create_author(full_name)
            } else {
                Err(StoreError::Poisoned)
            }
        }

        fn bulk_insert(&self, _drafts: Vec<BookDraft>) -> Result<Vec<BookRecord>, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn list_books(&self) -> Result<Vec<BookRecord>, StoreError> {
            self.inner.list_books()
        }

        fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError> {
            self.inner.list_authors()
        }
    }

    #[tokio::test]
    async fn test_author_store_failure_names_row() {
        let store: Arc<dyn BookStore> = Arc::new(BrokenStore {
            inner: MemoryStore::new(),
            authors_ok: false,
        });
        let mut persister = BatchPersister::new(store, Utc::now());

        let err = persister.stage(&row(), &entry("Frank Herbert", "Dune", 4.0)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::RowStore { stage: Stage::StageRecord, source: StoreError::Poisoned, .. }
        ));
        assert!(err.to_string().contains(r#"["Dune","Herbert"]"#));
    }

    #[tokio::test]
    async fn test_bulk_insert_failure_is_commit_stage() {
        let store: Arc<dyn BookStore> = Arc::new(BrokenStore {
            inner: MemoryStore::new(),
            authors_ok: true,
        });
        let mut persister = BatchPersister::new(store, Utc::now());
        persister.stage(&row(), &entry("Frank Herbert", "Dune", 4.0)).await.unwrap();

        let err = persister.commit().await.unwrap_err();

        assert!(matches!(err, AppError::Commit(StoreError::Poisoned)));
        assert_eq!(err.stage(), Some(Stage::Commit));
    }

    #[tokio::test]
    async fn test_empty_commit_is_noop() {
        let store: Arc<dyn BookStore> = Arc::new(MemoryStore::new());
        let persister = BatchPersister::new(store.clone(), Utc::now());
        assert!(persister.commit().await.unwrap().is_empty());
        assert!(store.list_books().unwrap().is_empty());
    }
}
