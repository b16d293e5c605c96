//! Durable store: in-memory tables rebuilt from the journal on open
//!
//! Recovery process:
//! 1. Read every journal entry in `dir` (checksums, gapless sequences)
//! 2. Decode each entry into a [`StoreChange`] and apply it to empty tables
//! 3. Cut off a torn final entry, reopen the writer at the next sequence
//!
//! Afterwards every change is journaled before it is applied, under one
//! lock, so journal order equals apply order.

use crate::change::StoreChange;
use crate::journal::{JournalConfig, JournalWriter};
use crate::reader::read_journal;
use crate::store::{assign_ids, BookStore, StoreError, Tables};
use chrono::Utc;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};
use types::record::{AuthorRecord, BookDraft, BookRecord};

struct Inner {
    tables: Tables,
    writer: JournalWriter,
}

impl Inner {
    fn commit(&mut self, change: &StoreChange) -> Result<(), StoreError> {
        self.writer
            .write_change(Utc::now().timestamp_millis(), change.kind(), change.encode()?)?;
        Ok(())
    }
}

pub struct JournaledStore {
    inner: Mutex<Inner>,
}

impl JournaledStore {
    pub fn open(config: JournalConfig) -> Result<Self, StoreError> {
        let started = Instant::now();
        let replay = read_journal(&config.dir)?;

        let mut tables = Tables::default();
        for entry in &replay.entries {
            match StoreChange::decode(&entry.kind, &entry.payload)? {
                StoreChange::AuthorCreated(author) => tables.insert_author(author),
                StoreChange::BooksInserted(books) => {
                    let records = tables.prepare_books(books)?;
                    tables.insert_books(&records);
                }
            }
        }

        replay.repair_tail()?;
        let writer = JournalWriter::open(config, replay.next_sequence())?;
        info!(
            entries = replay.entries.len(),
            authors = tables.authors().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Store recovered from journal"
        );

        Ok(Self {
            inner: Mutex::new(Inner { tables, writer }),
        })
    }
}

impl BookStore for JournaledStore {
    fn get_or_create_author(&self, full_name: &str) -> Result<AuthorRecord, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;

        if let Some(author) = inner.tables.find_author(full_name) {
            return Ok(author);
        }
        let author = AuthorRecord::new(full_name);
        inner.commit(&StoreChange::AuthorCreated(author.clone()))?;
        inner.tables.insert_author(author.clone());
        debug!(author_id = %author.id, full_name, "Author created");
        Ok(author)
    }

    fn bulk_insert(&self, drafts: Vec<BookDraft>) -> Result<Vec<BookRecord>, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;

        let books = assign_ids(drafts);
        let records = inner.tables.prepare_books(books.clone())?;
        inner.commit(&StoreChange::BooksInserted(books))?;
        inner.tables.insert_books(&records);
        info!(count = records.len(), "Books inserted");
        Ok(records)
    }

    fn list_books(&self) -> Result<Vec<BookRecord>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.tables.books_newest_first())
    }

    fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.tables.authors())
    }
}
