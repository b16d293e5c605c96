//! Author/book store interface and in-memory implementation
//!
//! The store offers exactly what the enrichment service needs from a
//! relational database: get-or-create of authors by exact name, an
//! all-or-nothing bulk insert of books, and listings.

use crate::journal::JournalError;
use crate::reader::ReaderError;
use crate::validate::{validate_draft, ValidationError};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info};
use types::ids::{AuthorId, BookId};
use types::record::{AuthorRecord, BookDraft, BookRecord};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown author: {0}")]
    UnknownAuthor(AuthorId),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReaderError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

// ── Store Trait ─────────────────────────────────────────────────────

pub trait BookStore: Send + Sync {
    /// Author with exactly this name, created and committed if absent.
    fn get_or_create_author(&self, full_name: &str) -> Result<AuthorRecord, StoreError>;

    /// Insert every draft or none of them.
    ///
    /// All drafts are validated and their authors resolved before anything
    /// is written.
    fn bulk_insert(&self, drafts: Vec<BookDraft>) -> Result<Vec<BookRecord>, StoreError>;

    /// Books ordered by query date, newest first. Books sharing a query date
    /// keep their insertion order.
    fn list_books(&self) -> Result<Vec<BookRecord>, StoreError>;

    /// Authors in creation order.
    fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError>;
}

// ── Tables ──────────────────────────────────────────────────────────

/// Store contents, shared by the memory and journaled stores.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    authors: Vec<AuthorRecord>,
    author_index: HashMap<AuthorId, usize>,
    name_index: HashMap<String, AuthorId>,
    books: Vec<BookRecord>,
}

impl Tables {
    pub(crate) fn find_author(&self, full_name: &str) -> Option<AuthorRecord> {
        let id = self.name_index.get(full_name)?;
        self.author(id)
    }

    fn author(&self, id: &AuthorId) -> Option<AuthorRecord> {
        self.author_index.get(id).map(|&i| self.authors[i].clone())
    }

    pub(crate) fn insert_author(&mut self, author: AuthorRecord) {
        self.author_index.insert(author.id, self.authors.len());
        self.name_index.insert(author.full_name.clone(), author.id);
        self.authors.push(author);
    }

    /// Validate `drafts` and turn them into records without inserting them.
    pub(crate) fn prepare_books(
        &self,
        drafts: Vec<(BookId, BookDraft)>,
    ) -> Result<Vec<BookRecord>, StoreError> {
        drafts
            .into_iter()
            .map(|(id, draft)| {
                validate_draft(&draft)?;
                let author = self
                    .author(&draft.author_id)
                    .ok_or(StoreError::UnknownAuthor(draft.author_id))?;
                Ok(BookRecord::from_draft(id, author, draft))
            })
            .collect()
    }

    pub(crate) fn insert_books(&mut self, records: &[BookRecord]) {
        self.books.extend_from_slice(records);
    }

    pub(crate) fn books_newest_first(&self) -> Vec<BookRecord> {
        let mut books = self.books.clone();
        books.sort_by(|a, b| b.query_date.cmp(&a.query_date));
        books
    }

    pub(crate) fn authors(&self) -> Vec<AuthorRecord> {
        self.authors.clone()
    }
}

pub(crate) fn assign_ids(drafts: Vec<BookDraft>) -> Vec<(BookId, BookDraft)> {
    drafts.into_iter().map(|d| (BookId::new(), d)).collect()
}

// ── Memory Store ────────────────────────────────────────────────────

/// Volatile store, contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookStore for MemoryStore {
    fn get_or_create_author(&self, full_name: &str) -> Result<AuthorRecord, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;

        if let Some(author) = tables.find_author(full_name) {
            return Ok(author);
        }
        let author = AuthorRecord::new(full_name);
        debug!(author_id = %author.id, full_name, "Author created");
        tables.insert_author(author.clone());
        Ok(author)
    }

    fn bulk_insert(&self, drafts: Vec<BookDraft>) -> Result<Vec<BookRecord>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let records = tables.prepare_books(assign_ids(drafts))?;
        tables.insert_books(&records);
        info!(count = records.len(), "Books inserted");
        Ok(records)
    }

    fn list_books(&self) -> Result<Vec<BookRecord>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.books_newest_first())
    }

    fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.authors())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
