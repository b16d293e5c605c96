//! Journaled store changes

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use types::ids::BookId;
use types::record::{AuthorRecord, BookDraft};

pub const AUTHOR_CREATED: &str = "AuthorCreated";
pub const BOOKS_INSERTED: &str = "BooksInserted";

/// One change to the store, encoded as a journal payload.
///
/// Books are journaled as drafts: their PLN price is recomputed on replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreChange {
    AuthorCreated(AuthorRecord),
    BooksInserted(Vec<(BookId, BookDraft)>),
}

impl StoreChange {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreChange::AuthorCreated(_) => AUTHOR_CREATED,
            StoreChange::BooksInserted(_) => BOOKS_INSERTED,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Encoding(e.to_string()))
    }

    /// Decode a payload, checking it matches the entry's recorded kind.
    pub fn decode(kind: &str, payload: &[u8]) -> Result<Self, StoreError> {
        let change: StoreChange =
            bincode::deserialize(payload).map_err(|e| StoreError::Encoding(e.to_string()))?;
        if change.kind() != kind {
            return Err(StoreError::Encoding(format!(
                "entry kind {} does not match payload {}",
                kind,
                change.kind()
            )));
        }
        Ok(change)
    }
}
