//! Author & Book Store
//!
//! Stores the authors and books produced by the enrichment service:
//! get-or-create of authors by exact name, validated all-or-nothing bulk
//! insert of books, and listings ordered by query date.
//!
//! Two implementations share the [`store::BookStore`] interface:
//! - [`store::MemoryStore`]: volatile, for tests and ephemeral deployments
//! - [`journaled::JournaledStore`]: rebuilt on open from an append-only,
//!   CRC32C-checksummed journal

pub mod change;
pub mod journal;
pub mod journaled;
pub mod reader;
pub mod store;
pub mod validate;

pub use journal::JournalConfig;
pub use journaled::JournaledStore;
pub use store::{BookStore, MemoryStore, StoreError};
pub use validate::ValidationError;
