//! Types library for the e-book price enrichment service
//!
//! This library provides the data model shared by the store and the gateway:
//! identifiers, catalog and exchange-rate lookups, the enriched response entry
//! and the durable author/book records.
//!
//! # Modules
//! - `ids`: Unique identifiers (AuthorId, BookId)
//! - `row`: Inbound batch rows
//! - `catalog`: E-book catalog match
//! - `rate`: Exchange-rate quotes and their lookup keys
//! - `entry`: Per-row enriched response entry
//! - `record`: Author and book records, book drafts
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod row;
pub mod catalog;
pub mod rate;
pub mod entry;
pub mod record;
pub mod errors;
