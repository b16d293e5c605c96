//! Durable author and book records
//!
//! A book starts as a [`BookDraft`] built by the gateway and becomes a
//! [`BookRecord`] once the store has assigned it an id. The PLN price of a
//! record is computed during that step and cannot be set independently.

use crate::ids::{AuthorId, BookId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Author, identified by exact full name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRecord {
    pub id: AuthorId,
    pub full_name: String,
}

impl AuthorRecord {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: AuthorId::new(),
            full_name: full_name.into(),
        }
    }
}

/// Book waiting to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub author_id: AuthorId,
    pub title: String,
    pub currency: String,
    pub price: f64,
    pub publish_date: NaiveDate,
    /// Shared by every draft of one inbound request
    pub query_date: DateTime<Utc>,
    pub rate: f64,
    pub table_no: String,
}

impl BookDraft {
    pub fn price_pln(&self) -> f64 {
        self.rate * self.price
    }
}

/// Persisted book
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    pub author: AuthorRecord,
    pub title: String,
    pub currency: String,
    pub price: f64,
    pub publish_date: NaiveDate,
    pub query_date: DateTime<Utc>,
    pub rate: f64,
    pub table_no: String,
    #[serde(rename = "pricePLN")]
    price_pln: f64,
}

impl BookRecord {
    /// Materialize a draft under `id`.
    ///
    /// `author` must be the record `draft.author_id` refers to.
    pub fn from_draft(id: BookId, author: AuthorRecord, draft: BookDraft) -> Self {
        debug_assert_eq!(author.id, draft.author_id);
        let price_pln = draft.price_pln();
        Self {
            id,
            author,
            title: draft.title,
            currency: draft.currency,
            price: draft.price,
            publish_date: draft.publish_date,
            query_date: draft.query_date,
            rate: draft.rate,
            table_no: draft.table_no,
            price_pln,
        }
    }

    pub fn price_pln(&self) -> f64 {
        self.price_pln
    }

    /// Check derived price invariant: price_pln = rate * price
    pub fn check_invariant(&self) -> bool {
        self.price_pln == self.rate * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn draft(author: &AuthorRecord, price: f64, rate: f64) -> BookDraft {
        BookDraft {
            author_id: author.id,
            title: "Dune".to_string(),
            currency: "USD".to_string(),
            price,
            publish_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            query_date: Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            rate,
            table_no: "001/A/NBP/2024".to_string(),
        }
    }

    #[test]
    fn test_record_computes_price_pln() {
        let author = AuthorRecord::new("Frank Herbert");
        let record = BookRecord::from_draft(BookId::new(), author.clone(), draft(&author, 9.99, 4.0));
        assert_eq!(record.price_pln(), 39.96);
        assert!(record.check_invariant());
    }

    #[test]
    fn test_record_json_shape() {
        let author = AuthorRecord::new("Frank Herbert");
        let record = BookRecord::from_draft(BookId::new(), author.clone(), draft(&author, 9.99, 4.0));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["author"]["fullName"], "Frank Herbert");
        assert_eq!(json["publishDate"], "1965-08-01");
        assert_eq!(json["tableNo"], "001/A/NBP/2024");
        assert_eq!(json["pricePLN"], 39.96);
    }

    proptest! {
        #[test]
        fn prop_record_invariant_holds(
            price in 0f64..10_000.0,
            rate in 0.0001f64..100.0,
        ) {
            let author = AuthorRecord::new("A");
            let record = BookRecord::from_draft(BookId::new(), author.clone(), draft(&author, price, rate));
            prop_assert!(record.check_invariant());
        }
    }
}
