//! E-book catalog match
//!
//! The first result of a catalog search, reduced to the fields the service
//! needs. `release_date` is already normalized to a calendar date.

use crate::errors::DateError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// First e-book matching a search term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMatch {
    pub artist_name: String,
    pub track_name: String,
    /// ISO 4217 code, e.g. "USD"
    pub currency: String,
    pub price: f64,
    pub release_date: NaiveDate,
}

/// Normalize an ISO-8601 release timestamp to a plain date.
///
/// Accepts RFC 3339 timestamps (`1965-08-01T00:00:00Z`, `...+02:00`), naive
/// timestamps and plain dates. The date is taken in the timestamp's own
/// offset, it is not shifted to UTC.
pub fn normalize_release_date(raw: &str) -> Result<NaiveDate, DateError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = raw.parse::<NaiveDateTime>() {
        return Ok(ts.date());
    }
    raw.parse::<NaiveDate>().map_err(|_| DateError::Unrecognised {
        value: raw.to_string(),
    })
}
