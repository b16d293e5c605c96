//! Per-row enriched response entry
//!
//! Invariant: `price_pln == rate * price`. The PLN price is never stored,
//! it is recomputed from the match and the quote whenever it is read or
//! serialized.

use crate::catalog::CatalogMatch;
use crate::rate::RateQuote;
use serde::ser::{Serialize, Serializer};

/// Catalog match enriched with its exchange-rate quote
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEntry {
    pub catalog: CatalogMatch,
    pub quote: RateQuote,
}

impl EnrichedEntry {
    pub fn new(catalog: CatalogMatch, quote: RateQuote) -> Self {
        Self { catalog, quote }
    }

    pub fn price_pln(&self) -> f64 {
        self.quote.rate * self.catalog.price
    }
}

#[derive(serde::Serialize)]
struct WireEntry<'a> {
    name: &'a str,
    title: &'a str,
    curr: &'a str,
    price: f64,
    date: String,
    #[serde(rename = "fromNBP")]
    from_nbp: WireQuote<'a>,
}

#[derive(serde::Serialize)]
struct WireQuote<'a> {
    rate: f64,
    #[serde(rename = "pricePLN")]
    price_pln: f64,
    #[serde(rename = "tableNo")]
    table_no: &'a str,
}

impl Serialize for EnrichedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEntry {
            name: &self.catalog.artist_name,
            title: &self.catalog.track_name,
            curr: &self.catalog.currency,
            price: self.catalog.price,
            date: self.catalog.release_date.format("%Y-%m-%d").to_string(),
            from_nbp: WireQuote {
                rate: self.quote.rate,
                price_pln: self.price_pln(),
                table_no: &self.quote.table_no,
            },
        }
        .serialize(serializer)
    }
}
