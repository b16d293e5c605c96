//! Exchange-rate quotes
//!
//! A quote is identified by (currency, date). The rate-service URL derived
//! from that pair doubles as the cache key, so [`RateQuoteKey::lookup_url`]
//! is the only place that URL is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// (currency, date) pair a quote is requested for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateQuoteKey {
    pub currency: String,
    pub date: NaiveDate,
}

impl RateQuoteKey {
    pub fn new(currency: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            currency: currency.into(),
            date,
        }
    }

    /// Fully-qualified lookup URL: `{base}/{currency}/{YYYY-MM-DD}/`
    pub fn lookup_url(&self, base: &str) -> String {
        format!(
            "{}/{}/{}/",
            base.trim_end_matches('/'),
            self.currency,
            self.date.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for RateQuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.currency, self.date.format("%Y-%m-%d"))
    }
}

/// Mid rate and the number of the table it was published in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub rate: f64,
    pub table_no: String,
}

impl RateQuote {
    pub fn new(rate: f64, table_no: impl Into<String>) -> Self {
        Self {
            rate,
            table_no: table_no.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NBP: &str = "http://api.nbp.pl/api/exchangerates/rates/A";

    #[test]
    fn test_lookup_url_format() {
        let key = RateQuoteKey::new("USD", NaiveDate::from_ymd_opt(1965, 8, 1).unwrap());
        assert_eq!(
            key.lookup_url(NBP),
            "http://api.nbp.pl/api/exchangerates/rates/A/USD/1965-08-01/"
        );
    }

    #[test]
    fn test_lookup_url_ignores_trailing_slash_on_base() {
        let key = RateQuoteKey::new("EUR", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(key.lookup_url(NBP), key.lookup_url(&format!("{}/", NBP)));
    }

    #[test]
    fn test_quote_serializes_table_no() {
        let quote = RateQuote::new(4.0, "001/A/NBP/2024");
        let json = serde_json::to_string(&quote).unwrap();
        assert_eq!(json, r#"{"rate":4.0,"tableNo":"001/A/NBP/2024"}"#);
    }
}
