//! Exchange-rate client (NBP API, table A)

use crate::error::{LookupError, Service};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use tracing::debug;
use types::rate::{RateQuote, RateQuoteKey};

pub const DEFAULT_RATES_URL: &str = "http://api.nbp.pl/api/exchangerates/rates/A";

#[async_trait]
pub trait RateApi: Send + Sync {
    /// URL a key is fetched from; also its cache key
    fn lookup_url(&self, key: &RateQuoteKey) -> String;

    async fn fetch(&self, key: &RateQuoteKey) -> Result<RateQuote, LookupError>;
}

pub struct NbpRates {
    http_client: Client,
    base_url: String,
}

impl NbpRates {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateApi for NbpRates {
    fn lookup_url(&self, key: &RateQuoteKey) -> String {
        key.lookup_url(&self.base_url)
    }

    async fn fetch(&self, key: &RateQuoteKey) -> Result<RateQuote, LookupError> {
        let url = self.lookup_url(key);
        debug!(url = %url, "Querying exchange rates");

        let res = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LookupError::Unavailable {
                service: Service::Rates,
                detail: e.to_string(),
            })?;

        let status = res.status().as_u16();
        if status != 200 {
            return Err(LookupError::Upstream {
                service: Service::Rates,
                status,
            });
        }

        let body = res.text().await.map_err(|e| LookupError::Unavailable {
            service: Service::Rates,
            detail: e.to_string(),
        })?;
        parse_rates(&body)
    }
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: Option<Vec<RateEntry>>,
}

#[derive(Deserialize)]
struct RateEntry {
    mid: Option<f64>,
    no: Option<String>,
}

/// Extract the first rate of a rate-table response body.
pub fn parse_rates(body: &str) -> Result<RateQuote, LookupError> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| LookupError::RateParse(e.to_string()))?;

    let first = response
        .rates
        .ok_or_else(|| LookupError::RateParse("no rates array".into()))?
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::RateParse("empty rates".into()))?;

    let rate = first
        .mid
        .ok_or_else(|| LookupError::RateParse("first rate has no mid".into()))?;
    let table_no = first
        .no
        .ok_or_else(|| LookupError::RateParse("first rate has no table number".into()))?;

    Ok(RateQuote { rate, table_no })
}
