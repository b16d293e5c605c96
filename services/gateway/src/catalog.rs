//! E-book catalog client (iTunes Search API)

use crate::error::{LookupError, Service};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use types::catalog::{CatalogMatch, normalize_release_date};

pub const DEFAULT_CATALOG_URL: &str = "https://itunes.apple.com/search";

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// First e-book matching an already URL-encoded search term
    async fn search(&self, term: &str) -> Result<CatalogMatch, LookupError>;
}

pub struct ItunesCatalog {
    http_client: Client,
    base_url: String,
}

impl ItunesCatalog {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn search_url(&self, term: &str) -> String {
        format!("{}?term={}&entity=ebook&limit=1", self.base_url, term)
    }
}

#[async_trait]
impl CatalogApi for ItunesCatalog {
    async fn search(&self, term: &str) -> Result<CatalogMatch, LookupError> {
        let url = self.search_url(term);
        debug!(url = %url, "Querying catalog");

        let res = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable {
                service: Service::Catalog,
                detail: e.to_string(),
            })?;

        let status = res.status().as_u16();
        if status != 200 {
            return Err(LookupError::Upstream {
                service: Service::Catalog,
                status,
            });
        }

        let body = res.text().await.map_err(|e| LookupError::Unavailable {
            service: Service::Catalog,
            detail: e.to_string(),
        })?;
        parse_search(&body)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Option<Vec<SearchResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    artist_name: Option<String>,
    track_name: Option<String>,
    currency: Option<String>,
    price: Option<f64>,
    release_date: Option<String>,
}

fn missing(field: &str) -> LookupError {
    LookupError::CatalogParse(format!("first result has no {}", field))
}

/// Extract the first match from a search response body.
pub fn parse_search(body: &str) -> Result<CatalogMatch, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::CatalogParse(e.to_string()))?;

    let first = response
        .results
        .ok_or_else(|| LookupError::CatalogParse("no results array".into()))?
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::CatalogParse("empty results".into()))?;

    let currency = first.currency.ok_or_else(|| missing("currency"))?;
    let price = first.price.ok_or_else(|| missing("price"))?;
    let artist_name = first.artist_name.ok_or_else(|| missing("artistName"))?;
    let track_name = first.track_name.ok_or_else(|| missing("trackName"))?;
    let raw_date = first.release_date.ok_or_else(|| missing("releaseDate"))?;
    let release_date = normalize_release_date(&raw_date)
        .map_err(|e| LookupError::CatalogParse(e.to_string()))?;

    Ok(CatalogMatch {
        artist_name,
        track_name,
        currency,
        price,
        release_date,
    })
}
