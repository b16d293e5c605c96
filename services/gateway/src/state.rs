use crate::cache::{MemoryRateCache, RateCache};
use crate::catalog::ItunesCatalog;
use crate::config::GatewayConfig;
use crate::pipeline::Pipeline;
use crate::rates::NbpRates;
use persistence::BookStore;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub store: Arc<dyn BookStore>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        let store = Arc::clone(pipeline.store());
        Self { pipeline, store }
    }

    /// Wire the live catalog and rate clients around `store` and `cache`.
    pub fn from_config(
        config: &GatewayConfig,
        store: Arc<dyn BookStore>,
        cache: Arc<MemoryRateCache>,
    ) -> anyhow::Result<Self> {
        let http_client = Client::builder().timeout(config.http_timeout).build()?;
        let cache: Arc<dyn RateCache> = cache;

        let pipeline = Pipeline::new(
            Arc::new(ItunesCatalog::new(http_client.clone(), config.catalog_url.clone())),
            Arc::new(NbpRates::new(http_client, config.rates_url.clone())),
            cache,
            config.cache_ttl,
            store,
        );
        Ok(Self::new(pipeline))
    }
}
