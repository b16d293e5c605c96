use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use types::rate::RateQuote;

/// Exchange-rate cache keyed by the full rate lookup URL.
///
/// Best-effort: a miss only means the rate service gets asked.
#[async_trait]
pub trait RateCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<RateQuote>;
    async fn set(&self, key: &str, quote: RateQuote, ttl: Duration);
}

#[derive(Clone)]
struct CachedQuote {
    quote: RateQuote,
    expires_at: Instant,
}

impl CachedQuote {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-wide in-memory cache. Concurrent writers: last write wins.
#[derive(Default)]
pub struct MemoryRateCache {
    // Maps lookup URL e.g. ".../rates/A/USD/1965-08-01/" to quote
    entries: DashMap<String, CachedQuote>,
}

impl MemoryRateCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.is_fresh(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl RateCache for MemoryRateCache {
    async fn get(&self, key: &str) -> Option<RateQuote> {
        let now = Instant::now();
        let cached = self.entries.get(key)?.clone();
        if cached.is_fresh(now) {
            return Some(cached.quote);
        }
        // Expired: drop it unless a fresh value was written meanwhile
        self.entries.remove_if(key, |_, c| !c.is_fresh(now));
        None
    }

    async fn set(&self, key: &str, quote: RateQuote, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries
            .insert(key.to_string(), CachedQuote { quote, expires_at });
    }
}
