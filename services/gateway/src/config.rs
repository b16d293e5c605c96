use crate::catalog::DEFAULT_CATALOG_URL;
use crate::rates::DEFAULT_RATES_URL;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub catalog_url: String,
    pub rates_url: String,
    pub cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
    pub http_timeout: Duration,
    /// Journal directory; `None` keeps the store in memory
    pub store_dir: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            cache_ttl: Duration::from_secs(3600),
            cache_sweep_interval: Duration::from_secs(60),
            http_timeout: Duration::from_secs(10),
            store_dir: None,
        }
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", name, raw))
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unset or empty variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("BIND_ADDR") {
            config.bind_addr = parse_var("BIND_ADDR", &raw)?;
        }
        if let Some(url) = get("CATALOG_API_URL") {
            config.catalog_url = url.trim().to_string();
        }
        if let Some(url) = get("RATES_API_URL") {
            config.rates_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("CACHE_TTL") {
            config.cache_ttl = Duration::from_secs(parse_var("CACHE_TTL", &raw)?);
        }
        if let Some(raw) = get("CACHE_SWEEP_SECS") {
            let secs: u64 = parse_var("CACHE_SWEEP_SECS", &raw)?;
            anyhow::ensure!(secs > 0, "CACHE_SWEEP_SECS must be positive");
            config.cache_sweep_interval = Duration::from_secs(secs);
        }
        if let Some(raw) = get("HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", &raw)?);
        }
        if let Some(dir) = get("STORE_DIR") {
            config.store_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.rates_url, "http://api.nbp.pl/api/exchangerates/rates/A");
        assert!(config.store_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("RATES_API_URL", "http://localhost:1234/rates/A/"),
            ("CACHE_TTL", "30"),
            ("STORE_DIR", "/var/lib/books"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.rates_url, "http://localhost:1234/rates/A");
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.store_dir, Some(PathBuf::from("/var/lib/books")));
    }

    #[test]
    fn test_blank_value_keeps_default() {
        let config = load(&[("CACHE_TTL", "  ")]).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let err = load(&[("CACHE_TTL", "an hour")]).unwrap_err();
        assert!(err.to_string().contains("CACHE_TTL"));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        assert!(load(&[("CACHE_SWEEP_SECS", "0")]).is_err());
    }
}
