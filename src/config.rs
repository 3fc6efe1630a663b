use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the item table artifact (JSON array of `{id, title}` records)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the similarity matrix artifact (JSON array of rows)
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix joined with `poster_path` to build poster URLs
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Timeout for a single metadata call
    #[serde(default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,

    /// Wall-clock budget for enriching one batch of recommendations
    #[serde(default = "default_enrichment_deadline_ms")]
    pub enrichment_deadline_ms: u64,

    /// Upper bound on in-flight metadata calls per request
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Number of recommendations when a request does not ask for a specific count
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// Largest count a request may ask for
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Character budget for synopsis excerpts
    #[serde(default = "default_synopsis_max_chars")]
    pub synopsis_max_chars: usize,

    /// Redis connection URL; the metadata cache is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Lifetime of cached metadata entries
    #[serde(default = "default_metadata_cache_ttl_secs")]
    pub metadata_cache_ttl_secs: u64,

    /// Upper bound on a single Redis round trip before the cache counts as a miss
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "data/catalog.json".to_string()
}

fn default_similarity_path() -> String {
    "data/similarity.json".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_metadata_timeout_ms() -> u64 {
    5000
}

fn default_enrichment_deadline_ms() -> u64 {
    8000
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_recommendations() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    25
}

fn default_synopsis_max_chars() -> usize {
    200
}

fn default_metadata_cache_ttl_secs() -> u64 {
    86400
}

fn default_cache_timeout_ms() -> u64 {
    250
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrent_fetches == 0 {
            anyhow::bail!("MAX_CONCURRENT_FETCHES must be at least 1");
        }
        if self.default_recommendations > self.max_recommendations {
            anyhow::bail!(
                "DEFAULT_RECOMMENDATIONS ({}) exceeds MAX_RECOMMENDATIONS ({})",
                self.default_recommendations,
                self.max_recommendations
            );
        }
        Ok(())
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn enrichment_deadline(&self) -> Duration {
        Duration::from_millis(self.enrichment_deadline_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_vars(vars(&[("TMDB_API_KEY", "key")])).unwrap();
        assert_eq!(config.catalog_path, "data/catalog.json");
        assert_eq!(config.default_recommendations, 5);
        assert_eq!(config.metadata_timeout(), Duration::from_secs(5));
        assert_eq!(config.port, 5000);
        assert!(config.redis_url.is_none());
        assert_eq!(config.cache_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_api_key_fails() {
        assert!(Config::from_vars(vars(&[])).is_err());
    }

    #[test]
    fn test_overrides_parsed() {
        let config = Config::from_vars(vars(&[
            ("TMDB_API_KEY", "key"),
            ("ENRICHMENT_DEADLINE_MS", "1500"),
            ("MAX_CONCURRENT_FETCHES", "3"),
            ("REDIS_URL", "redis://cache:6379"),
        ]))
        .unwrap();
        assert_eq!(config.enrichment_deadline(), Duration::from_millis(1500));
        assert_eq!(config.max_concurrent_fetches, 3);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Config::from_vars(vars(&[
            ("TMDB_API_KEY", "key"),
            ("MAX_CONCURRENT_FETCHES", "0"),
        ]));
        assert!(result.is_err());
    }
}
