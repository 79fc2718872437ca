use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for medprice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Fetching, retry, caching and deadline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the JSON source catalog
    #[serde(rename = "catalog-path")]
    pub catalog_path: PathBuf,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Additional attempts after the first failed fetch
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff unit; attempt N+1 waits N units (milliseconds)
    #[serde(rename = "backoff-unit-ms")]
    pub backoff_unit_ms: u64,

    /// Lifetime of a cached per-source result (seconds)
    #[serde(rename = "cache-ttl-secs")]
    pub cache_ttl_secs: u64,

    /// Overall deadline for one search (seconds)
    #[serde(rename = "search-deadline-secs")]
    pub search_deadline_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("pharmacies.json"),
            request_timeout_secs: 15,
            max_retries: 2,
            backoff_unit_ms: 1000,
            cache_ttl_secs: 3 * 60 * 60,
            search_deadline_secs: 60,
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn search_deadline(&self) -> Duration {
        Duration::from_secs(self.search_deadline_secs)
    }
}

/// Relevance filtering and extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Candidates scoring at or above this are rejected (0 = perfect match)
    pub threshold: f64,

    /// Fraction of the query that must be matched, floored at 2 characters
    #[serde(rename = "min-match-ratio")]
    pub min_match_ratio: f64,

    /// Per-source cap on returned records
    #[serde(rename = "max-results-per-source")]
    pub max_results_per_source: usize,

    /// Allowed name/price count difference before positional pairing is disabled
    #[serde(rename = "pairing-tolerance")]
    pub pairing_tolerance: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            min_match_ratio: 0.5,
            max_results_per_source: 5,
            pairing_tolerance: 2,
        }
    }
}
