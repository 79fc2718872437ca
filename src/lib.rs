//! medprice: a multi-pharmacy price aggregation engine
//!
//! This crate fans a medicine name out to several pharmacy websites at once,
//! scrapes name/price/link triples from the returned HTML, ranks them by fuzzy
//! similarity to the query and returns a bounded, merged result list.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod record;
pub mod scrape;
pub mod text;

use thiserror::Error;

/// Main error type for medprice operations
#[derive(Debug, Error)]
pub enum MedpriceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine settings errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Source catalog errors
///
/// These never escape [`catalog::SourceCatalog::load`]; they are recorded on
/// the catalog so the caller can surface them.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog entry '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },
}

/// Result type alias for medprice operations
pub type Result<T> = std::result::Result<T, MedpriceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use aggregator::{no_results_message, Aggregator, SearchError};
pub use cache::ResultCache;
pub use catalog::{SourceCatalog, SourceConfig};
pub use config::Config;
pub use record::ResultRecord;
pub use scrape::{FetchError, Fetcher, HttpFetcher};
