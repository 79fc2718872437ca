//! Pharmacy source catalog
//!
//! The catalog is a JSON object mapping each source id to its search URL
//! template and markup selectors. It is loaded once at startup and never
//! mutated. Loading fails soft: a missing or malformed file yields an empty
//! catalog with the failure recorded, and individually invalid entries are
//! skipped.
//!
//! ```json
//! {
//!   "apollo": {
//!     "urlTemplate": "https://www.apollopharmacy.in/search-medicines/{query}",
//!     "nameClass": "ProductCard_productName",
//!     "priceClass": "ProductCard_priceGroup",
//!     "linkSelector": "a.ProductCard_proDesMain",
//!     "linkBaseUrl": "https://www.apollopharmacy.in",
//!     "enabled": true
//!   }
//! }
//! ```

mod types;

pub use types::{class_selector, SourceConfig, SourceEntry, QUERY_PLACEHOLDER};

use crate::config::content_hash;
use crate::CatalogError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// The loaded set of pharmacy sources, keyed by id
#[derive(Debug, Default)]
pub struct SourceCatalog {
    sources: BTreeMap<String, Arc<SourceConfig>>,
    load_error: Option<CatalogError>,
    rejected: Vec<CatalogError>,
    hash: Option<String>,
}

impl SourceCatalog {
    /// Loads the catalog from a JSON file
    ///
    /// Never fails: read and parse errors produce an empty catalog and are
    /// available from [`SourceCatalog::load_error`].
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let catalog = Self::from_json_str(&content);
                tracing::info!(
                    "Loaded {} pharmacy sources from {} (hash: {})",
                    catalog.len(),
                    path.display(),
                    catalog.content_hash().unwrap_or("-")
                );
                catalog
            }
            Err(e) => {
                tracing::error!("Failed to read catalog {}: {}", path.display(), e);
                Self::failed(CatalogError::Io(e))
            }
        }
    }

    /// Parses a catalog from JSON content, failing soft like [`SourceCatalog::load`]
    pub fn from_json_str(content: &str) -> Self {
        let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to parse catalog JSON: {}", e);
                return Self::failed(CatalogError::Parse(e));
            }
        };

        let mut catalog = Self {
            hash: Some(content_hash(content.as_bytes())),
            ..Self::default()
        };

        for (id, value) in entries {
            let built = serde_json::from_value::<SourceEntry>(value)
                .map_err(|e| CatalogError::InvalidEntry {
                    id: id.clone(),
                    reason: e.to_string(),
                })
                .and_then(|entry| SourceConfig::from_entry(&id, &entry));

            match built {
                Ok(source) => {
                    catalog.sources.insert(id, Arc::new(source));
                }
                Err(e) => {
                    tracing::warn!("Skipping catalog entry: {}", e);
                    catalog.rejected.push(e);
                }
            }
        }

        catalog
    }

    /// Builds a catalog directly from already validated sources
    pub fn from_sources(sources: impl IntoIterator<Item = SourceConfig>) -> Self {
        Self {
            sources: sources
                .into_iter()
                .map(|source| (source.id.clone(), Arc::new(source)))
                .collect(),
            ..Self::default()
        }
    }

    fn failed(error: CatalogError) -> Self {
        Self {
            load_error: Some(error),
            ..Self::default()
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<SourceConfig>> {
        self.sources.get(id)
    }

    /// All sources, enabled or not, in id order
    pub fn sources(&self) -> impl Iterator<Item = &Arc<SourceConfig>> {
        self.sources.values()
    }

    /// Enabled sources in id order
    pub fn enabled_sources(&self) -> impl Iterator<Item = &Arc<SourceConfig>> {
        self.sources.values().filter(|source| source.enabled)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The error that emptied the catalog, if the file could not be used at all
    pub fn load_error(&self) -> Option<&CatalogError> {
        self.load_error.as_ref()
    }

    /// Entries skipped because they failed validation
    pub fn rejected(&self) -> &[CatalogError] {
        &self.rejected
    }

    /// SHA-256 of the catalog content, when it was parsed from text
    pub fn content_hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }
}
