//! Aggregator coordinator - concurrent per-source search orchestration
//!
//! For each search this module:
//! - Validates the query and the catalog
//! - Spawns one task per enabled source (cache lookup, then the retry
//!   controller on a miss, then a cache write)
//! - Joins every task, or stops waiting at the search deadline
//! - Merges results in catalog order

use crate::aggregator::SearchError;
use crate::cache::ResultCache;
use crate::catalog::{SourceCatalog, SourceConfig};
use crate::config::Config;
use crate::record::ResultRecord;
use crate::scrape::{Fetcher, HttpFetcher, RetryController};
use crate::MedpriceError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Main search coordinator
///
/// Cheap to share behind an `Arc`; all state lives in the catalog (read-only)
/// and the cache (internally synchronized).
pub struct Aggregator {
    catalog: Arc<SourceCatalog>,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<ResultCache>,
    controller: Arc<RetryController>,
    deadline: Duration,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.catalog.len())
            .field("cached", &self.cache.len())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Aggregator {
    /// Creates an aggregator over an already loaded catalog
    ///
    /// # Arguments
    ///
    /// * `catalog` - The pharmacy sources
    /// * `fetcher` - Single-attempt page fetcher
    /// * `config` - Retry, matching, cache and deadline settings
    pub fn new(catalog: SourceCatalog, fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            catalog: Arc::new(catalog),
            fetcher,
            cache: Arc::new(ResultCache::new(config.engine.cache_ttl())),
            controller: Arc::new(RetryController::from_config(config)),
            deadline: config.engine.search_deadline(),
        }
    }

    /// Creates a production aggregator: loads the catalog named in `config`
    /// and fetches over HTTP
    ///
    /// A missing or malformed catalog does not fail here; searches will report
    /// [`SearchError::CatalogUnavailable`] instead.
    pub fn from_config(config: &Config) -> Result<Self, MedpriceError> {
        let catalog = SourceCatalog::load(&config.engine.catalog_path);
        let fetcher = HttpFetcher::new(config.engine.request_timeout())?;
        Ok(Self::new(catalog, Arc::new(fetcher), config))
    }

    /// Replaces the result cache (for a shared cache or a test clock)
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Searches every enabled source for `query`
    ///
    /// # Returns
    ///
    /// * `Ok(records)` - Merged results; possibly empty, meaning nothing matched
    /// * `Err(SearchError::EmptyQuery)` - Blank query, no network activity
    /// * `Err(SearchError::CatalogUnavailable)` - No source could be queried
    ///
    /// # Example
    ///
    /// ```no_run
    /// use medprice::config::Config;
    /// use medprice::Aggregator;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let aggregator = Aggregator::from_config(&Config::default())?;
    /// for record in aggregator.search("paracetamol").await? {
    ///     println!("{}: {} ({})", record.source_id, record.drug_name, record.price);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, query: &str) -> Result<Vec<ResultRecord>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let sources: Vec<Arc<SourceConfig>> = self.catalog.enabled_sources().cloned().collect();
        if sources.is_empty() {
            return Err(SearchError::CatalogUnavailable {
                reason: self.unavailable_reason(),
            });
        }

        tracing::info!(query, sources = sources.len(), "Starting search");

        let (tx, mut rx) = mpsc::channel(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let tx = tx.clone();
            let source = Arc::clone(source);
            let fetcher = Arc::clone(&self.fetcher);
            let cache = Arc::clone(&self.cache);
            let controller = Arc::clone(&self.controller);
            let query = query.to_string();

            tokio::spawn(async move {
                let records =
                    search_source(&source, &query, fetcher.as_ref(), &cache, &controller).await;
                // The receiver is gone if the search deadline already passed
                let _ = tx.send((index, records)).await;
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Vec<ResultRecord>>> = vec![None; sources.len()];
        let mut completed = 0;
        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        while completed < sources.len() {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((index, records)) => {
                        slots[index] = Some(records);
                        completed += 1;
                    }
                    // Every sender dropped: remaining tasks panicked
                    None => break,
                },
                _ = &mut deadline => {
                    let pending: Vec<&str> = sources
                        .iter()
                        .zip(&slots)
                        .filter(|(_, slot)| slot.is_none())
                        .map(|(source, _)| source.id.as_str())
                        .collect();
                    tracing::warn!(
                        query,
                        ?pending,
                        "Search deadline of {:?} reached; returning partial results",
                        self.deadline
                    );
                    break;
                }
            }
        }

        let records: Vec<ResultRecord> = slots.into_iter().flatten().flatten().collect();
        tracing::info!(
            query,
            completed,
            records = records.len(),
            "Search finished"
        );

        Ok(records)
    }

    fn unavailable_reason(&self) -> String {
        if let Some(error) = self.catalog.load_error() {
            error.to_string()
        } else if self.catalog.is_empty() {
            "the source catalog is empty".to_string()
        } else {
            format!("all {} sources are disabled", self.catalog.len())
        }
    }
}

/// One source's unit of work: cache, then scrape on a miss, then cache write
///
/// Failures are cached as empty results so a broken source is not retried
/// on every request until the entry expires.
async fn search_source(
    source: &SourceConfig,
    query: &str,
    fetcher: &dyn Fetcher,
    cache: &ResultCache,
    controller: &RetryController,
) -> Vec<ResultRecord> {
    if let Some(cached) = cache.get(&source.id, query) {
        tracing::debug!(source = %source.id, records = cached.len(), "Cache hit");
        return cached;
    }

    let records = match controller.run_with_outcome(source, query, fetcher).await {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(
                source = %source.id,
                "Source unavailable, caching empty result: {}",
                error
            );
            Vec::new()
        }
    };

    cache.put(&source.id, query, records.clone());
    records
}
