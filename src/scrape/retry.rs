//! Per-source retry controller
//!
//! Drives fetch → extract → match → link resolution for one source. Only
//! fetch failures are retried; a page that parses to zero candidates is a
//! final answer.
//!
//! | Condition                  | Action                                   |
//! |----------------------------|------------------------------------------|
//! | Timeout / non-2xx / connect | Retry up to `max_retries`, linear backoff |
//! | Retries exhausted          | Empty result, never an error to callers  |
//! | Zero candidates            | Empty result, no retry                   |

use crate::catalog::SourceConfig;
use crate::config::{Config, EngineConfig};
use crate::record::ResultRecord;
use crate::scrape::fetcher::{FetchError, Fetcher};
use crate::scrape::scrape_page;
use crate::text::MatchSettings;
use std::time::Duration;

/// How many times and how patiently a source is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,

    /// Retry N waits N units before starting
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_unit: config.backoff_unit(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.backoff_unit * retry
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Runs the scrape pipeline for one source with bounded retries
#[derive(Debug, Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    settings: MatchSettings,
    pairing_tolerance: usize,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RetryController {
    pub fn new(policy: RetryPolicy, settings: MatchSettings, pairing_tolerance: usize) -> Self {
        Self {
            policy,
            settings,
            pairing_tolerance,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RetryPolicy::from(&config.engine),
            MatchSettings::from(&config.matching),
            config.matching.pairing_tolerance,
        )
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs the pipeline, absorbing exhausted retries into an empty result
    pub async fn run(
        &self,
        source: &SourceConfig,
        query: &str,
        fetcher: &dyn Fetcher,
    ) -> Vec<ResultRecord> {
        self.run_with_outcome(source, query, fetcher)
            .await
            .unwrap_or_default()
    }

    /// Runs the pipeline, reporting the last fetch error if every attempt failed
    pub async fn run_with_outcome(
        &self,
        source: &SourceConfig,
        query: &str,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<ResultRecord>, FetchError> {
        let url = source.search_url(query);
        let mut retry = 0;

        loop {
            match fetcher.fetch(&url).await {
                Ok(body) => {
                    let records =
                        scrape_page(&body, source, query, &self.settings, self.pairing_tolerance);
                    tracing::debug!(
                        source = %source.id,
                        attempt = retry + 1,
                        records = records.len(),
                        "Source page scraped"
                    );
                    return Ok(records);
                }
                Err(error) if retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_before(retry);
                    tracing::warn!(
                        source = %source.id,
                        attempt = retry,
                        kind = error.kind(),
                        "Fetch failed: {}; retrying in {:?}",
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    tracing::warn!(
                        source = %source.id,
                        attempts = retry + 1,
                        kind = error.kind(),
                        "Giving up on source: {}",
                        error
                    );
                    return Err(error);
                }
            }
        }
    }
}
