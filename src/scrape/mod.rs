//! Scraping pipeline for a single pharmacy source
//!
//! This module contains the per-source logic, including:
//! - HTTP fetching with user-agent rotation
//! - Name/price candidate extraction from HTML
//! - Product link resolution
//! - Bounded retries around the whole pipeline

mod extractor;
mod fetcher;
mod links;
mod retry;

pub use extractor::{element_text, extract, RawCandidate};
pub use fetcher::{
    build_http_client, random_user_agent, FetchError, Fetcher, HttpFetcher, USER_AGENTS,
};
pub use links::resolve_link;
pub use retry::{RetryController, RetryPolicy};

use crate::catalog::SourceConfig;
use crate::record::{ResultRecord, PRICE_UNAVAILABLE};
use crate::text::{normalize_price, rank, MatchSettings};
use scraper::Html;

/// Turns one fetched page into ranked result records
///
/// Parsing is synchronous and the parsed document never leaves this
/// function, so callers can hold the result across `.await` points.
///
/// # Arguments
///
/// * `body` - Raw HTML returned by the source
/// * `source` - The source the page belongs to
/// * `query` - The user's search term
/// * `settings` - Relevance thresholds and per-source cap
/// * `pairing_tolerance` - See [`extract`]
pub fn scrape_page(
    body: &str,
    source: &SourceConfig,
    query: &str,
    settings: &MatchSettings,
    pairing_tolerance: usize,
) -> Vec<ResultRecord> {
    let document = Html::parse_document(body);

    let candidates = extract(&document, source, pairing_tolerance);
    if candidates.is_empty() {
        tracing::info!(source = %source.id, "No product names found on page");
        return Vec::new();
    }

    let total = candidates.len();
    let accepted = rank(candidates, query, settings);
    tracing::debug!(
        source = %source.id,
        candidates = total,
        accepted = accepted.len(),
        "Ranked candidates"
    );

    accepted
        .iter()
        .map(|candidate| {
            let price = candidate
                .price_text
                .as_deref()
                .map(normalize_price)
                .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string());
            let link = resolve_link(candidate, source);
            if link.is_none() {
                tracing::debug!(
                    source = %source.id,
                    name = %candidate.text,
                    "No product link found"
                );
            }
            ResultRecord::new(&source.id, &candidate.text, price, link)
        })
        .collect()
}
