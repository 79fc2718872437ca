//! Query fan-out across all enabled pharmacy sources
//!
//! The aggregator is the one entry point callers use: a free-text query goes
//! in, a merged list of [`ResultRecord`](crate::record::ResultRecord)s or a
//! [`SearchError`] comes out. Per-source failures never reach the caller.

mod coordinator;

pub use coordinator::Aggregator;

use thiserror::Error;

/// Why a search could not be attempted
///
/// An empty result list is not an error; see [`no_results_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The query was blank; nothing was fetched
    #[error("Please enter a medicine name to search.")]
    EmptyQuery,

    /// No source could be queried at all
    #[error("Price search is unavailable right now: no pharmacy sources could be loaded ({reason}).")]
    CatalogUnavailable { reason: String },
}

/// User-facing text for a search that ran but found nothing
///
/// # Examples
///
/// ```
/// use medprice::no_results_message;
///
/// assert!(no_results_message("dolo").contains("'dolo'"));
/// ```
pub fn no_results_message(query: &str) -> String {
    format!(
        "No results found for '{}' at any pharmacy. Check the spelling or try a different name.",
        query.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_distinct() {
        let blank = SearchError::EmptyQuery.to_string();
        let unavailable = SearchError::CatalogUnavailable {
            reason: "catalog is empty".to_string(),
        }
        .to_string();
        let nothing = no_results_message("dolo");

        assert_eq!(blank, "Please enter a medicine name to search.");
        assert!(unavailable.contains("catalog is empty"));
        assert_ne!(unavailable, nothing);
        assert_ne!(blank, nothing);
    }
}
