//! Text handling for scraped listings
//!
//! - Price text normalization
//! - Fuzzy relevance matching against the search term

mod matcher;
mod price;

pub use matcher::{min_match_length, rank, relevance, score, MatchScore, MatchSettings, Named};
pub use price::{normalize_price, parse_price_value};
