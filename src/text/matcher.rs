//! Fuzzy relevance matching of listing names against the search term
//!
//! Scores are normalized edit distances in `[0, 1]` where 0 is a perfect
//! match. The distance is taken against the best-matching substring of the
//! listing name, so "dolo" scores well against "Dolo 650 Tablet 15's".

use crate::config::MatchingConfig;

/// Thresholds applied when filtering candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    /// Accept only scores strictly below this
    pub threshold: f64,

    /// Fraction of the query that must be matched (floored at 2 characters)
    pub min_match_ratio: f64,

    /// Maximum accepted candidates returned
    pub max_results: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from(&MatchingConfig::default())
    }
}

impl From<&MatchingConfig> for MatchSettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.threshold,
            min_match_ratio: config.min_match_ratio,
            max_results: config.max_results_per_source,
        }
    }
}

/// Anything carrying a name the matcher can score
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

impl Named for &str {
    fn name(&self) -> &str {
        self
    }
}

/// Result of scoring one name against a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Normalized distance, 0 for a perfect match
    pub score: f64,

    /// Query characters covered by the best match
    pub matched_chars: usize,
}

/// Scores `text` against `query`
///
/// Case-insensitive containment of the query is a perfect match. Otherwise
/// the score is the edit distance between the query and the best-matching
/// substring of the text, divided by the query length.
///
/// # Examples
///
/// ```
/// use medprice::text::score;
///
/// assert_eq!(score("paracetamol", "Paracetamol 500mg").score, 0.0);
/// assert!(score("paracetmol", "Paracetamol 500mg").score < 0.4);
/// assert!(score("paracetamol", "Ibuprofen 200mg").score > 0.4);
/// ```
pub fn score(query: &str, text: &str) -> MatchScore {
    let query = fold(query);
    let text = fold(text);
    let query_len = query.len();

    if query_len == 0 || text.is_empty() {
        return MatchScore {
            score: 1.0,
            matched_chars: 0,
        };
    }

    if contains(&text, &query) {
        return MatchScore {
            score: 0.0,
            matched_chars: query_len,
        };
    }

    let distance = substring_distance(&query, &text).min(query_len);
    MatchScore {
        score: distance as f64 / query_len as f64,
        matched_chars: query_len - distance,
    }
}

/// Smallest Levenshtein distance between `query` and any substring of `text`
///
/// Sellers' variant of the edit-distance table: the match may start and end
/// anywhere in `text`, so the first row is all zeros and the answer is the
/// minimum of the last row. O(query × text) time, O(text) space.
fn substring_distance(query: &[char], text: &[char]) -> usize {
    let mut prev = vec![0usize; text.len() + 1];
    let mut row = vec![0usize; text.len() + 1];

    for (i, &q) in query.iter().enumerate() {
        row[0] = i + 1;
        for (j, &t) in text.iter().enumerate() {
            let substitute = prev[j] + usize::from(q != t);
            row[j + 1] = substitute.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev.into_iter().min().unwrap_or(query.len())
}

/// Minimum number of matched characters for a query of `query_len` characters
///
/// # Examples
///
/// ```
/// use medprice::text::min_match_length;
///
/// assert_eq!(min_match_length(11, 0.5), 5);
/// assert_eq!(min_match_length(3, 0.5), 2);
/// ```
pub fn min_match_length(query_len: usize, ratio: f64) -> usize {
    ((query_len as f64 * ratio).floor() as usize).max(2)
}

/// Scores a name, returning the score only if it passes both filters
pub fn relevance(query: &str, text: &str, settings: &MatchSettings) -> Option<f64> {
    let query_len = fold(query).len();
    let result = score(query, text);

    let close_enough = result.score < settings.threshold;
    let long_enough = result.matched_chars >= min_match_length(query_len, settings.min_match_ratio);

    (close_enough && long_enough).then_some(result.score)
}

/// Filters candidates by relevance and orders them best first
///
/// Ties keep their input order. At most `settings.max_results` are returned.
pub fn rank<T: Named>(candidates: Vec<T>, query: &str, settings: &MatchSettings) -> Vec<T> {
    let mut accepted: Vec<(f64, T)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            relevance(query, candidate.name(), settings).map(|score| (score, candidate))
        })
        .collect();

    accepted.sort_by(|a, b| a.0.total_cmp(&b.0));
    accepted.truncate(settings.max_results);

    accepted.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Lowercases and collapses whitespace
fn fold(text: &str) -> Vec<char> {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.to_lowercase().chars().collect()
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
