//! Markup extraction of name/price candidates
//!
//! Source pages nest prices inconsistently: sometimes inside the same card as
//! the name, sometimes as a sibling list. Each name element gets its price
//! from the first step of this chain that yields one:
//!
//! 1. The nearest ancestor-or-self of the name element containing a price
//!    match, as long as that ancestor holds no other name match
//! 2. The price match with the same ordinal index on the page
//! 3. None (reported to callers as "N/A")

use crate::catalog::SourceConfig;
use crate::text::Named;
use scraper::{ElementRef, Html};

/// A name element found on a page, with its associated price text
///
/// `element` points into the parsed document and is what link resolution
/// starts from. Candidates never outlive the document they came from.
#[derive(Debug, Clone)]
pub struct RawCandidate<'a> {
    pub text: String,
    pub price_text: Option<String>,
    pub element: ElementRef<'a>,
}

impl Named for RawCandidate<'_> {
    fn name(&self) -> &str {
        &self.text
    }
}

/// Extracts candidates from a parsed page in document order
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `source` - Source whose selectors apply
/// * `pairing_tolerance` - Largest name/price count difference at which
///   positional pairing is still trusted
pub fn extract<'a>(
    document: &'a Html,
    source: &SourceConfig,
    pairing_tolerance: usize,
) -> Vec<RawCandidate<'a>> {
    let names: Vec<ElementRef<'a>> = document.select(&source.name_selector).collect();
    let prices: Vec<ElementRef<'a>> = document.select(&source.price_selector).collect();

    let positional_pairing = names.len().abs_diff(prices.len()) <= pairing_tolerance;
    if names.len() != prices.len() {
        tracing::warn!(
            source = %source.id,
            names = names.len(),
            prices = prices.len(),
            positional_pairing,
            "Name and price counts differ"
        );
    }

    names
        .iter()
        .enumerate()
        .filter_map(|(index, &element)| {
            let text = element_text(element);
            if text.is_empty() {
                return None;
            }

            let price_text = container_price(element, source).or_else(|| {
                positional_pairing
                    .then(|| prices.get(index))
                    .flatten()
                    .map(|price| element_text(*price))
                    .filter(|price| !price.is_empty())
            });

            Some(RawCandidate {
                text,
                price_text,
                element,
            })
        })
        .collect()
}

/// Price text from the nearest ancestor-or-self card of `name`
///
/// The walk stops at the first ancestor holding more than one name match:
/// from there on every price belongs to the listing as a whole.
fn container_price(name: ElementRef<'_>, source: &SourceConfig) -> Option<String> {
    let containers = std::iter::once(name).chain(name.ancestors().filter_map(ElementRef::wrap));

    for container in containers {
        if container.select(&source.name_selector).take(2).count() > 1 {
            return None;
        }

        if let Some(price) = container.select(&source.price_selector).next() {
            let text = element_text(price);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

/// Trimmed text content with internal whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, price: &str) -> SourceConfig {
        SourceConfig::new("test", "https://pharmacy.example/search?q={query}", name, price).unwrap()
    }

    #[test]
    fn test_price_nested_in_card() {
        let html = Html::parse_document(
            r#"<div class="list">
                <div class="card"><h3 class="name">Dolo 650</h3><span class="price">₹30</span></div>
                <div class="card"><h3 class="name">Crocin 500</h3><span class="price">₹25</span></div>
            </div>"#,
        );
        let candidates = extract(&html, &source(".name", ".price"), 2);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "Dolo 650");
        assert_eq!(candidates[0].price_text.as_deref(), Some("₹30"));
        assert_eq!(candidates[1].text, "Crocin 500");
        assert_eq!(candidates[1].price_text.as_deref(), Some("₹25"));
    }

    #[test]
    fn test_card_without_price_falls_back_to_position() {
        // Second card lacks a nested price; the shared list must not donate the first one
        let html = Html::parse_document(
            r#"<ul>
                <li><a class="name">Alpha</a><b class="price">10</b></li>
                <li><a class="name">Beta</a></li>
            </ul>
            <div><b class="price">20</b></div>"#,
        );
        let candidates = extract(&html, &source(".name", ".price"), 2);

        assert_eq!(candidates[0].price_text.as_deref(), Some("10"));
        assert_eq!(candidates[1].price_text.as_deref(), Some("20"));
    }

    #[test]
    fn test_sibling_lists_pair_by_position() {
        let html = Html::parse_document(
            r#"<div>
                <p class="n">First</p><p class="n">Second</p><p class="n">Third</p>
            </div>
            <div>
                <p class="p">1.00</p><p class="p">2.00</p><p class="p">3.00</p>
            </div>"#,
        );
        let candidates = extract(&html, &source(".n", ".p"), 0);

        let prices: Vec<_> = candidates.iter().map(|c| c.price_text.clone()).collect();
        assert_eq!(
            prices,
            vec![
                Some("1.00".to_string()),
                Some("2.00".to_string()),
                Some("3.00".to_string())
            ]
        );
    }

    #[test]
    fn test_count_mismatch_beyond_tolerance_disables_pairing() {
        let html = Html::parse_document(
            r#"<div><p class="n">A</p><p class="n">B</p><p class="n">C</p><p class="n">D</p></div>
               <div><p class="p">1</p></div>"#,
        );

        let strict = extract(&html, &source(".n", ".p"), 2);
        assert_eq!(strict.len(), 4);
        assert!(strict.iter().all(|c| c.price_text.is_none()));

        let lenient = extract(&html, &source(".n", ".p"), 3);
        assert_eq!(lenient[0].price_text.as_deref(), Some("1"));
        assert!(lenient[1].price_text.is_none());
    }

    #[test]
    fn test_empty_names_dropped_but_keep_their_slot() {
        let html = Html::parse_document(
            r#"<div><p class="n">  </p><p class="n">Real</p></div>
               <div><p class="p">1</p><p class="p">2</p></div>"#,
        );
        let candidates = extract(&html, &source(".n", ".p"), 0);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Real");
        assert_eq!(candidates[0].price_text.as_deref(), Some("2"));
    }

    #[test]
    fn test_text_whitespace_collapsed() {
        let html = Html::parse_document(
            "<div class=\"c\"><span class=\"n\">\n  Vitamin   <b>C</b>\n</span><i class=\"p\"> Rs. 99 </i></div>",
        );
        let candidates = extract(&html, &source(".n", ".p"), 0);

        assert_eq!(candidates[0].text, "Vitamin C");
        assert_eq!(candidates[0].price_text.as_deref(), Some("Rs. 99"));
    }

    #[test]
    fn test_no_matches() {
        let html = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(extract(&html, &source(".n", ".p"), 2).is_empty());
    }
}
