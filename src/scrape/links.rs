use crate::catalog::{SourceConfig, QUERY_PLACEHOLDER};
use crate::scrape::extractor::RawCandidate;
use scraper::{ElementRef, Selector};
use url::Url;

/// Resolves the product URL for a candidate
///
/// # Resolution Chain
///
/// First usable link wins; an href that cannot be turned into an HTTP(S)
/// URL (`#`, `javascript:`, `mailto:` and the like) is skipped and the search
/// moves on to the next element, then to the next step:
///
/// 1. If the source has a `link_selector`: ancestors-or-self of the name
///    element matching it (nearest first), then matches inside the name
///    element, then matches inside the product card (the widest ancestor
///    still holding only this one name)
/// 2. The ancestor-or-self `<a>` elements, nearest first. This includes the
///    immediate parent, so a parent anchor needs no separate step
///
/// A matched element that is not itself a link contributes the `a[href]`
/// elements inside it. Relative hrefs are resolved against the source's
/// `link_base_url`, or the origin of its URL template when none is set.
///
/// # Returns
///
/// * `Some(String)` - Absolute product URL
/// * `None` - No usable link; the record is still returned, just without one
pub fn resolve_link(candidate: &RawCandidate<'_>, source: &SourceConfig) -> Option<String> {
    let element = candidate.element;
    let base = base_url(source);
    let base = base.as_ref();

    let from_selector = source.link_selector.as_ref().and_then(|selector| {
        ancestors_or_self(element)
            .filter(|node| selector.matches(node))
            .find_map(|matched| element_link(matched, base))
            .or_else(|| {
                element
                    .select(selector)
                    .find_map(|matched| element_link(matched, base))
            })
            .or_else(|| card_link(element, selector, &source.name_selector, base))
    });

    from_selector.or_else(|| {
        ancestors_or_self(element)
            .filter(|node| node.value().name() == "a")
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| absolutize(href, base))
    })
}

/// Base for relative links: the configured base, else the search page origin
fn base_url(source: &SourceConfig) -> Option<Url> {
    source.link_base_url.clone().or_else(|| {
        let sample = source.url_template.replace(QUERY_PLACEHOLDER, "q");
        Url::parse(&sample).ok()?.join("/").ok()
    })
}

fn ancestors_or_self<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::once(element).chain(element.ancestors().filter_map(ElementRef::wrap))
}

/// First usable `selector` match inside the ancestors that contain no other name
fn card_link(
    element: ElementRef<'_>,
    selector: &Selector,
    name_selector: &Selector,
    base: Option<&Url>,
) -> Option<String> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|container| container.select(name_selector).take(2).count() <= 1)
        .find_map(|container| {
            container
                .select(selector)
                .find_map(|matched| element_link(matched, base))
        })
}

/// The element's own `href`, or that of the first usable link inside it
fn element_link(element: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    if let Some(url) = element
        .value()
        .attr("href")
        .and_then(|href| absolutize(href, base))
    {
        return Some(url);
    }

    let anchor = Selector::parse("a[href]").ok()?;
    element
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| absolutize(href, base))
}

/// Turns an href into an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Relative links with no base to resolve against
fn absolutize(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok()?,
        Err(_) => return None,
    };

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}
