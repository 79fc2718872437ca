use crate::CatalogError;
use scraper::Selector;
use serde::Deserialize;
use url::Url;

/// Placeholder substituted with the encoded query in a source URL template
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// One catalog entry as it appears in the JSON file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    /// Search URL containing the `{query}` placeholder
    pub url_template: String,

    /// Class name (or CSS selector) of the element holding the product name
    pub name_class: String,

    /// Class name (or CSS selector) of the element holding the price
    pub price_class: String,

    /// CSS selector locating the product link
    #[serde(default)]
    pub link_selector: Option<String>,

    /// Base URL relative product links resolve against
    #[serde(default)]
    pub link_base_url: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A validated pharmacy source with compiled selectors
///
/// Immutable once built; the catalog hands these out behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub id: String,
    pub url_template: String,
    pub name_selector: Selector,
    pub price_selector: Selector,
    pub link_selector: Option<Selector>,
    pub link_base_url: Option<Url>,
    pub enabled: bool,
}

impl SourceConfig {
    /// Builds an enabled source from CSS selectors
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidEntry` if the template lacks the query
    /// placeholder or does not form an HTTP(S) URL, or if a selector fails to
    /// parse.
    pub fn new(
        id: &str,
        url_template: &str,
        name_selector: &str,
        price_selector: &str,
    ) -> Result<Self, CatalogError> {
        validate_url_template(id, url_template)?;

        Ok(Self {
            id: id.to_string(),
            url_template: url_template.to_string(),
            name_selector: compile_selector(id, "name", name_selector)?,
            price_selector: compile_selector(id, "price", price_selector)?,
            link_selector: None,
            link_base_url: None,
            enabled: true,
        })
    }

    /// Builds a source from its JSON catalog entry
    pub fn from_entry(id: &str, entry: &SourceEntry) -> Result<Self, CatalogError> {
        let mut source = Self::new(
            id,
            &entry.url_template,
            &class_selector(&entry.name_class),
            &class_selector(&entry.price_class),
        )?;

        if let Some(link) = entry.link_selector.as_deref().filter(|s| !s.trim().is_empty()) {
            source = source.with_link_selector(link)?;
        }
        if let Some(base) = entry.link_base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            source = source.with_link_base_url(base)?;
        }
        source.enabled = entry.enabled;

        Ok(source)
    }

    pub fn with_link_selector(mut self, selector: &str) -> Result<Self, CatalogError> {
        self.link_selector = Some(compile_selector(&self.id, "link", selector)?);
        Ok(self)
    }

    pub fn with_link_base_url(mut self, base: &str) -> Result<Self, CatalogError> {
        let url = Url::parse(base.trim()).map_err(|e| CatalogError::InvalidEntry {
            id: self.id.clone(),
            reason: format!("invalid linkBaseUrl '{}': {}", base, e),
        })?;
        self.link_base_url = Some(url);
        Ok(self)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Substitutes the percent-encoded query into the URL template
    ///
    /// # Examples
    ///
    /// ```
    /// use medprice::catalog::SourceConfig;
    ///
    /// let source = SourceConfig::new(
    ///     "demo",
    ///     "https://pharmacy.example/search?q={query}",
    ///     ".name",
    ///     ".price",
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     source.search_url("dolo 650"),
    ///     "https://pharmacy.example/search?q=dolo%20650"
    /// );
    /// ```
    pub fn search_url(&self, query: &str) -> String {
        self.url_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query.trim()))
    }
}

/// Turns a catalog `nameClass`/`priceClass` value into a CSS selector
///
/// Bare class names (one or more, whitespace separated) become a compound
/// class selector; anything else is taken as a selector already.
pub fn class_selector(value: &str) -> String {
    let trimmed = value.trim();
    let is_bare_class_list = !trimmed.is_empty()
        && trimmed.split_whitespace().all(|class| {
            class
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        });

    if is_bare_class_list {
        trimmed
            .split_whitespace()
            .map(|class| format!(".{}", class))
            .collect()
    } else {
        trimmed.to_string()
    }
}

fn compile_selector(id: &str, field: &str, css: &str) -> Result<Selector, CatalogError> {
    Selector::parse(css).map_err(|e| CatalogError::InvalidEntry {
        id: id.to_string(),
        reason: format!("invalid {} selector '{}': {:?}", field, css, e),
    })
}

fn validate_url_template(id: &str, template: &str) -> Result<(), CatalogError> {
    if !template.contains(QUERY_PLACEHOLDER) {
        return Err(CatalogError::InvalidEntry {
            id: id.to_string(),
            reason: format!("urlTemplate must contain {}", QUERY_PLACEHOLDER),
        });
    }

    let sample = template.replace(QUERY_PLACEHOLDER, "probe");
    let url = Url::parse(&sample).map_err(|e| CatalogError::InvalidEntry {
        id: id.to_string(),
        reason: format!("invalid urlTemplate '{}': {}", template, e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CatalogError::InvalidEntry {
            id: id.to_string(),
            reason: format!("urlTemplate must use http or https, got {}", url.scheme()),
        });
    }

    Ok(())
}
