//! The normalized record returned to callers

use serde::{Deserialize, Serialize};

/// Price shown when a listing has no usable price text
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// Placeholder image service used for every record
const IMAGE_PLACEHOLDER_BASE: &str = "https://placehold.co/150x150";

/// One product listing from one pharmacy
///
/// `price` is always a string: either the normalized display price or
/// [`PRICE_UNAVAILABLE`]. `drug_name` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Catalog id of the pharmacy this record came from
    pub source_id: String,

    /// Listing name as shown on the pharmacy page
    pub drug_name: String,

    /// Normalized price
    pub price: String,

    /// Absolute product URL, when one could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Placeholder image derived from the name
    pub image_url: String,
}

impl ResultRecord {
    pub fn new(source_id: &str, drug_name: &str, price: String, link: Option<String>) -> Self {
        Self {
            source_id: source_id.to_string(),
            drug_name: drug_name.to_string(),
            price,
            link,
            image_url: placeholder_image_url(drug_name),
        }
    }

    /// Returns true if the pharmacy page offered a price for this listing
    pub fn has_price(&self) -> bool {
        self.price != PRICE_UNAVAILABLE
    }
}

/// Derives the placeholder image URL for a listing name
///
/// # Examples
///
/// ```
/// use medprice::record::placeholder_image_url;
///
/// assert_eq!(
///     placeholder_image_url("Dolo 650"),
///     "https://placehold.co/150x150?text=Dolo%20650"
/// );
/// ```
pub fn placeholder_image_url(name: &str) -> String {
    format!(
        "{}?text={}",
        IMAGE_PLACEHOLDER_BASE,
        urlencoding::encode(name.trim())
    )
}
