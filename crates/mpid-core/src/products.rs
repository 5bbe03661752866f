use serde::{Deserialize, Serialize};

/// Display data for the single product promoted by a tracking id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Master product id sent to the catalog.
    pub id: i64,
    pub label: String,
    /// Storefront slug, linked as `{site}/products/{permalink}`.
    pub permalink: String,
    pub image_url: String,
    pub image_width: i64,
    pub image_height: i64,
}
