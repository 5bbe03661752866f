//! Catalog product-search request and response types.
//!
//! The search endpoint accepts a projection list (`productFields`) and only
//! returns the requested fields. We ask for three: `label`, `permalink`, and
//! the fourth size rendition of the second default image. The response keeps
//! the full array shapes, padding unrequested slots with `null`, so the
//! requested rendition sits at `product_images.default[1].sizes[3]`.

use serde::{Deserialize, Serialize};

/// Fields projected by every product lookup.
pub const PRODUCT_FIELDS: [&str; 3] = [
    "label",
    "permalink",
    "product_images.default[1].sizes[3]",
];

/// Body of `POST {origin}{endpoint}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchRequest {
    pub page: u32,
    pub size: u32,
    pub master_product_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
    pub include_out_of_stock: bool,
    pub warehouse_id: Option<i64>,
    pub product_fields: Vec<&'static str>,
}

impl ProductSearchRequest {
    /// First page, one result, the given master product, out-of-stock included.
    #[must_use]
    pub fn single(product_id: i64) -> Self {
        Self {
            page: 1,
            size: 1,
            master_product_ids: vec![product_id],
            category_ids: Vec::new(),
            include_out_of_stock: true,
            warehouse_id: None,
            product_fields: PRODUCT_FIELDS.to_vec(),
        }
    }
}

/// A response body as read off the wire.
///
/// Reading never fails: a body that cannot be read or decoded is logged and
/// becomes [`GatheredBody::Unreadable`]; shape checks happen afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum GatheredBody {
    Json(serde_json::Value),
    /// Non-JSON content type; kept verbatim.
    Text(String),
    Unreadable,
}

/// First entry of the response's `products` list.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    pub label: String,
    pub permalink: String,
    #[serde(default)]
    pub product_images: ProductImages,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductImages {
    /// Index 0 is the primary shot; index 1 carries the rendition list used
    /// by the widget.
    #[serde(default)]
    pub default: Vec<Option<ImageEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    /// Renditions in the CDN's fixed size order.
    #[serde(default)]
    pub sizes: Vec<Option<ImageSize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageSize {
    pub url: String,
    pub width: i64,
    pub height: i64,
}
