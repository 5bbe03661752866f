//! Reduction of a catalog search response to a single [`ProductRecord`].

use mpid_core::ProductRecord;

use crate::error::CatalogError;
use crate::types::{CatalogProduct, GatheredBody, ImageSize};

/// Slot of the default-image list holding the widget's renditions.
const IMAGE_ENTRY_INDEX: usize = 1;
/// Rendition the widget displays; a contract with the CDN's size ordering.
const IMAGE_SIZE_INDEX: usize = 3;

/// Builds a record from the first product of a gathered response.
///
/// Returns `Ok(None)` when the `products` list is empty.
///
/// # Errors
///
/// - [`CatalogError::MissingProducts`] if the body is not JSON or has no
///   `products` array.
/// - [`CatalogError::Deserialize`] if the first product lacks `label` or
///   `permalink`.
/// - [`CatalogError::ImageSizeMissing`] if `product_images.default[1]` or its
///   `sizes[3]` is absent.
pub fn extract_first_product(
    body: &GatheredBody,
    product_id: i64,
    source_url: &str,
) -> Result<Option<ProductRecord>, CatalogError> {
    let products = match body {
        GatheredBody::Json(value) => value.get("products").and_then(serde_json::Value::as_array),
        GatheredBody::Text(_) | GatheredBody::Unreadable => None,
    }
    .ok_or_else(|| CatalogError::MissingProducts {
        url: source_url.to_string(),
    })?;

    let Some(first) = products.first() else {
        return Ok(None);
    };

    let product: CatalogProduct =
        serde_json::from_value(first.clone()).map_err(|e| CatalogError::Deserialize {
            context: format!("first product from {source_url}"),
            source: e,
        })?;

    let ImageSize { url, width, height } = display_image(&product)?.clone();

    Ok(Some(ProductRecord {
        id: product_id,
        label: product.label,
        permalink: product.permalink,
        image_url: url,
        image_width: width,
        image_height: height,
    }))
}

fn display_image(product: &CatalogProduct) -> Result<&ImageSize, CatalogError> {
    let entry = product
        .product_images
        .default
        .get(IMAGE_ENTRY_INDEX)
        .and_then(Option::as_ref)
        .ok_or(CatalogError::ImageSizeMissing {
            path: "product_images.default[1]",
        })?;

    entry
        .sizes
        .get(IMAGE_SIZE_INDEX)
        .and_then(Option::as_ref)
        .ok_or(CatalogError::ImageSizeMissing {
            path: "product_images.default[1].sizes[3]",
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const URL: &str = "https://www.justfab.com/api/products";

    fn product_json() -> serde_json::Value {
        json!({
            "products": [{
                "label": "Dress",
                "permalink": "dress-1",
                "product_images": {
                    "default": [null, {
                        "sizes": [null, null, null, {
                            "url": "http://img/x-2_a.jpg",
                            "width": 100,
                            "height": 120
                        }]
                    }]
                }
            }]
        })
    }

    #[test]
    fn extracts_first_product_fields() {
        let record = extract_first_product(&GatheredBody::Json(product_json()), 123_456, URL)
            .expect("valid body")
            .expect("one product");

        assert_eq!(record.id, 123_456);
        assert_eq!(record.label, "Dress");
        assert_eq!(record.permalink, "dress-1");
        assert_eq!(record.image_url, "http://img/x-2_a.jpg");
        assert_eq!(record.image_width, 100);
        assert_eq!(record.image_height, 120);
    }

    #[test]
    fn empty_products_yields_none() {
        let body = GatheredBody::Json(json!({ "products": [] }));
        assert!(extract_first_product(&body, 1, URL).unwrap().is_none());
    }

    #[test]
    fn missing_products_key_is_an_error() {
        let body = GatheredBody::Json(json!({ "items": [] }));
        let err = extract_first_product(&body, 1, URL).unwrap_err();
        assert!(matches!(err, CatalogError::MissingProducts { .. }));
    }

    #[test]
    fn text_and_unreadable_bodies_are_errors() {
        for body in [
            GatheredBody::Text("<html>maintenance</html>".to_string()),
            GatheredBody::Unreadable,
        ] {
            let err = extract_first_product(&body, 1, URL).unwrap_err();
            assert!(
                matches!(err, CatalogError::MissingProducts { ref url } if url == URL),
                "expected MissingProducts, got: {err:?}"
            );
        }
    }

    #[test]
    fn short_sizes_array_is_an_error() {
        let mut value = product_json();
        value["products"][0]["product_images"]["default"][1]["sizes"] = json!([null, null]);
        let err = extract_first_product(&GatheredBody::Json(value), 1, URL).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ImageSizeMissing {
                path: "product_images.default[1].sizes[3]"
            }
        ));
    }

    #[test]
    fn missing_second_default_image_is_an_error() {
        let mut value = product_json();
        value["products"][0]["product_images"]["default"] = json!([{ "sizes": [] }]);
        let err = extract_first_product(&GatheredBody::Json(value), 1, URL).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ImageSizeMissing {
                path: "product_images.default[1]"
            }
        ));
    }

    #[test]
    fn product_without_label_fails_to_deserialize() {
        let body = GatheredBody::Json(json!({ "products": [{ "permalink": "p" }] }));
        let err = extract_first_product(&body, 1, URL).unwrap_err();
        assert!(matches!(err, CatalogError::Deserialize { .. }));
    }
}
