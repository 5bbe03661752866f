use mpid_core::{BrandCode, CoreError};
use thiserror::Error;

/// Errors returned by the product catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The brand table could not produce a storefront origin.
    #[error(transparent)]
    BrandTable(#[from] CoreError),

    #[error("no catalog credentials configured for brand {0}")]
    MissingCredentials(BrandCode),

    #[error("product id \"{0}\" is not an integer")]
    InvalidProductId(String),

    #[error("invalid catalog URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to encode catalog request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body had no top-level `products` array.
    #[error("catalog response from {url} has no products list")]
    MissingProducts { url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The fixed image-size slot the widget renders was absent.
    #[error("catalog product has no entry at {path}")]
    ImageSizeMissing { path: &'static str },
}
