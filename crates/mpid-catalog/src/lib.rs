pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use normalize::extract_first_product;
pub use types::{CatalogProduct, GatheredBody, ProductSearchRequest};
