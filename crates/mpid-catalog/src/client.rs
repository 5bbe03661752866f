//! HTTP client for the storefront product-search API.
//!
//! Each brand/locale storefront serves the same search endpoint from its own
//! origin (`https://www.{brand}{suffix}`), partitioned by the
//! `x-tfg-storeGroupId` header. One lookup is one POST; nothing is retried or
//! cached.

use std::sync::Arc;
use std::time::Duration;

use mpid_core::params::leading_integer;
use mpid_core::{BrandCode, BrandCredentials, BrandTable, ProductRecord};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};

use crate::error::CatalogError;
use crate::normalize::extract_first_product;
use crate::types::{GatheredBody, ProductSearchRequest};

const REQUEST_CONTENT_TYPE: &str = "application/json;charset=UTF-8";
const API_KEY_HEADER: &str = "x-api-key";
const SERVICE_TOKEN_HEADER: &str = "x-service-token";
const STORE_GROUP_HEADER: &str = "x-tfg-storeGroupId";

/// Client for the product-search endpoint.
///
/// Holds the brand table it resolves storefront origins from and the
/// endpoint path shared by every storefront. Use
/// [`CatalogClient::with_origin_override`] to send requests to a mock server
/// or staging host instead of the storefront origin.
pub struct CatalogClient {
    client: Client,
    brands: Arc<BrandTable>,
    endpoint_path: String,
    origin_override: Option<String>,
}

impl CatalogClient {
    /// Creates a client for `endpoint_path` (e.g. `/api/products/search`).
    ///
    /// `timeout_secs` of `None` leaves requests without a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        brands: Arc<BrandTable>,
        endpoint_path: &str,
        timeout_secs: Option<u64>,
    ) -> Result<Self, CatalogError> {
        let mut builder = Client::builder().user_agent("mpid-edge/0.1 (catalog-lookup)");
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            brands,
            endpoint_path: endpoint_path.to_owned(),
            origin_override: None,
        })
    }

    /// Sends API calls to `origin` instead of the storefront origin.
    #[must_use]
    pub fn with_origin_override(mut self, origin: &str) -> Self {
        self.origin_override = Some(origin.trim_end_matches('/').to_owned());
        self
    }

    /// Full URL of the search endpoint for a brand's store group.
    ///
    /// The storefront origin is always resolved, even when overridden, so a
    /// store group that belongs to no locale of the brand fails the same way
    /// in tests as in production.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::BrandTable`] if the store group has no locale
    /// under `brand`, or [`CatalogError::InvalidUrl`] if the result does not
    /// parse.
    pub fn api_url(&self, brand: BrandCode, store_group_id: u32) -> Result<Url, CatalogError> {
        let site_url = self.brands.site_url(brand, store_group_id)?;
        let origin = self.origin_override.as_deref().unwrap_or(&site_url);
        let raw = format!("{origin}{}", self.endpoint_path);
        Url::parse(&raw).map_err(|e| CatalogError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Looks up one product's display data.
    ///
    /// A non-200 status is logged with the response headers and the body is
    /// still parsed. Returns `Ok(None)` when the catalog knows no such
    /// product.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MissingCredentials`] if `credentials` is `None`.
    /// - [`CatalogError::InvalidProductId`] if `product_id` has no leading
    ///   integer.
    /// - [`CatalogError::BrandTable`] / [`CatalogError::InvalidUrl`] from
    ///   [`Self::api_url`].
    /// - [`CatalogError::Http`] on network failure.
    /// - Any shape error from [`extract_first_product`].
    pub async fn fetch_product(
        &self,
        brand: BrandCode,
        store_group_id: u32,
        product_id: &str,
        credentials: Option<&BrandCredentials>,
    ) -> Result<Option<ProductRecord>, CatalogError> {
        let credentials = credentials.ok_or(CatalogError::MissingCredentials(brand))?;
        let master_product_id = leading_integer(product_id)
            .ok_or_else(|| CatalogError::InvalidProductId(product_id.to_owned()))?;
        let url = self.api_url(brand, store_group_id)?;

        let payload = serde_json::to_string(&ProductSearchRequest::single(master_product_id))
            .map_err(CatalogError::Encode)?;

        tracing::debug!(
            %brand,
            store_group_id,
            master_product_id,
            url = %url,
            "requesting catalog product"
        );

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .header(API_KEY_HEADER, &credentials.api_key)
            .header(SERVICE_TOKEN_HEADER, &credentials.service_token)
            .header(STORE_GROUP_HEADER, store_group_id.to_string())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                status = status.as_u16(),
                url = %url,
                headers = %headers_as_json(response.headers()),
                "catalog returned non-200 status; parsing body anyway"
            );
        }

        let body = gather_response(response).await;
        let record = extract_first_product(&body, master_product_id, url.as_str())?;

        if record.is_none() {
            tracing::info!(
                %brand,
                store_group_id,
                master_product_id,
                "catalog returned no products"
            );
        }

        Ok(record)
    }
}

/// Reads the body as JSON when the content type says so, as text otherwise.
///
/// Read and decode failures are logged and yield [`GatheredBody::Unreadable`].
async fn gather_response(response: reqwest::Response) -> GatheredBody {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "failed to read catalog response body");
            return GatheredBody::Unreadable;
        }
    };

    if !is_json {
        return GatheredBody::Text(text);
    }

    match serde_json::from_str(&text) {
        Ok(value) => GatheredBody::Json(value),
        Err(e) => {
            tracing::error!(error = %e, "catalog response is not valid JSON");
            GatheredBody::Unreadable
        }
    }
}

/// Pretty-printed `{name: value}` map of response headers, for diagnostics.
fn headers_as_json(headers: &HeaderMap) -> String {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                serde_json::Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    serde_json::to_string_pretty(&map).unwrap_or_default()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
