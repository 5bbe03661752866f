use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use mpid_catalog::CatalogClient;
use mpid_core::{AppConfig, BrandCode, BrandCredentials, BrandTable};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{personalize, request_id};

/// Shared, read-only state for the personalization middleware.
#[derive(Clone)]
pub struct AppState {
    pub brands: Arc<BrandTable>,
    pub catalog: Arc<CatalogClient>,
    pub credentials: Arc<BTreeMap<BrandCode, BrandCredentials>>,
}

impl AppState {
    /// Builds state from configuration: loads the brand table (YAML file or
    /// built-in) and a catalog client sharing it.
    ///
    /// # Errors
    ///
    /// Fails if the brands file cannot be loaded or the HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let brands = Arc::new(match &config.brands_path {
            Some(path) => mpid_core::load_brands(path)?,
            None => BrandTable::builtin(),
        });

        let mut catalog = CatalogClient::new(
            Arc::clone(&brands),
            &config.catalog_endpoint,
            config.catalog_timeout_secs,
        )?;
        if let Some(origin) = &config.catalog_origin {
            tracing::warn!(origin = %origin, "catalog calls are routed to an origin override");
            catalog = catalog.with_origin_override(origin);
        }

        for code in BrandCode::ALL {
            if brands.get(code).is_some() && !config.credentials.contains_key(&code) {
                tracing::warn!(brand = %code, "no catalog credentials; personalized requests will fail");
            }
        }

        Ok(Self {
            brands,
            catalog: Arc::new(catalog),
            credentials: Arc::new(config.credentials.clone()),
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

/// Wraps `site` (the pages being served) in the personalization middleware
/// and adds the health route, which bypasses it.
pub fn build_app(state: AppState, site: Router) -> Router {
    let personalized = site.layer(axum::middleware::from_fn_with_state(state, personalize));

    Router::new()
        .route("/health", get(health))
        .merge(personalized)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id)),
        )
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
