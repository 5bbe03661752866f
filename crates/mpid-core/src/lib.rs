pub mod app_config;
pub mod brands;
pub mod config;
pub mod context;
pub mod params;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, BrandCredentials, Environment};
pub use brands::{load_brands, BrandCode, BrandConfig, BrandTable, LocaleEntry};
pub use config::{load_app_config, load_app_config_from_env};
pub use context::RequestContext;
pub use params::{extract_parameters, ParameterOutcome, PLACEHOLDER_TOKEN};
pub use products::ProductRecord;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brand table validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("brand {0} is not in the brand table")]
    UnknownBrand(BrandCode),

    #[error("no locale of brand {brand} maps to store group {store_group_id}")]
    UnknownStoreGroup {
        brand: BrandCode,
        store_group_id: u32,
    },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidRequestUrl { url: String, reason: String },
}
