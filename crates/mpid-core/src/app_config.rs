use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::brands::BrandCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Catalog API credentials for one brand (`{CODE}_KEY` / `{CODE}_TOK`).
#[derive(Clone, PartialEq, Eq)]
pub struct BrandCredentials {
    pub api_key: String,
    pub service_token: String,
}

impl std::fmt::Debug for BrandCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandCredentials")
            .field("api_key", &"[redacted]")
            .field("service_token", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory of pages served behind the personalization middleware.
    pub site_dir: PathBuf,
    /// YAML brand table; the built-in table is used when unset.
    pub brands_path: Option<PathBuf>,
    /// Catalog endpoint path appended to the storefront origin.
    pub catalog_endpoint: String,
    /// Replaces the storefront origin for catalog calls only.
    pub catalog_origin: Option<String>,
    pub catalog_timeout_secs: Option<u64>,
    pub credentials: BTreeMap<BrandCode, BrandCredentials>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("site_dir", &self.site_dir)
            .field("brands_path", &self.brands_path)
            .field("catalog_endpoint", &self.catalog_endpoint)
            .field("catalog_origin", &self.catalog_origin)
            .field("catalog_timeout_secs", &self.catalog_timeout_secs)
            .field(
                "credentials",
                &self.credentials.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
