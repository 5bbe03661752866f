use std::collections::BTreeMap;

use crate::app_config::{AppConfig, BrandCredentials, Environment};
use crate::brands::BrandCode;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_optional_u64 = |var: &str| -> Result<Option<u64>, ConfigError> {
        optional(var)
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    };

    let env = parse_environment(&or_default("MPID_ENV", "development"))?;
    let bind_addr = parse_addr("MPID_BIND_ADDR", "0.0.0.0:8788")?;
    let log_level = or_default("MPID_LOG_LEVEL", "info");
    let site_dir = PathBuf::from(or_default("MPID_SITE_DIR", "./public"));
    let brands_path = optional("MPID_BRANDS_PATH").map(PathBuf::from);

    let catalog_endpoint = require("ENDPOINT")?;
    if !catalog_endpoint.starts_with('/') {
        return Err(ConfigError::InvalidEnvVar {
            var: "ENDPOINT".to_string(),
            reason: format!("endpoint path must start with '/', got '{catalog_endpoint}'"),
        });
    }
    let catalog_origin = optional("MPID_CATALOG_ORIGIN")
        .map(|origin| origin.trim_end_matches('/').to_string());
    let catalog_timeout_secs = parse_optional_u64("MPID_CATALOG_TIMEOUT_SECS")?;

    let mut credentials = BTreeMap::new();
    for code in BrandCode::ALL {
        let api_key = optional(&format!("{code}_KEY"));
        let service_token = optional(&format!("{code}_TOK"));
        if let (Some(api_key), Some(service_token)) = (api_key, service_token) {
            credentials.insert(
                code,
                BrandCredentials {
                    api_key,
                    service_token,
                },
            );
        }
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        site_dir,
        brands_path,
        catalog_endpoint,
        catalog_origin,
        catalog_timeout_secs,
        credentials,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MPID_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
