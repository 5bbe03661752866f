use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("ENDPOINT", "/api/products/search");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MPID_ENV"));
}

#[test]
fn build_app_config_fails_without_endpoint() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "ENDPOINT"),
        "expected MissingEnvVar(ENDPOINT), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_relative_endpoint() {
    let mut map = full_env();
    map.insert("ENDPOINT", "api/products");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ENDPOINT"),
        "expected InvalidEnvVar(ENDPOINT), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("MPID_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MPID_BIND_ADDR"),
        "expected InvalidEnvVar(MPID_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("valid config");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8788");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.site_dir, std::path::PathBuf::from("./public"));
    assert!(cfg.brands_path.is_none());
    assert_eq!(cfg.catalog_endpoint, "/api/products/search");
    assert!(cfg.catalog_origin.is_none());
    assert!(cfg.catalog_timeout_secs.is_none());
    assert!(cfg.credentials.is_empty());
}

#[test]
fn build_app_config_reads_brand_credentials_pairs() {
    let mut map = full_env();
    map.insert("JF_KEY", "jf-key");
    map.insert("JF_TOK", "jf-token");
    map.insert("FL_KEY", "fl-key-without-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.credentials.len(), 1);
    let jf = &cfg.credentials[&BrandCode::Jf];
    assert_eq!(jf.api_key, "jf-key");
    assert_eq!(jf.service_token, "jf-token");
    assert!(!cfg.credentials.contains_key(&BrandCode::Fl));
}

#[test]
fn build_app_config_trims_catalog_origin() {
    let mut map = full_env();
    map.insert("MPID_CATALOG_ORIGIN", "http://127.0.0.1:9000/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.catalog_origin.as_deref(), Some("http://127.0.0.1:9000"));
}

#[test]
fn build_app_config_catalog_timeout_override() {
    let mut map = full_env();
    map.insert("MPID_CATALOG_TIMEOUT_SECS", "15");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.catalog_timeout_secs, Some(15));
}

#[test]
fn build_app_config_catalog_timeout_invalid() {
    let mut map = full_env();
    map.insert("MPID_CATALOG_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MPID_CATALOG_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MPID_CATALOG_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_credentials() {
    let mut map = full_env();
    map.insert("SX_KEY", "super-secret-key");
    map.insert("SX_TOK", "super-secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?} {:?}", cfg.credentials[&BrandCode::Sx]);
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("Sx"));
}
