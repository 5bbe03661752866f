//! Brand and store-group resolution from the request host.
//!
//! The table is an ordered list. Both lookups are linear substring scans and
//! the first match wins, so reordering entries changes which brand or locale
//! a host resolves to.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

/// Storefront brand codes. Also the prefix of each brand's credential env vars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BrandCode {
    Jf,
    Sd,
    Fk,
    Fl,
    Sx,
}

impl BrandCode {
    pub const ALL: [BrandCode; 5] = [
        BrandCode::Jf,
        BrandCode::Sd,
        BrandCode::Fk,
        BrandCode::Fl,
        BrandCode::Sx,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BrandCode::Jf => "JF",
            BrandCode::Sd => "SD",
            BrandCode::Fk => "FK",
            BrandCode::Fl => "FL",
            BrandCode::Sx => "SX",
        }
    }
}

impl std::fmt::Display for BrandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One locale domain suffix (e.g. `".CO.UK"`) and its catalog partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleEntry {
    pub suffix: String,
    pub store_group_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub code: BrandCode,
    /// Lowercase storefront name, matched against the host and used to build
    /// `https://www.{name}{suffix}`.
    pub name: String,
    pub locales: Vec<LocaleEntry>,
}

impl BrandConfig {
    /// First locale whose lower-cased suffix appears anywhere in `host`.
    ///
    /// Only the suffix is case-folded; the host is compared as given.
    #[must_use]
    pub fn store_group_for_host(&self, host: &str) -> Option<u32> {
        self.locales
            .iter()
            .find(|locale| host.contains(&locale.suffix.to_lowercase()))
            .map(|locale| locale.store_group_id)
    }

    /// Reverse lookup: the first suffix carrying `store_group_id`.
    #[must_use]
    pub fn locale_for_store_group(&self, store_group_id: u32) -> Option<&str> {
        self.locales
            .iter()
            .find(|locale| locale.store_group_id == store_group_id)
            .map(|locale| locale.suffix.as_str())
    }
}

fn default_brand() -> BrandCode {
    BrandCode::Jf
}

fn default_store_group_id() -> u32 {
    9
}

/// Ordered brand table plus the fallbacks used when nothing matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandTable {
    #[serde(default = "default_brand")]
    pub default_brand: BrandCode,
    #[serde(default = "default_store_group_id")]
    pub default_store_group_id: u32,
    pub brands: Vec<BrandConfig>,
}

type BuiltinBrand = (BrandCode, &'static str, &'static [(&'static str, u32)]);

const BUILTIN_BRANDS: &[BuiltinBrand] = &[
    (
        BrandCode::Jf,
        "justfab",
        &[
            (".COM", 9),
            (".CA", 12),
            (".CO.UK", 11),
            (".DE", 10),
            (".FR", 14),
            (".ES", 15),
            (".NL", 19),
            (".DK", 20),
            (".SE", 21),
        ],
    ),
    (BrandCode::Sd, "shoedazzle", &[(".COM", 17), (".CA", 17)]),
    (BrandCode::Fk, "fabkids", &[(".COM", 13), (".CA", 13)]),
    (
        BrandCode::Fl,
        "fabletics",
        &[
            (".COM", 16),
            (".DE", 22),
            (".CO.UK", 23),
            (".FR", 24),
            (".ES", 25),
            (".NL", 26),
            (".SE", 27),
            (".DK", 28),
            (".CA", 29),
        ],
    ),
    (
        BrandCode::Sx,
        "savagex",
        &[
            (".COM", 34),
            (".FR", 35),
            (".DE", 36),
            (".ES", 38),
            (".CO.UK", 39),
            (".EU", 42),
        ],
    ),
];

impl Default for BrandTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BrandTable {
    /// The production brand table.
    #[must_use]
    pub fn builtin() -> Self {
        let brands = BUILTIN_BRANDS
            .iter()
            .map(|(code, name, locales)| BrandConfig {
                code: *code,
                name: (*name).to_string(),
                locales: locales
                    .iter()
                    .map(|(suffix, store_group_id)| LocaleEntry {
                        suffix: (*suffix).to_string(),
                        store_group_id: *store_group_id,
                    })
                    .collect(),
            })
            .collect();

        Self {
            default_brand: default_brand(),
            default_store_group_id: default_store_group_id(),
            brands,
        }
    }

    #[must_use]
    pub fn get(&self, code: BrandCode) -> Option<&BrandConfig> {
        self.brands.iter().find(|brand| brand.code == code)
    }

    /// First brand whose name is a substring of `host`, else the default brand.
    #[must_use]
    pub fn resolve_brand(&self, host: &str) -> BrandCode {
        self.brands
            .iter()
            .find(|brand| host.contains(brand.name.as_str()))
            .map_or(self.default_brand, |brand| brand.code)
    }

    /// Store group of the first matching locale of `brand`, else the default
    /// store group.
    ///
    /// The default is not checked against the brand's locales: a host with no
    /// matching suffix on a brand that lacks the default id resolves to an id
    /// that [`Self::site_url`] later rejects.
    #[must_use]
    pub fn resolve_store_group_id(&self, host: &str, brand: BrandCode) -> u32 {
        self.get(brand)
            .and_then(|config| config.store_group_for_host(host))
            .unwrap_or(self.default_store_group_id)
    }

    /// Canonical storefront origin for a brand and store group, e.g.
    /// `https://www.justfab.co.uk`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownBrand`] if `brand` is not in the table and
    /// [`CoreError::UnknownStoreGroup`] if none of its locales carries
    /// `store_group_id`.
    pub fn site_url(&self, brand: BrandCode, store_group_id: u32) -> Result<String, CoreError> {
        let config = self.get(brand).ok_or(CoreError::UnknownBrand(brand))?;
        let suffix = config
            .locale_for_store_group(store_group_id)
            .ok_or(CoreError::UnknownStoreGroup {
                brand,
                store_group_id,
            })?;
        Ok(format!(
            "https://www.{}{}",
            config.name,
            suffix.to_lowercase()
        ))
    }
}

/// Load and validate a brand table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let table: BrandTable = serde_yaml::from_str(&content)?;

    validate_brands(&table)?;

    Ok(table)
}

fn validate_brands(table: &BrandTable) -> Result<(), ConfigError> {
    if table.brands.is_empty() {
        return Err(ConfigError::Validation(
            "brand table must list at least one brand".to_string(),
        ));
    }

    let mut seen_codes = HashSet::new();

    for brand in &table.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand {} must have a non-empty name",
                brand.code
            )));
        }

        if !seen_codes.insert(brand.code) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand code: {}",
                brand.code
            )));
        }

        if brand.locales.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand {} has no locales",
                brand.code
            )));
        }

        // Suffixes may share a store group (shoedazzle .COM and .CA both map
        // to 17); reverse lookups take the first suffix listed.
        let mut seen_suffixes = HashSet::new();
        for locale in &brand.locales {
            if locale.store_group_id == 0 {
                return Err(ConfigError::Validation(format!(
                    "brand {} locale '{}' has store group 0; ids must be positive",
                    brand.code, locale.suffix
                )));
            }
            if !seen_suffixes.insert(locale.suffix.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "brand {} lists locale '{}' twice",
                    brand.code, locale.suffix
                )));
            }
        }
    }

    if !seen_codes.contains(&table.default_brand) {
        return Err(ConfigError::Validation(format!(
            "default brand {} is not in the brand table",
            table.default_brand
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
