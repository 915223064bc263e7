use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One entry of the fixed brand enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    /// Chart colour as `#rrggbb`.
    pub color: Option<String>,
    /// Whether the brand publishes agent listing postings.
    #[serde(default)]
    pub postings: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

impl BrandsFile {
    /// Brand names in configuration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.brands.iter().map(|b| b.name.clone()).collect()
    }

    /// Looks a brand up by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BrandConfig> {
        self.brands.iter().find(|b| b.name == name)
    }

    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Brands allowed on the agent postings form.
    #[must_use]
    pub fn postings_brands(&self) -> Vec<String> {
        self.brands
            .iter()
            .filter(|b| b.postings)
            .map(|b| b.name.clone())
            .collect()
    }
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_brands(&content)
}

/// Parse and validate brands YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_brands(content: &str) -> Result<BrandsFile, ConfigError> {
    let brands_file: BrandsFile =
        serde_yaml::from_str(content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    if brands_file.brands.is_empty() {
        return Err(ConfigError::Validation(
            "at least one brand must be configured".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if brand.name.trim() != brand.name {
            return Err(ConfigError::Validation(format!(
                "brand name '{}' has surrounding whitespace",
                brand.name
            )));
        }

        if let Some(color) = &brand.color {
            if !is_hex_color(color) {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has invalid color '{color}'; expected #rrggbb",
                    brand.name
                )));
            }
        }

        if !seen_names.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }
    }

    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
