//! Engine configuration loading from config.toml
//!
//! Per-category margin and allocator overrides, the selectable organization
//! list and the configured fuel price table. Lists are validated on load:
//! duplicate names are configuration errors.

use crate::{
    core::pricing::PriceScope,
    engine::{Category, CategoryConfig, FreeSide, OrgRef},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EngineConfig {
    /// Per-category overrides of the built-in table
    #[serde(default)]
    pub categories: Vec<CategoryOverride>,
    /// Organizations offered as holder/destination
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
    /// Fuel prices served by the configured price table
    #[serde(default)]
    pub fuel_prices: Vec<FuelPriceConfig>,
}

/// Override for one category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryOverride {
    /// Category being overridden
    pub category: Category,
    /// Margin factor, e.g. `0.15` for 15%
    pub margin: Option<f64>,
    /// Which side of the allocator the user types
    pub free_side: Option<FreeSide>,
}

/// One selectable organization
#[derive(Debug, Deserialize, Clone)]
pub struct OrganizationConfig {
    /// OM name
    pub om: String,
    /// UG code
    pub ug: String,
}

/// Fuel prices for one locality
#[derive(Debug, Deserialize, Clone)]
pub struct FuelPriceConfig {
    /// Scope of the locality
    pub scope: PriceScope,
    /// Locality name (e.g. "Brasil", "AM", "Manaus")
    pub locality: String,
    /// Diesel price in R$/L
    pub diesel: f64,
    /// Gasoline price in R$/L
    pub gasolina: f64,
}

fn duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .find(|name| !seen.insert(name.trim().to_lowercase()))
}

fn config_error(message: String) -> Error {
    Error::Config { message }
}

impl EngineConfig {
    /// Rejects duplicates, blank names and invalid numbers.
    pub fn validate(&self) -> Result<()> {
        if let Some(dup) = duplicate(self.categories.iter().map(|c| c.category.code())) {
            return Err(config_error(format!("Duplicate category override: {dup}")));
        }
        for entry in &self.categories {
            if let Some(margin) = entry.margin.filter(|m| !m.is_finite() || *m < 0.0) {
                return Err(config_error(format!(
                    "Invalid margin {margin} for {}",
                    entry.category.code()
                )));
            }
        }

        if let Some(org) = self
            .organizations
            .iter()
            .find(|o| o.om.trim().is_empty() || o.ug.trim().is_empty())
        {
            return Err(config_error(format!(
                "Organization with blank name or UG: {:?}",
                org.om
            )));
        }
        if let Some(dup) = duplicate(self.organizations.iter().map(|o| o.om.as_str())) {
            return Err(config_error(format!("Duplicate organization name: {dup}")));
        }
        if let Some(dup) = duplicate(self.organizations.iter().map(|o| o.ug.as_str())) {
            return Err(config_error(format!("Duplicate organization UG: {dup}")));
        }

        for price in &self.fuel_prices {
            if price.locality.trim().is_empty() {
                return Err(config_error("Fuel price with blank locality".to_string()));
            }
            if [price.diesel, price.gasolina]
                .iter()
                .any(|p| !p.is_finite() || *p <= 0.0)
            {
                return Err(config_error(format!(
                    "Invalid fuel price for {}",
                    price.locality
                )));
            }
        }
        let localities: Vec<String> = self
            .fuel_prices
            .iter()
            .map(|p| format!("{}:{}", p.scope.code(), p.locality))
            .collect();
        if let Some(dup) = duplicate(localities.iter().map(String::as_str)) {
            return Err(config_error(format!("Duplicate fuel price locality: {dup}")));
        }

        Ok(())
    }

    /// Built-in configuration of `category` with any override applied.
    #[must_use]
    pub fn category_config(&self, category: Category) -> CategoryConfig {
        let mut config = category.default_config();
        if let Some(entry) = self.categories.iter().find(|c| c.category == category) {
            if let Some(margin) = entry.margin {
                config.margin = margin;
            }
            if let Some(side) = entry.free_side {
                config.free_side = side;
            }
        }
        config
    }

    /// Looks up a configured organization by OM name (case-insensitive).
    #[must_use]
    pub fn find_organization(&self, om: &str) -> Option<OrgRef> {
        self.organizations
            .iter()
            .find(|o| o.om.trim().eq_ignore_ascii_case(om.trim()))
            .map(|o| OrgRef::new(o.om.as_str(), o.ug.as_str()))
    }
}

/// Parses and validates engine configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads engine configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or a
/// list contains duplicates or invalid values.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading engine configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads engine configuration from `CONFIG_PATH`, or ./config.toml
pub fn load_default_config() -> Result<EngineConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
