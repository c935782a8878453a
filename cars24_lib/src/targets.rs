//! Target catalog: supported cities, their aliases, URL patterns and brand models.
//!
//! Loaded at compile time from `seed_data/targets.yml`, following the same
//! `include_str!` + YAML pattern used for every other seed file.

use std::collections::HashSet;

use cars24_api::{ListingTarget, CITY_PLACEHOLDER};
use serde::Deserialize;
use thiserror::Error;

/// Error types for target catalog operations.
#[derive(Error, Debug)]
pub enum TargetCatalogError {
    #[error("Failed to parse target catalog YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate city in catalog: {0}")]
    DuplicateCity(String),
    #[error("URL pattern has no {{city}} placeholder: {0}")]
    MissingPlaceholder(String),
    #[error("Default city is not in the catalog: {0}")]
    UnknownDefaultCity(String),
    #[error("Target catalog has no {0}")]
    Empty(&'static str),
}

/// Top-level structure for the target catalog YAML file.
#[derive(Deserialize, Debug, Clone)]
pub struct TargetCatalog {
    /// Brand the scraper is focused on, e.g. "Maruti Suzuki".
    pub brand: String,
    /// Lowercase keywords that identify the brand in listing text.
    pub brand_keywords: Vec<String>,
    /// Path patterns tried in order for each city.
    pub url_patterns: Vec<String>,
    pub default_cities: Vec<String>,
    pub cities: Vec<CitySpec>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

/// A supported city.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CitySpec {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A known model of the brand. Models with a base price feed the sample generator.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub base_price: Option<i64>,
}

/// Parse and validate a target catalog from YAML content.
pub fn parse_target_catalog(yaml_content: &str) -> Result<TargetCatalog, TargetCatalogError> {
    let catalog: TargetCatalog = serde_yml::from_str(yaml_content)?;

    if catalog.cities.is_empty() {
        return Err(TargetCatalogError::Empty("cities"));
    }
    if catalog.url_patterns.is_empty() {
        return Err(TargetCatalogError::Empty("url patterns"));
    }
    if catalog.brand_keywords.is_empty() {
        return Err(TargetCatalogError::Empty("brand keywords"));
    }

    let mut seen = HashSet::new();
    for city in &catalog.cities {
        if !seen.insert(city.name.to_lowercase()) {
            return Err(TargetCatalogError::DuplicateCity(city.name.clone()));
        }
    }

    for pattern in &catalog.url_patterns {
        if !pattern.contains(CITY_PLACEHOLDER) {
            return Err(TargetCatalogError::MissingPlaceholder(pattern.clone()));
        }
    }

    for name in &catalog.default_cities {
        if catalog.resolve_city(name).is_none() {
            return Err(TargetCatalogError::UnknownDefaultCity(name.clone()));
        }
    }

    Ok(catalog)
}

/// Load the target catalog from the embedded YAML file.
pub fn load_target_catalog() -> Result<TargetCatalog, TargetCatalogError> {
    let yaml_content = include_str!("../../seed_data/targets.yml");
    parse_target_catalog(yaml_content)
}

impl TargetCatalog {
    /// Looks a city up by name, slug or alias (case-insensitive, exact).
    pub fn resolve_city(&self, input: &str) -> Option<&CitySpec> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.cities.iter().find(|c| {
            c.name.to_lowercase() == needle
                || c.slug == needle
                || c.aliases.iter().any(|a| a.to_lowercase() == needle)
        })
    }

    /// The cities scraped when none are requested explicitly.
    pub fn default_city_specs(&self) -> Vec<&CitySpec> {
        self.default_cities
            .iter()
            .filter_map(|name| self.resolve_city(name))
            .collect()
    }

    /// All listing targets for a city, in the order they should be tried.
    pub fn targets_for(&self, city: &CitySpec) -> Vec<ListingTarget> {
        self.url_patterns
            .iter()
            .map(|pattern| ListingTarget::new(&city.name, &city.slug, pattern))
            .collect()
    }

    /// Maps free-form location text to a canonical city name.
    ///
    /// Matches names, slugs and aliases as substrings; unmatched text is
    /// title-cased, and blank text becomes "Unknown".
    pub fn standardize_city(&self, raw: &str) -> String {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return "Unknown".to_string();
        }
        for city in &self.cities {
            let hit = lower.contains(&city.name.to_lowercase())
                || lower.contains(&city.slug)
                || city.aliases.iter().any(|a| lower.contains(&a.to_lowercase()));
            if hit {
                return city.name.clone();
            }
        }
        title_case(raw.trim())
    }

    /// True when `text` names the brand.
    pub fn mentions_brand(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.brand_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Extracts the model name from a listing title, or "Other".
    ///
    /// Longer model names are checked first so "Vitara Brezza" wins over
    /// any shorter name it contains.
    pub fn model_of(&self, title: &str) -> String {
        let upper = title.to_uppercase();
        let mut models: Vec<&ModelSpec> = self.models.iter().collect();
        models.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
        models
            .into_iter()
            .find(|m| upper.contains(&m.name.to_uppercase()))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "Other".to_string())
    }

    /// Models that carry a base price, in catalog order.
    pub fn priced_models(&self) -> Vec<&ModelSpec> {
        self.models.iter().filter(|m| m.base_price.is_some()).collect()
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
