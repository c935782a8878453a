//! Listing page targets: one city paired with one URL path pattern.

use url::Url;

use crate::Error;

/// Placeholder substituted with the city slug in a path pattern.
pub const CITY_PLACEHOLDER: &str = "{city}";

/// A single listing page the client can request.
///
/// Built from a path pattern such as `/buy-used-maruti-suzuki-cars-{city}/`
/// and a city slug. The human-readable city name travels with the target so
/// listings extracted from the page can be tagged with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingTarget {
    city: String,
    path: String,
}

impl ListingTarget {
    /// Creates a target by substituting `slug` into `pattern`.
    pub fn new(city: &str, slug: &str, pattern: &str) -> Self {
        Self {
            city: city.to_string(),
            path: pattern.replace(CITY_PLACEHOLDER, slug),
        }
    }

    /// Canonical city name this target belongs to.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Path component after substitution.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolves the full URL against `base_url`.
    pub fn url(&self, base_url: &str) -> Result<Url, Error> {
        let base = Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
        base.join(&self.path)
            .map_err(|e| Error::InvalidUrl(format!("{}{}: {}", base_url, self.path, e)))
    }
}
