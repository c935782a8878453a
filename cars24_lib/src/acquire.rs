//! Scrape-with-fallback acquisition.
//!
//! For each city the listing targets are tried in catalog order. A fetch
//! failure or an empty extraction moves on to the next target. When no
//! scraped listing survives across all cities, the whole collection is
//! replaced by sample data, so a run never mixes provenances.

use std::collections::HashSet;

use cars24_api::types::CarListing;
use cars24_api::Client;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::error::Cars24Error;
use crate::extract::{extract, ExtractRules};
use crate::normalize::normalize;
use crate::sample::generate_sample;
use crate::targets::{CitySpec, TargetCatalog};

/// What happened for one city.
#[derive(Clone, Debug, Serialize)]
pub struct CityOutcome {
    pub city: String,
    /// Listings kept for this city.
    pub listings: usize,
    /// Path that produced the listings.
    pub target: Option<String>,
    /// Extraction strategy that matched.
    pub strategy: Option<&'static str>,
    /// Last failure seen when no target produced listings.
    pub error: Option<String>,
}

impl CityOutcome {
    fn failed(city: &str, error: Option<String>) -> Self {
        Self {
            city: city.to_string(),
            listings: 0,
            target: None,
            strategy: None,
            error,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.listings > 0
    }
}

/// Result of a run: the listings plus per-city outcomes.
#[derive(Clone, Debug)]
pub struct Acquisition {
    pub listings: Vec<CarListing>,
    pub outcomes: Vec<CityOutcome>,
    /// Why sample data was used, when it was.
    pub fallback_reason: Option<String>,
}

impl Acquisition {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }

    pub fn scraped_count(&self) -> usize {
        self.listings.iter().filter(|l| !l.is_sample()).count()
    }

    pub fn sample_count(&self) -> usize {
        self.listings.iter().filter(|l| l.is_sample()).count()
    }
}

/// Resolves configured city names against the catalog. Empty means defaults.
pub fn resolve_cities<'a>(
    catalog: &'a TargetCatalog,
    names: &[String],
) -> Result<Vec<&'a CitySpec>, Cars24Error> {
    if names.is_empty() {
        return Ok(catalog.default_city_specs());
    }
    names
        .iter()
        .map(|name| {
            catalog
                .resolve_city(name)
                .ok_or_else(|| Cars24Error::InvalidInput(format!("unknown city '{}'", name)))
        })
        .collect()
}

/// Acquires listings for the configured cities, timestamped now.
///
/// `on_city` is called after each city finishes, for progress reporting.
pub async fn acquire<F>(
    config: &ScrapeConfig,
    catalog: &TargetCatalog,
    on_city: F,
) -> Result<Acquisition, Cars24Error>
where
    F: FnMut(&CityOutcome),
{
    acquire_at(config, catalog, Utc::now(), on_city).await
}

pub async fn acquire_at<F>(
    config: &ScrapeConfig,
    catalog: &TargetCatalog,
    now: DateTime<Utc>,
    mut on_city: F,
) -> Result<Acquisition, Cars24Error>
where
    F: FnMut(&CityOutcome),
{
    let cities = resolve_cities(catalog, &config.cities)?;
    let city_names: Vec<String> = cities.iter().map(|c| c.name.clone()).collect();

    if config.offline {
        info!("Offline mode: generating {} sample listings", config.sample_size);
        return Ok(fallback(
            catalog,
            &city_names,
            config.sample_size,
            now,
            Vec::new(),
            "offline mode".to_string(),
        ));
    }

    let client = config.client();
    let rules = ExtractRules::from_catalog(catalog);
    let mut listings: Vec<CarListing> = Vec::new();
    let mut outcomes: Vec<CityOutcome> = Vec::with_capacity(cities.len());

    for (i, city) in cities.iter().enumerate() {
        if i > 0 && !config.city_delay.is_zero() {
            tokio::time::sleep(config.city_delay).await;
        }
        info!("Scraping {} ({}/{})", city.name, i + 1, cities.len());

        let (outcome, found) =
            scrape_city(&client, catalog, &rules, city, config.max_listings_per_city, now).await;
        listings.extend(found);
        on_city(&outcome);
        outcomes.push(outcome);
    }

    let listings = dedup(listings);
    if listings.is_empty() {
        warn!("No listings scraped from {} cities, using sample data", cities.len());
        return Ok(fallback(
            catalog,
            &city_names,
            config.sample_size,
            now,
            outcomes,
            "no listings could be scraped".to_string(),
        ));
    }

    info!(
        "Scraped {} listings from {}/{} cities",
        listings.len(),
        outcomes.iter().filter(|o| o.succeeded()).count(),
        outcomes.len()
    );
    Ok(Acquisition {
        listings,
        outcomes,
        fallback_reason: None,
    })
}

async fn scrape_city(
    client: &Client,
    catalog: &TargetCatalog,
    rules: &ExtractRules,
    city: &CitySpec,
    max_listings: usize,
    now: DateTime<Utc>,
) -> (CityOutcome, Vec<CarListing>) {
    let mut last_error: Option<String> = None;

    for target in catalog.targets_for(city) {
        let markup = match client.fetch_page(&target).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("{}: {} failed: {}", city.name, target.path(), e);
                last_error = Some(e.reason());
                continue;
            }
        };

        let extraction = extract(&markup, rules);
        let Some(strategy) = extraction.strategy else {
            debug!("{}: no listing elements on {}", city.name, target.path());
            last_error = Some("no listings found".to_string());
            continue;
        };

        let found: Vec<CarListing> = extraction
            .fragments
            .iter()
            .filter(|f| catalog.mentions_brand(&f.text))
            .take(max_listings)
            .map(|f| normalize(f, &city.name, catalog, now))
            .collect();
        if found.is_empty() {
            debug!("{}: {} matched but no {} listings", city.name, strategy, catalog.brand);
            last_error = Some(format!("no {} listings found", catalog.brand));
            continue;
        }

        info!("{}: {} listings via {}", city.name, found.len(), strategy);
        let outcome = CityOutcome {
            city: city.name.clone(),
            listings: found.len(),
            target: Some(target.path().to_string()),
            strategy: Some(strategy),
            error: None,
        };
        return (outcome, found);
    }

    (CityOutcome::failed(&city.name, last_error), Vec::new())
}

/// Drops repeated (title, price, city) records, keeping the first.
fn dedup(listings: Vec<CarListing>) -> Vec<CarListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| seen.insert((l.title.clone(), l.price, l.city.clone())))
        .collect()
}

fn fallback(
    catalog: &TargetCatalog,
    cities: &[String],
    sample_size: usize,
    now: DateTime<Utc>,
    outcomes: Vec<CityOutcome>,
    reason: String,
) -> Acquisition {
    Acquisition {
        listings: generate_sample(catalog, cities, sample_size, now),
        outcomes,
        fallback_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::load_target_catalog;
    use cars24_api::types::Source;
    use chrono::TimeZone;

    fn listing(title: &str, price: Option<i64>, city: &str) -> CarListing {
        CarListing {
            title: title.to_string(),
            price,
            year: None,
            kilometers: None,
            city: city.to_string(),
            fuel_type: "Unknown".to_string(),
            transmission: "Unknown".to_string(),
            source: Source::Scraped,
            scraped_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let listings = vec![
            listing("Swift", Some(500_000), "Delhi"),
            listing("Swift", Some(500_000), "Delhi"),
            listing("Swift", Some(500_000), "Mumbai"),
            listing("Swift", None, "Delhi"),
        ];
        assert_eq!(dedup(listings).len(), 3);
    }

    #[test]
    fn test_resolve_cities_defaults_and_unknown() {
        let catalog = load_target_catalog().unwrap();
        assert_eq!(resolve_cities(&catalog, &[]).unwrap().len(), 5);
        let resolved = resolve_cities(&catalog, &["bombay".to_string()]).unwrap();
        assert_eq!(resolved[0].name, "Mumbai");
        assert!(resolve_cities(&catalog, &["Gotham".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_offline_uses_sample_without_network() {
        let catalog = load_target_catalog().unwrap();
        let config = ScrapeConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            offline: true,
            sample_size: 12,
            cities: vec!["Pune".to_string(), "Jaipur".to_string()],
            ..ScrapeConfig::default()
        };
        let mut calls = 0;
        let acquisition = acquire(&config, &catalog, |_| calls += 1).await.unwrap();
        assert_eq!(calls, 0);
        assert!(acquisition.used_fallback());
        assert_eq!(acquisition.listings.len(), 12);
        assert_eq!(acquisition.sample_count(), 12);
        assert!(acquisition
            .listings
            .iter()
            .all(|l| l.city == "Pune" || l.city == "Jaipur"));
    }
}
