//! Deterministic sample listings used when scraping yields nothing.

use cars24_api::types::{CarListing, Source};
use chrono::{DateTime, Datelike, Utc};

use crate::targets::TargetCatalog;

const FUEL_CYCLE: &[&str] = &["Petrol", "Petrol", "Diesel", "CNG", "Petrol + CNG"];
const TRANSMISSION_CYCLE: &[&str] = &["Manual", "Manual", "AMT", "Automatic"];

/// Base price used when the catalog has no priced models.
const FALLBACK_BASE_PRICE: i64 = 400_000;
const YEARLY_DEPRECIATION: f64 = 0.10;
const DEPRECIATION_PER_10K_KM: f64 = 0.05;
const PRICE_FLOOR: f64 = 0.30;
const MAX_AGE_YEARS: usize = 8;

/// Price after depreciation: 10% per year of age and 5% per 10,000 km,
/// never below 30% of `base`. Rounded to the nearest thousand.
pub fn depreciated_price(base: i64, age_years: i32, kilometers: i64) -> i64 {
    let factor = 1.0
        - YEARLY_DEPRECIATION * f64::from(age_years.max(0))
        - DEPRECIATION_PER_10K_KM * (kilometers.max(0) as f64 / 10_000.0);
    let price = base as f64 * factor.max(PRICE_FLOOR);
    ((price / 1_000.0).round() * 1_000.0) as i64
}

/// Generates `size` sample listings round-robin over `cities`.
///
/// At least one record is produced per city, so the result holds
/// `max(size, cities.len())` listings. An empty city list means the
/// catalog's default cities. The output depends only on the inputs.
pub fn generate_sample(
    catalog: &TargetCatalog,
    cities: &[String],
    size: usize,
    generated_at: DateTime<Utc>,
) -> Vec<CarListing> {
    let cities: Vec<String> = if cities.is_empty() {
        catalog.default_cities.clone()
    } else {
        cities.to_vec()
    };
    if cities.is_empty() {
        return Vec::new();
    }

    let models: Vec<(String, i64)> = catalog
        .priced_models()
        .into_iter()
        .filter_map(|m| m.base_price.map(|p| (m.name.clone(), p)))
        .collect();
    let models = if models.is_empty() {
        vec![(String::from("Car"), FALLBACK_BASE_PRICE)]
    } else {
        models
    };

    let total = size.max(cities.len());
    let current_year = generated_at.year();

    (0..total)
        .map(|i| {
            let city = &cities[i % cities.len()];
            let (model, base) = &models[(i + i / cities.len()) % models.len()];
            let age = 1 + (i * 3) % MAX_AGE_YEARS;
            let kilometers = (age * 8_000 + (i * 3_571) % 15_000) as i64;
            let age = age as i32;
            let year = current_year - age;

            CarListing {
                title: format!("{} {} {}", year, catalog.brand, model),
                price: Some(depreciated_price(*base, age, kilometers)),
                year: Some(year),
                kilometers: Some(kilometers),
                city: city.clone(),
                fuel_type: FUEL_CYCLE[(i * 3) % FUEL_CYCLE.len()].to_string(),
                transmission: TRANSMISSION_CYCLE[(i * 5) % TRANSMISSION_CYCLE.len()].to_string(),
                source: Source::Sample,
                scraped_at: generated_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{MAX_KILOMETERS, MAX_PRICE, MIN_PRICE, MIN_YEAR};
    use crate::targets::load_target_catalog;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn cities(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_depreciation_model() {
        assert_eq!(depreciated_price(400_000, 0, 0), 400_000);
        assert_eq!(depreciated_price(400_000, 2, 20_000), 280_000);
        // Floor at 30% of base.
        assert_eq!(depreciated_price(400_000, 9, 90_000), 120_000);
    }

    #[test]
    fn test_default_size_and_provenance() {
        let catalog = load_target_catalog().unwrap();
        let listings = generate_sample(&catalog, &[], 50, at());
        assert_eq!(listings.len(), 50);
        assert!(listings.iter().all(|l| l.source == Source::Sample));
        assert!(listings.iter().all(|l| l.scraped_at == at()));
    }

    #[test]
    fn test_every_city_covered_even_when_size_is_small() {
        let catalog = load_target_catalog().unwrap();
        let requested = cities(&["Delhi", "Mumbai", "Pune", "Jaipur"]);
        let listings = generate_sample(&catalog, &requested, 2, at());
        assert_eq!(listings.len(), 4);
        let seen: HashSet<&str> = listings.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_values_are_plausible() {
        let catalog = load_target_catalog().unwrap();
        for listing in generate_sample(&catalog, &[], 200, at()) {
            let price = listing.price.unwrap();
            assert!((MIN_PRICE..=MAX_PRICE).contains(&price), "{}", price);
            let year = listing.year.unwrap();
            assert!((MIN_YEAR..=2024).contains(&year));
            let km = listing.kilometers.unwrap();
            assert!((1..=MAX_KILOMETERS).contains(&km));
            assert!(listing.title.contains("Maruti Suzuki"));
            assert!(listing.has_complete_data());
        }
    }

    #[test]
    fn test_deterministic() {
        let catalog = load_target_catalog().unwrap();
        let a = generate_sample(&catalog, &cities(&["Chennai"]), 10, at());
        let b = generate_sample(&catalog, &cities(&["Chennai"]), 10, at());
        assert_eq!(a, b);
    }

    #[test]
    fn test_models_vary() {
        let catalog = load_target_catalog().unwrap();
        let listings = generate_sample(&catalog, &[], 50, at());
        let models: HashSet<String> = listings.iter().map(|l| catalog.model_of(&l.title)).collect();
        assert!(models.len() >= 5);
    }
}
