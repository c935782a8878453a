//! Market statistics over a listing collection.
//!
//! All functions operate on slices of `CarListing` and return plain
//! serializable structs. They do no I/O and never mutate their input.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use cars24_api::types::CarListing;
use serde::Serialize;

use crate::targets::TargetCatalog;

pub const DEFAULT_BINS: usize = 10;

/// Descriptive statistics for one numeric field.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1). Zero for a single value.
    pub std_dev: f64,
    pub q1: f64,
    pub q3: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Overview {
    pub total: usize,
    pub cities: usize,
    pub models: usize,
    pub scraped: usize,
    pub sample: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CityStats {
    pub city: String,
    pub count: usize,
    /// Listings in this city with a price.
    pub priced: usize,
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

/// One fixed-width price bin. The last bin includes its upper edge.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PriceBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct YearPrice {
    pub year: i32,
    pub count: usize,
    pub mean_price: f64,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGrade {
    Excellent,
    Good,
    Acceptable,
}

impl QualityGrade {
    /// EXCELLENT above 90, GOOD above 70, otherwise ACCEPTABLE.
    pub fn from_score(score: f64) -> Self {
        if score > 90.0 {
            QualityGrade::Excellent
        } else if score > 70.0 {
            QualityGrade::Good
        } else {
            QualityGrade::Acceptable
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityGrade::Excellent => "EXCELLENT",
            QualityGrade::Good => "GOOD",
            QualityGrade::Acceptable => "ACCEPTABLE",
        })
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DataQuality {
    pub total: usize,
    pub price_completeness: f64,
    pub year_completeness: f64,
    pub kilometers_completeness: f64,
    pub complete_records: usize,
    /// Mean of the three completeness percentages.
    pub score: f64,
    pub grade: QualityGrade,
}

/// Everything the reports and charts are built from.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MarketSummary {
    pub overview: Overview,
    pub price: Option<NumericStats>,
    pub year: Option<NumericStats>,
    pub kilometers: Option<NumericStats>,
    pub by_city: Vec<CityStats>,
    pub price_bins: Vec<PriceBin>,
    pub fuel: Vec<Share>,
    pub transmission: Vec<Share>,
    pub models: Vec<Share>,
    pub price_by_year: Vec<YearPrice>,
    pub quality: DataQuality,
}

/// Linear-interpolated quantile of already sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Statistics over `values`, or `None` when empty.
pub fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std_dev = if sorted.len() > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Some(NumericStats {
        count: sorted.len(),
        mean,
        median: quantile(&sorted, 0.5),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std_dev,
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
    })
}

pub fn prices(listings: &[CarListing]) -> Vec<f64> {
    listings.iter().filter_map(|l| l.price).map(|p| p as f64).collect()
}

pub fn overview(listings: &[CarListing], catalog: &TargetCatalog) -> Overview {
    let cities: HashSet<&str> = listings.iter().map(|l| l.city.as_str()).collect();
    let models: HashSet<String> = listings.iter().map(|l| catalog.model_of(&l.title)).collect();
    let sample = listings.iter().filter(|l| l.is_sample()).count();
    Overview {
        total: listings.len(),
        cities: cities.len(),
        models: models.len(),
        scraped: listings.len() - sample,
        sample,
    }
}

/// Per-city counts and price statistics, most listings first.
pub fn city_stats(listings: &[CarListing]) -> Vec<CityStats> {
    let mut groups: HashMap<&str, Vec<&CarListing>> = HashMap::new();
    for listing in listings {
        groups.entry(listing.city.as_str()).or_default().push(listing);
    }

    let mut stats: Vec<CityStats> = groups
        .into_iter()
        .map(|(city, group)| {
            let city_prices: Vec<i64> = group.iter().filter_map(|l| l.price).collect();
            let as_f64: Vec<f64> = city_prices.iter().map(|p| *p as f64).collect();
            let summary = numeric_stats(&as_f64);
            CityStats {
                city: city.to_string(),
                count: group.len(),
                priced: city_prices.len(),
                mean_price: summary.as_ref().map(|s| s.mean),
                median_price: summary.as_ref().map(|s| s.median),
                min_price: city_prices.iter().min().copied(),
                max_price: city_prices.iter().max().copied(),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    stats
}

/// Splits the price range into `bins` equal-width bins. Every priced
/// listing lands in exactly one bin.
pub fn price_bins(listings: &[CarListing], bins: usize) -> Vec<PriceBin> {
    let values = prices(listings);
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![PriceBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| PriceBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Counts per label, largest first, ties by label.
pub fn distribution<'a, I>(labels: I) -> Vec<Share>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label).or_default() += 1;
        total += 1;
    }
    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(label, count)| Share {
            label: label.to_string(),
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

/// Mean price per manufacturing year, oldest first.
pub fn price_by_year(listings: &[CarListing]) -> Vec<YearPrice> {
    let mut groups: BTreeMap<i32, Vec<i64>> = BTreeMap::new();
    for listing in listings {
        if let (Some(year), Some(price)) = (listing.year, listing.price) {
            groups.entry(year).or_default().push(price);
        }
    }
    groups
        .into_iter()
        .map(|(year, prices)| YearPrice {
            year,
            count: prices.len(),
            mean_price: prices.iter().map(|p| *p as f64).sum::<f64>() / prices.len() as f64,
        })
        .collect()
}

pub fn data_quality(listings: &[CarListing]) -> DataQuality {
    let total = listings.len();
    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 * 100.0 / total as f64
        }
    };
    let price = pct(listings.iter().filter(|l| l.price.is_some()).count());
    let year = pct(listings.iter().filter(|l| l.year.is_some()).count());
    let km = pct(listings.iter().filter(|l| l.kilometers.is_some()).count());
    let score = (price + year + km) / 3.0;

    DataQuality {
        total,
        price_completeness: price,
        year_completeness: year,
        kilometers_completeness: km,
        complete_records: listings.iter().filter(|l| l.has_complete_data()).count(),
        score,
        grade: QualityGrade::from_score(score),
    }
}

/// Builds the full summary. `bins` is the number of price histogram bins.
pub fn summarize(listings: &[CarListing], catalog: &TargetCatalog, bins: usize) -> MarketSummary {
    let years: Vec<f64> = listings.iter().filter_map(|l| l.year).map(f64::from).collect();
    let kms: Vec<f64> = listings.iter().filter_map(|l| l.kilometers).map(|k| k as f64).collect();
    let models: Vec<String> = listings.iter().map(|l| catalog.model_of(&l.title)).collect();

    MarketSummary {
        overview: overview(listings, catalog),
        price: numeric_stats(&prices(listings)),
        year: numeric_stats(&years),
        kilometers: numeric_stats(&kms),
        by_city: city_stats(listings),
        price_bins: price_bins(listings, bins),
        fuel: distribution(listings.iter().map(|l| l.fuel_type.as_str())),
        transmission: distribution(listings.iter().map(|l| l.transmission.as_str())),
        models: distribution(models.iter().map(String::as_str)),
        price_by_year: price_by_year(listings),
        quality: data_quality(listings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::load_target_catalog;
    use cars24_api::types::Source;
    use chrono::{TimeZone, Utc};

    fn listing(title: &str, price: Option<i64>, year: Option<i32>, city: &str) -> CarListing {
        CarListing {
            title: title.to_string(),
            price,
            year,
            kilometers: Some(30_000),
            city: city.to_string(),
            fuel_type: "Petrol".to_string(),
            transmission: "Manual".to_string(),
            source: Source::Scraped,
            scraped_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn fixture() -> Vec<CarListing> {
        vec![
            listing("2019 Maruti Suzuki Swift VXI", Some(400_000), Some(2019), "Delhi"),
            listing("2020 Maruti Suzuki Baleno", Some(600_000), Some(2020), "Delhi"),
            listing("2018 Maruti Suzuki Swift", Some(300_000), Some(2019), "Mumbai"),
            listing("2021 Maruti Suzuki Dzire", Some(700_000), Some(2021), "Delhi"),
            listing("Maruti Suzuki Car", None, None, "Pune"),
        ]
    }

    #[test]
    fn test_numeric_stats_known_values() {
        let stats = numeric_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        assert!((stats.median - 4.5).abs() < 1e-9);
        assert!((stats.std_dev - 2.138_089_935).abs() < 1e-6);
        assert!((stats.q1 - 4.0).abs() < 1e-9);
        assert!((stats.q3 - 5.5).abs() < 1e-9);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn test_numeric_stats_edge_cases() {
        assert!(numeric_stats(&[]).is_none());
        let single = numeric_stats(&[42.0]).unwrap();
        assert_eq!(single.median, 42.0);
        assert_eq!(single.std_dev, 0.0);
    }

    #[test]
    fn test_city_grouping() {
        let stats = city_stats(&fixture());
        assert_eq!(stats[0].city, "Delhi");
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].median_price, Some(600_000.0));
        assert_eq!(stats[0].min_price, Some(400_000));
        assert_eq!(stats[0].max_price, Some(700_000));

        let pune = stats.iter().find(|s| s.city == "Pune").unwrap();
        assert_eq!(pune.priced, 0);
        assert!(pune.mean_price.is_none());
    }

    #[test]
    fn test_bins_cover_all_priced_listings() {
        let listings = fixture();
        for n in [1, 3, 10] {
            let bins = price_bins(&listings, n);
            assert_eq!(bins.len(), n);
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
            assert_eq!(bins[0].lower, 300_000.0);
            assert_eq!(bins[n - 1].upper, 700_000.0);
        }
    }

    #[test]
    fn test_bins_single_price() {
        let listings = vec![listing("Swift", Some(500_000), None, "Delhi")];
        let bins = price_bins(&listings, 10);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn test_price_by_year_is_sorted() {
        let by_year = price_by_year(&fixture());
        let years: Vec<i32> = by_year.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(by_year[0].count, 2);
        assert_eq!(by_year[0].mean_price, 350_000.0);
    }

    #[test]
    fn test_distribution_order() {
        let shares = distribution(["Manual", "AMT", "Manual", "CVT"]);
        assert_eq!(shares[0].label, "Manual");
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percent, 50.0);
        assert_eq!(shares[1].label, "AMT");
    }

    #[test]
    fn test_quality_grades() {
        assert_eq!(QualityGrade::from_score(95.0), QualityGrade::Excellent);
        assert_eq!(QualityGrade::from_score(90.0), QualityGrade::Good);
        assert_eq!(QualityGrade::from_score(70.0), QualityGrade::Acceptable);

        let quality = data_quality(&fixture());
        assert_eq!(quality.complete_records, 4);
        assert_eq!(quality.price_completeness, 80.0);
        assert_eq!(quality.kilometers_completeness, 100.0);
        assert_eq!(quality.grade, QualityGrade::Good);
    }

    #[test]
    fn test_summarize() {
        let catalog = load_target_catalog().unwrap();
        let summary = summarize(&fixture(), &catalog, DEFAULT_BINS);
        assert_eq!(summary.overview.total, 5);
        assert_eq!(summary.overview.cities, 3);
        assert_eq!(summary.overview.scraped, 5);
        assert_eq!(summary.overview.sample, 0);
        assert_eq!(summary.models[0].label, "Swift");
        assert_eq!(summary.price.as_ref().unwrap().count, 4);
        assert_eq!(summary.price.as_ref().unwrap().median, 500_000.0);
    }

    #[test]
    fn test_empty_collection() {
        let catalog = load_target_catalog().unwrap();
        let summary = summarize(&[], &catalog, DEFAULT_BINS);
        assert_eq!(summary.overview.total, 0);
        assert!(summary.price.is_none());
        assert!(summary.price_bins.is_empty());
        assert!(summary.by_city.is_empty());
        assert_eq!(summary.quality.grade, QualityGrade::Acceptable);
    }

    #[test]
    fn test_summary_of_loaded_extreme_prices_does_not_overflow() {
        let csv = "title,price,year,kilometers,city,fuel_type,transmission,source,scraped_at\n\
                   A,9000000000000000000,2019,1,Delhi,Petrol,Manual,sample,2024-06-01T10:30:00Z\n\
                   B,9000000000000000000,2019,1,Delhi,Petrol,Manual,sample,2024-06-01T10:30:00Z\n";
        let listings = crate::dataset::read_csv(csv.as_bytes()).unwrap();

        let by_year = price_by_year(&listings);
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].count, 2);
        assert!((by_year[0].mean_price - 9.0e18).abs() / 9.0e18 < 1e-9);

        let catalog = load_target_catalog().unwrap();
        let summary = summarize(&listings, &catalog, DEFAULT_BINS);
        assert_eq!(summary.overview.total, 2);
    }
}
