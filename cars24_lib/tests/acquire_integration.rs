use std::time::Duration;

use cars24_lib::acquire::acquire;
use cars24_lib::targets::load_target_catalog;
use cars24_lib::{ScrapeConfig, Source};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PAGE: &str = include_str!("../../cars24_api/tests/fixtures/listing_page.html");
const BLOCKED_PAGE: &str = include_str!("../../cars24_api/tests/fixtures/blocked_page.html");

fn test_config(uri: &str, cities: &[&str]) -> ScrapeConfig {
    ScrapeConfig {
        base_url: uri.to_string(),
        timeout: Duration::from_secs(2),
        max_attempts: 1,
        backoff: Duration::ZERO,
        city_delay: Duration::ZERO,
        cities: cities.iter().map(|c| c.to_string()).collect(),
        ..ScrapeConfig::default()
    }
}

// ============================================================================
// Scraped path
// ============================================================================

#[tokio::test]
async fn scrapes_cards_and_falls_through_to_second_pattern() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-mumbai/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buy-used-cars-mumbai/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let config = test_config(&mock_server.uri(), &["Delhi", "Mumbai"]);
    let mut progress = Vec::new();
    let acquisition = acquire(&config, &catalog, |o| progress.push(o.city.clone()))
        .await
        .unwrap();

    assert!(!acquisition.used_fallback());
    assert_eq!(progress, vec!["Delhi".to_string(), "Mumbai".to_string()]);
    // Three cards per city; the promo card is not a brand listing.
    assert_eq!(acquisition.listings.len(), 6);
    assert_eq!(acquisition.scraped_count(), 6);
    assert!(acquisition.listings.iter().all(|l| l.source == Source::Scraped));

    let swift = &acquisition.listings[0];
    assert_eq!(swift.title, "2019 Maruti Suzuki Swift VXI");
    assert_eq!(swift.price, Some(525_000));
    assert_eq!(swift.kilometers, Some(42_350));
    assert_eq!(swift.city, "Delhi");

    let baleno = &acquisition.listings[1];
    assert_eq!(baleno.transmission, "AMT");

    let ertiga = &acquisition.listings[2];
    assert_eq!(ertiga.price, Some(685_000));
    assert_eq!(ertiga.fuel_type, "Diesel");

    let mumbai = &acquisition.outcomes[1];
    assert_eq!(mumbai.target.as_deref(), Some("/buy-used-cars-mumbai/"));
    assert_eq!(mumbai.strategy, Some("container-selectors"));
    assert_eq!(mumbai.listings, 3);
}

#[tokio::test]
async fn respects_max_listings_per_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let mut config = test_config(&mock_server.uri(), &["Pune"]);
    config.max_listings_per_city = 2;
    let acquisition = acquire(&config, &catalog, |_| {}).await.unwrap();

    assert_eq!(acquisition.listings.len(), 2);
    assert!(acquisition.listings.iter().all(|l| l.city == "Pune"));
}

// ============================================================================
// Fallback path
// ============================================================================

#[tokio::test]
async fn empty_markup_falls_back_to_sample_for_every_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let cities = ["Delhi", "Mumbai", "Bangalore", "Hyderabad", "Chennai", "Kolkata"];
    let mut config = test_config(&mock_server.uri(), &cities);
    config.sample_size = 3;
    let acquisition = acquire(&config, &catalog, |_| {}).await.unwrap();

    assert!(acquisition.used_fallback());
    assert!(!acquisition.listings.is_empty());
    assert!(acquisition.listings.iter().all(|l| l.source == Source::Sample));
    for city in cities {
        assert!(
            acquisition.listings.iter().any(|l| l.city == city),
            "no sample listing for {}",
            city
        );
    }
    assert!(acquisition
        .outcomes
        .iter()
        .all(|o| o.error.as_deref() == Some("no listings found")));
}

#[tokio::test]
async fn server_errors_fall_back_with_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let config = test_config(&mock_server.uri(), &["Chennai"]);
    let acquisition = acquire(&config, &catalog, |_| {}).await.unwrap();

    assert!(acquisition.used_fallback());
    assert_eq!(acquisition.sample_count(), config.sample_size);
    assert_eq!(acquisition.outcomes.len(), 1);
    assert_eq!(acquisition.outcomes[0].error.as_deref(), Some("HTTP 503"));
    assert!(!acquisition.outcomes[0].succeeded());
}

#[tokio::test]
async fn blocked_page_counts_as_empty_extraction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BLOCKED_PAGE))
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let config = test_config(&mock_server.uri(), &["Jaipur"]);
    let acquisition = acquire(&config, &catalog, |_| {}).await.unwrap();

    assert!(acquisition.used_fallback());
    assert!(acquisition.listings.iter().all(|l| l.is_sample() && l.city == "Jaipur"));
}

#[tokio::test]
async fn unknown_city_is_rejected_before_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let catalog = load_target_catalog().unwrap();
    let config = test_config(&mock_server.uri(), &["Atlantis"]);
    assert!(acquire(&config, &catalog, |_| {}).await.is_err());
}
