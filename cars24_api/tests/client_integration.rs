use std::time::Duration;

use cars24_api::{Client, Error, ListingTarget};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PATTERN: &str = "/buy-used-maruti-suzuki-cars-{city}/";

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn delhi() -> ListingTarget {
    ListingTarget::new("Delhi", "delhi", PATTERN)
}

fn fast_client(uri: &str) -> Client {
    Client::with_base_url(uri).with_retry(2, Duration::ZERO)
}

#[tokio::test]
async fn fetch_page_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("listing_page.html");

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server.uri());
    let markup = client.fetch_page(&delhi()).await.unwrap();
    assert!(markup.contains("Maruti Suzuki Swift"));
}

#[tokio::test]
async fn fetch_page_server_error_retries_then_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server.uri());
    let result = client.fetch_page(&delhi()).await;
    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("expected HttpStatus error, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn fetch_page_recovers_on_second_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server.uri());
    let markup = client.fetch_page(&delhi()).await.unwrap();
    assert_eq!(markup, "<html>ok</html>");
}

#[tokio::test]
async fn fetch_page_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(ResponseTemplate::new(404).set_body_string(load_fixture("blocked_page.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server.uri());
    let err = client.fetch_page(&delhi()).await.unwrap_err();
    assert_eq!(err.reason(), "HTTP 404");
}

#[tokio::test]
async fn fetch_page_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>slow</html>")
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri())
        .with_timeout(Duration::from_millis(200))
        .with_retry(1, Duration::ZERO);
    let err = client.fetch_page(&delhi()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got {:?}", err);
}

#[tokio::test]
async fn sends_browser_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy-used-maruti-suzuki-cars-delhi/"))
        .and(wiremock::matchers::header_exists("user-agent"))
        .and(wiremock::matchers::header_regex("accept-language", "^en-US"))
        .and(wiremock::matchers::header("upgrade-insecure-requests", "1"))
        .and(wiremock::matchers::header("sec-fetch-mode", "navigate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(&mock_server.uri());
    assert!(client.fetch_page(&delhi()).await.is_ok());
}
