//! Integration tests for the HTTP fetcher against a mock API server.
//!
//! These validate the pagination termination rules and the retry/backoff
//! policy: 429 with Retry-After, 5xx retries, hard 4xx failures, and retry
//! exhaustion.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pulse_connector_pipeline::fetcher::{FetcherConfig, PulseFetcher};
use pulse_connector_pipeline::PipelineError;

fn records(count: usize, offset: usize) -> Vec<Value> {
    (0..count).map(|i| json!({"id": format!("pulse-{}", offset + i)})).collect()
}

fn page_body(count: usize, offset: usize) -> Value {
    json!({"results": records(count, offset)})
}

fn fetcher(base_url: &str, config: FetcherConfig) -> PulseFetcher {
    PulseFetcher::new(base_url, "test-key", "test-connector", config).unwrap()
}

fn fast_retry_config() -> FetcherConfig {
    FetcherConfig {
        initial_backoff: Duration::from_millis(10),
        ..FetcherConfig::default()
    }
}

#[tokio::test]
async fn test_pagination_continues_on_full_page_and_stops_after_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(5, 0)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(
        &server.uri(),
        FetcherConfig { page_size: 5, ..FetcherConfig::default() },
    );
    let mut cursor = fetcher.pages("pulses/subscribed");

    let first = cursor.next_page().await.unwrap().unwrap();
    assert_eq!(first.number, 1);
    assert_eq!(first.records.len(), 5);

    let second = cursor.next_page().await.unwrap().unwrap();
    assert_eq!(second.number, 2);
    assert_eq!(second.records.len(), 3);

    // The short page ended pagination; no third request is issued.
    assert!(cursor.next_page().await.unwrap().is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), FetcherConfig::default());
    let mut cursor = fetcher.pages("pulses/subscribed");

    assert!(cursor.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_pagination_respects_page_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 0)))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(
        &server.uri(),
        FetcherConfig { page_size: 2, max_pages: 2, ..FetcherConfig::default() },
    );
    let mut cursor = fetcher.pages("pulses/subscribed");

    assert!(cursor.next_page().await.unwrap().is_some());
    assert!(cursor.next_page().await.unwrap().is_some());
    // Full pages keep coming back, but the ceiling stops the run.
    assert!(cursor.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_response_shape_is_an_early_stop_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"detail": "unexpected shape"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), FetcherConfig::default());
    let mut cursor = fetcher.pages("pulses/subscribed");

    assert!(cursor.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_retry_after_header_is_honored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "2"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"main": {"temp": 300.0}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Backoff starts at 10ms, so a ~2s wait can only come from the header.
    let fetcher = fetcher(&server.uri(), fast_retry_config());

    let start = Instant::now();
    let body = fetcher.fetch_observation("Chennai").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(body["main"]["temp"], 300.0);
    assert!(elapsed >= Duration::from_secs(2), "waited only {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(8), "waited too long: {:?}", elapsed);
}

#[tokio::test]
async fn test_hard_client_error_fails_immediately() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), fast_retry_config());

    let result = fetcher.fetch_observation("Chennai").await;

    match result {
        Err(PipelineError::HttpStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HttpStatus error, got {:?}", other),
    }

    // Exactly one request: 404 is not retried.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"main": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), fast_retry_config());

    let body = fetcher.fetch_observation("Chennai").await.unwrap();
    assert!(body.get("main").is_some());
}

#[tokio::test]
async fn test_retry_exhaustion_surfaces_after_the_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fetcher(
        &server.uri(),
        FetcherConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(10),
            ..FetcherConfig::default()
        },
    );

    let result = fetcher.fetch_observation("Chennai").await;

    match result {
        Err(PipelineError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected RetryExhausted error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_key_is_sent_as_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pulses/subscribed"))
        .and(wiremock::matchers::header("X-OTX-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), FetcherConfig::default());
    let mut cursor = fetcher.pages("pulses/subscribed");

    assert!(cursor.next_page().await.unwrap().is_none());
}
