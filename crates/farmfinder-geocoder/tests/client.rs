//! Integration tests for `GeocoderClient` using wiremock HTTP mocks.

use std::time::{Duration, Instant};

use farmfinder_geocoder::{GeocodeError, GeocoderClient, GeocoderSettings};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, min_interval_ms: u64, max_retries: u32) -> GeocoderClient {
    GeocoderClient::new(GeocoderSettings {
        base_url: base_url.to_owned(),
        user_agent: "farmfinder-test/1.0".to_owned(),
        min_interval: Duration::from_millis(min_interval_ms),
        timeout_secs: 5,
        max_retries,
        backoff_base_ms: 0,
        ..GeocoderSettings::default()
    })
    .expect("client construction should not fail")
}

#[tokio::test]
async fn geocode_returns_first_match() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        { "lat": "40.7506", "lon": "-73.9971", "display_name": "New York, 10001, United States" },
        { "lat": "10.0", "lon": "10.0", "display_name": "ignored" }
    ]);

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("postalcode", "10001"))
        .and(query_param("country", "USA"))
        .and(query_param("format", "json"))
        .and(header("user-agent", "farmfinder-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0, 0);
    let point = client
        .geocode_postal_code("10001")
        .await
        .expect("should geocode");

    assert!((point.lat - 40.7506).abs() < 1e-9);
    assert!((point.lng + 73.9971).abs() < 1e-9);
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0, 3);
    let err = client.geocode_postal_code("00000").await.unwrap_err();

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

#[tokio::test]
async fn server_error_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0, 2);
    let err = client.geocode_postal_code("10001").await.unwrap_err();

    assert!(matches!(err, GeocodeError::UnexpectedStatus { status: 503 }));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn transient_failure_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "lat": 37.7599, "lon": -122.4148 }])),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0, 2);
    let point = client
        .geocode_postal_code("94110")
        .await
        .expect("second attempt should succeed");
    assert!((point.lat - 37.7599).abs() < 1e-9);
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0, 2);
    let err = client.geocode_postal_code("10001").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Deserialize { .. }));
}

#[tokio::test]
async fn unreachable_service_is_http_error() {
    let client = test_client("http://127.0.0.1:1", 0, 0);
    let err = client.geocode_postal_code("10001").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Http(_)));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn back_to_back_calls_respect_min_interval() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "lat": "40.7506", "lon": "-73.9971" }])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 300, 0);

    let start = Instant::now();
    client.geocode_postal_code("10001").await.expect("first");
    client.geocode_postal_code("10001").await.expect("second");

    assert!(
        start.elapsed() >= Duration::from_millis(300),
        "two calls finished after only {:?}",
        start.elapsed()
    );
}
