//! HTTP-level tests for the provider adapters using wiremock.

use std::time::Duration;

use serde_json::json;
use stay_aggregator::provider::{build_adapter, http_client};
use stay_aggregator::{ProviderAdapter, ProviderError, ProviderKind, SearchRequest};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> SearchRequest {
    SearchRequest::new("Lisbon", "2025-06-01", "2025-06-04", 2).expect("valid request")
}

fn adapter(kind: ProviderKind, base_url: &str) -> std::sync::Arc<dyn ProviderAdapter> {
    let client = http_client(Duration::from_secs(5)).expect("client should build");
    build_adapter(kind, client, base_url, "test-key").expect("adapter should build")
}

#[tokio::test]
async fn booking_sends_query_and_rapidapi_headers() {
    let server = MockServer::start().await;

    let body = json!({
        "result": [
            { "hotel_id": 1, "hotel_name": "Alfama Loft", "city": "Lisbon", "review_score": 8.8 },
            { "hotel_id": 2, "hotel_name": "Baixa House", "city": "Lisbon" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/v1/hotels/search"))
        .and(query_param("name", "Lisbon"))
        .and(query_param("checkin_date", "2025-06-01"))
        .and(query_param("checkout_date", "2025-06-04"))
        .and(query_param("adults_number", "2"))
        .and(header("x-rapidapi-key", "test-key"))
        .and(header("x-rapidapi-host", "127.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(ProviderKind::Booking, &server.uri());
    let query = adapter.build_query(&request());
    let raw = adapter.invoke(&query).await.expect("invoke should succeed");
    let listings = adapter.transform(raw).expect("transform should succeed");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].name, "Alfama Loft");
    assert!((listings[0].rating - 4.4).abs() < 1e-9);
    assert_eq!(listings[1].rating, 4.5);
}

#[tokio::test]
async fn non_success_status_maps_to_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hotels/list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = adapter(ProviderKind::Tripadvisor, &server.uri());
    let err = adapter
        .invoke(&adapter.build_query(&request()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Http { status: 503 }), "got {err:?}");
    assert_eq!(err.to_string(), "HTTP error: status 503");
}

#[tokio::test]
async fn invalid_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/hotels/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let adapter = adapter(ProviderKind::Hotels, &server.uri());
    let err = adapter
        .invoke(&adapter.build_query(&request()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn empty_body_transforms_to_no_listings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/hotels/search"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let adapter = adapter(ProviderKind::Hotels, &server.uri());
    let raw = adapter
        .invoke(&adapter.build_query(&request()))
        .await
        .expect("empty body is not an error");
    assert!(adapter.transform(raw).unwrap().is_empty());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = http_client(Duration::from_millis(200)).unwrap();
    let adapter = build_adapter(ProviderKind::Tripadvisor, client, &server.uri(), "k").unwrap();
    let err = adapter
        .invoke(&adapter.build_query(&request()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout(_)), "got {err:?}");
    assert!(stay_aggregator::classify(&err.to_string()).retryable);
}

#[tokio::test]
async fn unreachable_provider_is_network_error() {
    // port 9 (discard) is closed on test hosts
    let adapter = adapter(ProviderKind::Booking, "http://127.0.0.1:9");
    let err = adapter
        .invoke(&adapter.build_query(&request()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)), "got {err:?}");
    assert!(!err.to_string().contains("127.0.0.1"));
}
