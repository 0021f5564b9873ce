/// Router-level tests
/// Drives the HTTP layer with in-process fake providers
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use rust_geoverify_api::app;
use rust_geoverify_api::config::Config;
use rust_geoverify_api::errors::ProviderError;
use rust_geoverify_api::geocoding::GeocodingProvider;
use rust_geoverify_api::handlers::AppState;
use rust_geoverify_api::ip_geolocation::IpGeolocationProvider;
use rust_geoverify_api::models::{AddressComponent, GeocodeMatch};
use rust_geoverify_api::verification::{VerificationPolicy, VerificationService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct StubGeocoder {
    result: Result<Option<GeocodeMatch>, ProviderError>,
}

#[async_trait]
impl GeocodingProvider for StubGeocoder {
    async fn geocode(
        &self,
        _address: &str,
        _country_code: &str,
    ) -> Result<Option<GeocodeMatch>, ProviderError> {
        self.result.clone()
    }

    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<GeocodeMatch>, ProviderError> {
        self.result.clone()
    }
}

struct StubIpLocator {
    result: Result<Option<String>, ProviderError>,
}

#[async_trait]
impl IpGeolocationProvider for StubIpLocator {
    async fn country_for_ip(&self, _ip: &str) -> Result<Option<String>, ProviderError> {
        self.result.clone()
    }
}

fn test_config() -> Config {
    Config {
        port: 0,
        google_maps_api_key: "unused".to_string(),
        ip_geolocation_api_key: Some("unused".to_string()),
        geocoding_base_url: "http://localhost".to_string(),
        ip_geolocation_base_url: "http://localhost".to_string(),
        target_country_code: "au".to_string(),
        target_country_name: "Australia".to_string(),
        verification_threshold: 0.8,
        ip_check_enabled: true,
        ip_cache_ttl_secs: 60,
        http_timeout_secs: 5,
        rate_limit_per_second: 10,
        rate_limit_burst: 20,
    }
}

fn place(country: &str, partial_match: bool) -> GeocodeMatch {
    GeocodeMatch {
        formatted_address: format!("1 Main St, Somewhere, {}", country),
        address_components: vec![AddressComponent {
            long_name: country.to_string(),
            short_name: String::new(),
            types: vec!["country".to_string()],
        }],
        partial_match,
    }
}

fn test_app(
    geocode: Result<Option<GeocodeMatch>, ProviderError>,
    ip_country: Option<&str>,
) -> axum::Router {
    test_app_with_ip_lookup(geocode, Ok(ip_country.map(str::to_string)))
}

fn test_app_with_ip_lookup(
    geocode: Result<Option<GeocodeMatch>, ProviderError>,
    ip_lookup: Result<Option<String>, ProviderError>,
) -> axum::Router {
    let ip_locator: Arc<dyn IpGeolocationProvider> = Arc::new(StubIpLocator { result: ip_lookup });
    let verifier = VerificationService::new(
        Arc::new(StubGeocoder { result: geocode }),
        Some(ip_locator),
        VerificationPolicy::default(),
    );
    let state = Arc::new(AppState {
        config: test_config(),
        verifier,
    });
    app::router(state, app::api_routes())
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get_address(query: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("/verify-address{}", query));
    if let Some(ip) = forwarded_for {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(Ok(None), None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "rust-geoverify-api");
    assert!(body.get("port").is_none());
}

#[tokio::test]
async fn test_missing_address_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));

    let (status, body) = send(app, get_address("", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Address is required");
}

#[tokio::test]
async fn test_missing_ip_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));

    let (status, body) = send(app, get_address("?address=1%20Main%20St", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unable to determine IP address");
}

#[tokio::test]
async fn test_verified_address() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));

    let (status, body) = send(app, get_address("?address=1%20Main%20St", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "confidence": 1.0,
            "isVerified": true,
            "fullAddress": "1 Main St, Somewhere, Australia",
            "country": "Australia",
            "ipCountry": "Australia"
        })
    );
}

#[tokio::test]
async fn test_new_zealand_address_is_mismatch() {
    let app = test_app(Ok(Some(place("New Zealand", false))), Some("Australia"));

    let (status, body) = send(app, get_address("?address=1%20Main%20St", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isVerified"], false);
    assert_eq!(body["country"], "New Zealand");
    assert!(body["error"].as_str().unwrap().contains("Country mismatch"));
}

#[tokio::test]
async fn test_no_geocoding_result_is_404_zero_confidence() {
    let app = test_app(Ok(None), Some("Australia"));

    let (status, body) = send(app, get_address("?address=nowhere", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["isVerified"], false);
    assert_eq!(body["error"], "No geocoding result found");
}

#[tokio::test]
async fn test_provider_failure_is_500() {
    let app = test_app(
        Err(ProviderError::Status {
            provider: "Google Geocoding",
            status: "OVER_QUERY_LIMIT".to_string(),
            message: None,
        }),
        Some("Australia"),
    );

    let (status, body) = send(app, get_address("?address=1%20Main%20St", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Geocoding or IP check failed");
    assert_eq!(body["details"], "Google Geocoding returned OVER_QUERY_LIMIT");
}

#[tokio::test]
async fn test_coordinates_missing_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), None);

    let (status, body) = send(app, post_json("/verify-coordinates", json!({ "latitude": -33.8 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Latitude and longitude are required");
}

#[tokio::test]
async fn test_coordinates_zero_is_valid() {
    let app = test_app(Ok(Some(place("Australia", false))), None);

    let (status, body) = send(
        app,
        post_json("/verify-coordinates", json!({ "latitude": 0, "longitude": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confidence"], 1.0);
    assert_eq!(body["isVerified"], true);
}

#[tokio::test]
async fn test_coordinates_without_result() {
    let app = test_app(Ok(None), None);

    let (status, body) = send(
        app,
        post_json("/verify-coordinates", json!({ "latitude": -33.8, "longitude": 151.2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "confidence": 0.0, "isVerified": false }));
}

#[tokio::test]
async fn test_coordinates_provider_failure_is_500() {
    let app = test_app(Err(ProviderError::Request("timed out".to_string())), None);

    let (status, body) = send(
        app,
        post_json("/verify-coordinates", json!({ "latitude": -33.8, "longitude": 151.2 })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Geocoding failed");
}

#[tokio::test]
async fn test_manual_address_blank_field_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));

    let (status, body) = send(
        app,
        post_json(
            "/verify-address/manual",
            json!({ "street": "1 Main St", "suburb": "Sydney", "state": "NSW", "country": "Australia" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Postcode is required");
}

#[tokio::test]
async fn test_manual_address_payload() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));

    let mut request = post_json(
        "/verify-address/manual",
        json!({
            "street": "1 Main St",
            "suburb": "Sydney",
            "state": "NSW",
            "postcode": "2000",
            "country": "Australia"
        }),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", "1.2.3.4".parse().unwrap());

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["street"], "1 Main St");
    assert_eq!(body["postcode"], "2000");
    assert_eq!(body["isVerified"], true);
    assert_eq!(body["fullAddress"], "1 Main St, Somewhere, Australia");
}

#[tokio::test]
async fn test_ip_lookup_failure_is_500() {
    let app = test_app_with_ip_lookup(
        Ok(Some(place("Australia", false))),
        Err(ProviderError::Status {
            provider: "IP Geolocation",
            status: "401 Unauthorized".to_string(),
            message: Some("IP Geolocation fetch failed: Invalid API key".to_string()),
        }),
    );

    let (status, body) = send(app, get_address("?address=1%20Main%20St", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Geocoding or IP check failed");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("IP Geolocation fetch failed: Invalid API key"));
}

#[tokio::test]
async fn test_ip_without_country_is_mismatch() {
    let app = test_app_with_ip_lookup(Ok(Some(place("Australia", false))), Ok(None));

    let (status, body) = send(app, get_address("?address=1%20Main%20St", Some("1.2.3.4"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isVerified"], false);
    assert_eq!(body["country"], "Australia");
    assert!(body.get("ipCountry").is_none());
    assert!(body["error"].as_str().unwrap().contains("Country mismatch"));
}

#[tokio::test]
async fn test_coordinates_as_strings_are_400() {
    let app = test_app(Ok(Some(place("Australia", false))), None);

    let (status, body) = send(
        app,
        post_json("/verify-coordinates", json!({ "latitude": "-33.8", "longitude": 151.2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_coordinates_without_body_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), None);
    let request = Request::builder()
        .method("POST")
        .uri("/verify-coordinates")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_manual_address_malformed_json_is_400() {
    let app = test_app(Ok(Some(place("Australia", false))), Some("Australia"));
    let request = Request::builder()
        .method("POST")
        .uri("/verify-address/manual")
        .header("content-type", "application/json")
        .body(Body::from("{\"street\": "))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}
