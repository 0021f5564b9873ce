use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::circuit_breaker::{create_provider_circuit_breaker, guarded, ProviderCircuitBreaker};
use crate::config::Config;
use crate::errors::ProviderError;
use crate::models::GeocodeMatch;

const PROVIDER: &str = "Google Geocoding";

/// Forward and reverse geocoding.
///
/// Both lookups return `Ok(None)` when the provider has no match and an error
/// for every other non-success outcome.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Geocodes free-text `address`, restricted to results in `country_code`.
    async fn geocode(
        &self,
        address: &str,
        country_code: &str,
    ) -> Result<Option<GeocodeMatch>, ProviderError>;

    /// Resolves the address nearest to the given coordinates.
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<GeocodeMatch>, ProviderError>;
}

/// Raw envelope of the Google Geocoding API.
#[derive(Debug, Deserialize)]
struct GoogleGeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeMatch>,
    #[serde(default)]
    error_message: Option<String>,
}

impl GoogleGeocodeResponse {
    /// Maps the provider status onto zero/one match or a failure carrying the status.
    fn into_first_match(self) -> Result<Option<GeocodeMatch>, ProviderError> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next()),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(ProviderError::Status {
                provider: PROVIDER,
                status: self.status,
                message: self.error_message,
            }),
        }
    }
}

/// Client for the Google Geocoding web service.
#[derive(Clone)]
pub struct GoogleGeocodingClient {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: ProviderCircuitBreaker,
}

impl GoogleGeocodingClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.geocoding_base_url.clone(),
            api_key: config.google_maps_api_key.clone(),
            breaker: create_provider_circuit_breaker(),
        })
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<Option<GeocodeMatch>, ProviderError> {
        // Build URL with proper parameter encoding to prevent injection attacks
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("key", self.api_key.as_str()));
        let url = reqwest::Url::parse_with_params(&format!("{}/json", self.base_url), &query)
            .map_err(|e| ProviderError::Request(format!("Failed to build URL: {}", e)))?;

        // Redact key from logs to prevent credential exposure
        tracing::debug!("Geocoding URL: {}/json?{:?}&key=[REDACTED]", self.base_url, params);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Geocoding API returned error {}: {}", status, error_text);
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.to_string(),
                message: Some(error_text),
            });
        }

        let body: GoogleGeocodeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        tracing::debug!(
            "Geocoding status {} with {} result(s)",
            body.status,
            body.results.len()
        );
        body.into_first_match()
    }
}

#[async_trait]
impl GeocodingProvider for GoogleGeocodingClient {
    async fn geocode(
        &self,
        address: &str,
        country_code: &str,
    ) -> Result<Option<GeocodeMatch>, ProviderError> {
        tracing::info!("Geocoding address '{}' (country:{})", address, country_code);
        let components = format!("country:{}", country_code);
        guarded(
            &self.breaker,
            PROVIDER,
            self.fetch(&[("address", address), ("components", components.as_str())]),
        )
        .await
    }

    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<GeocodeMatch>, ProviderError> {
        tracing::info!("Reverse geocoding {},{}", latitude, longitude);
        let latlng = format!("{},{}", latitude, longitude);
        guarded(&self.breaker, PROVIDER, self.fetch(&[("latlng", latlng.as_str())])).await
    }
}
