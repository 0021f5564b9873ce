use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::circuit_breaker::{create_provider_circuit_breaker, guarded, ProviderCircuitBreaker};
use crate::config::Config;
use crate::errors::ProviderError;

const PROVIDER: &str = "IP Geolocation";
const IP_CACHE_MAX_CAPACITY: u64 = 10_000;

/// IP address to country lookup.
#[async_trait]
pub trait IpGeolocationProvider: Send + Sync {
    /// Country name associated with `ip`, or `None` when the provider has none.
    async fn country_for_ip(&self, ip: &str) -> Result<Option<String>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct IpGeoResponse {
    #[serde(default)]
    location: Option<IpGeoLocation>,
}

#[derive(Debug, Deserialize)]
struct IpGeoLocation {
    #[serde(default)]
    country_name: Option<String>,
}

/// Client for the ipgeolocation.io v2 API.
#[derive(Clone)]
pub struct IpGeolocationClient {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: ProviderCircuitBreaker,
}

impl IpGeolocationClient {
    pub fn new(config: &Config, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.ip_geolocation_base_url.clone(),
            api_key,
            breaker: create_provider_circuit_breaker(),
        })
    }

    async fn fetch_country(&self, ip: &str) -> Result<Option<String>, ProviderError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v2/ipgeo", self.base_url),
            &[("apiKey", self.api_key.as_str()), ("ip", ip)],
        )
        .map_err(|e| ProviderError::Request(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("IP Geolocation URL: {}/v2/ipgeo?apiKey=[REDACTED]&ip={}", self.base_url, ip);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("IP Geolocation returned error {}: {}", status, text);
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.to_string(),
                message: Some(format!("IP Geolocation fetch failed: {}", text)),
            });
        }

        let body: IpGeoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(body.location.and_then(|l| l.country_name))
    }
}

#[async_trait]
impl IpGeolocationProvider for IpGeolocationClient {
    async fn country_for_ip(&self, ip: &str) -> Result<Option<String>, ProviderError> {
        tracing::info!("Looking up country for IP {}", ip);
        guarded(&self.breaker, PROVIDER, self.fetch_country(ip)).await
    }
}

/// Memoises successful lookups of an inner provider.
///
/// Concurrent lookups of the same IP share one upstream call. Failures are
/// returned to every waiter and are not cached.
pub struct CachedIpGeolocation {
    inner: Arc<dyn IpGeolocationProvider>,
    cache: Cache<String, Option<String>>,
}

impl CachedIpGeolocation {
    pub fn new(inner: Arc<dyn IpGeolocationProvider>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(IP_CACHE_MAX_CAPACITY)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl IpGeolocationProvider for CachedIpGeolocation {
    async fn country_for_ip(&self, ip: &str) -> Result<Option<String>, ProviderError> {
        self.cache
            .try_get_with(ip.to_string(), async {
                tracing::trace!("IP cache miss for {}, querying provider", ip);
                self.inner.country_for_ip(ip).await
            })
            .await
            .map_err(|e| (*e).clone())
    }
}
