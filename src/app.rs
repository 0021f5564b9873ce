use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::Config;
use crate::geocoding::GoogleGeocodingClient;
use crate::handlers::{self, AppState};
use crate::ip_geolocation::{CachedIpGeolocation, IpGeolocationClient, IpGeolocationProvider};
use crate::verification::{VerificationPolicy, VerificationService};

/// Request bodies are a handful of fields; anything larger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the application state with the real provider clients.
///
/// Clients are created once and shared by every request. An invalid
/// configuration is rejected before any client is built.
pub fn build_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    config.validate()?;

    let geocoder = Arc::new(GoogleGeocodingClient::new(&config)?);
    tracing::info!("✓ Geocoding client initialized: {}", config.geocoding_base_url);

    let ip_locator = match (config.ip_check_enabled, config.ip_geolocation_api_key.clone()) {
        (true, Some(api_key)) => {
            let client: Arc<dyn IpGeolocationProvider> =
                Arc::new(IpGeolocationClient::new(&config, api_key)?);
            tracing::info!(
                "✓ IP geolocation client initialized: {} (cache TTL {}s)",
                config.ip_geolocation_base_url,
                config.ip_cache_ttl_secs
            );
            Some(Arc::new(CachedIpGeolocation::new(
                client,
                Duration::from_secs(config.ip_cache_ttl_secs),
            )) as Arc<dyn IpGeolocationProvider>)
        }
        _ => None,
    };

    let verifier = VerificationService::new(geocoder, ip_locator, VerificationPolicy::from(&config));

    Ok(Arc::new(AppState { config, verifier }))
}

/// Verification routes, without the health check or rate limiting.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify-address", get(handlers::verify_address))
        .route("/verify-address/manual", post(handlers::verify_manual_address))
        .route("/verify-coordinates", post(handlers::verify_coordinates))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Full router around `api`, with the health check and shared middleware.
pub fn router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
