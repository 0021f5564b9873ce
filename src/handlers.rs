use crate::client_ip::client_ip_from_headers;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::verification::{AddressOutcome, VerificationService};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Verification service wired with the process-lifetime provider clients.
    pub verifier: VerificationService,
}

/// Health check endpoint.
///
/// Returns the service status, version, and the verification target.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let policy = state.verifier.policy();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-geoverify-api",
            "version": env!("CARGO_PKG_VERSION"),
            "targetCountry": policy.country_name,
            "ipCheckEnabled": state.verifier.ip_check_enabled()
        })),
    )
}

fn outcome_status(outcome: &AddressOutcome) -> StatusCode {
    match outcome {
        AddressOutcome::Matched(_) => StatusCode::OK,
        AddressOutcome::NoMatch(_) => StatusCode::NOT_FOUND,
    }
}

/// GET /verify-address?address=...
///
/// Geocodes the address inside the target country and, when the IP check is
/// enabled, compares it with the country of the `X-Forwarded-For` client.
///
/// # Returns
///
/// * `200` with the verdict when the address was matched.
/// * `404` with a zero-confidence result when nothing matched.
/// * `400` when the address or client IP is missing, `500` when a provider fails.
pub async fn verify_address(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<VerificationResult>), AppError> {
    let Query(params) = query?;
    tracing::info!("GET /verify-address - params: {:?}", params);

    let address = params.address.unwrap_or_default();
    let client_ip = client_ip_from_headers(&headers);

    let outcome = state
        .verifier
        .verify_address(&address, client_ip.as_deref())
        .await
        .context("Geocoding or IP check failed")?;

    Ok((outcome_status(&outcome), Json(outcome.into_result())))
}

/// POST /verify-address/manual
///
/// Joins the manually entered fields into one address and verifies it the same
/// way as `GET /verify-address`. Replies with the submitted fields plus the verdict.
pub async fn verify_manual_address(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ManualAddressInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AddressPayload>), AppError> {
    let Json(input) = payload?;
    tracing::info!("POST /verify-address/manual - input: {:?}", input);

    let client_ip = client_ip_from_headers(&headers);
    let outcome = state
        .verifier
        .verify_manual_address(&input, client_ip.as_deref())
        .await
        .context("Geocoding or IP check failed")?;

    let payload = AddressPayload::new(input, outcome.result());
    Ok((outcome_status(&outcome), Json(payload)))
}

/// POST /verify-coordinates
///
/// Reverse-geocodes `{ latitude, longitude }` to the nearest address.
pub async fn verify_coordinates(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CoordinatesRequest>, JsonRejection>,
) -> Result<Json<VerificationResult>, AppError> {
    let Json(body) = payload?;
    tracing::info!(
        "POST /verify-coordinates - lat: {:?}, lng: {:?}",
        body.latitude,
        body.longitude
    );

    let result = state
        .verifier
        .verify_coordinates(body.latitude, body.longitude)
        .await
        .context("Geocoding failed")?;

    Ok(Json(result))
}
