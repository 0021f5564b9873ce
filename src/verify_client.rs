use crate::errors::AppError;
use crate::models::{AddressPayload, CoordinatesRequest, ManualAddressInput, VerificationResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the verification endpoints, used by UI collaborators.
///
/// Responses are relayed whatever their status. An error body such as
/// `{"error": "..."}` decodes as an unverified, zero-confidence result that
/// carries the message, so callers inspect `is_verified` rather than the status.
#[derive(Clone)]
pub struct VerifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl VerifyClient {
    /// Creates a new `VerifyClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the verification service.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create verify client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Verifies a free-text address.
    ///
    /// # Arguments
    ///
    /// * `address` - The address as typed or selected by the user.
    pub async fn verify_address(&self, address: &str) -> Result<VerificationResult, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/verify-address", self.base_url),
            &[("address", address)],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;
        tracing::info!("Verifying address via {}", self.base_url);

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Address verification request failed: {}", e))
        })?;

        Self::relay(response).await
    }

    /// Verifies a manually entered address.
    pub async fn verify_manual_address(
        &self,
        input: &ManualAddressInput,
    ) -> Result<AddressPayload, AppError> {
        let url = format!("{}/verify-address/manual", self.base_url);
        tracing::info!("Verifying manual address via {}", url);

        let response = self.client.post(&url).json(input).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Manual address request failed: {}", e))
        })?;

        Self::relay(response).await
    }

    /// Reverse-verifies a coordinate pair.
    ///
    /// # Arguments
    ///
    /// * `latitude` - Latitude in degrees.
    /// * `longitude` - Longitude in degrees.
    pub async fn verify_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<VerificationResult, AppError> {
        let url = format!("{}/verify-coordinates", self.base_url);
        tracing::info!("Verifying coordinates {},{} via {}", latitude, longitude, url);

        let body = CoordinatesRequest {
            latitude: Some(latitude),
            longitude: Some(longitude),
        };
        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Coordinate verification request failed: {}", e))
        })?;

        Self::relay(response).await
    }

    async fn relay<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Verification service returned {}", status);
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!(
                "Failed to parse verification response ({}): {}",
                status, e
            ))
        })
    }
}
