//! Address and coordinate verification.
//!
//! Forward verification geocodes a free-text address inside the target
//! country and, when an IP provider is configured, checks that the requester's
//! IP resolves to the same country. Reverse verification resolves coordinates
//! to the nearest address.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::geocoding::GeocodingProvider;
use crate::ip_geolocation::IpGeolocationProvider;
use crate::models::{ManualAddressInput, VerificationResult};

/// Confidence assigned to an exact geocoding match.
pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;
/// Confidence assigned when the provider flags a partial match.
pub const PARTIAL_MATCH_CONFIDENCE: f64 = 0.5;
/// Default minimum confidence for a verified result.
pub const DEFAULT_VERIFICATION_THRESHOLD: f64 = 0.8;

pub fn confidence_for(partial_match: bool) -> f64 {
    if partial_match {
        PARTIAL_MATCH_CONFIDENCE
    } else {
        EXACT_MATCH_CONFIDENCE
    }
}

pub fn meets_threshold(confidence: f64, threshold: f64) -> bool {
    confidence >= threshold
}

/// Target country and threshold every verdict is measured against.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    pub country_code: String,
    pub country_name: String,
    pub threshold: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            country_code: "au".to_string(),
            country_name: "Australia".to_string(),
            threshold: DEFAULT_VERIFICATION_THRESHOLD,
        }
    }
}

impl From<&Config> for VerificationPolicy {
    fn from(config: &Config) -> Self {
        Self {
            country_code: config.target_country_code.clone(),
            country_name: config.target_country_name.clone(),
            threshold: config.verification_threshold,
        }
    }
}

impl VerificationPolicy {
    fn is_target(&self, country: Option<&str>) -> bool {
        country == Some(self.country_name.as_str())
    }
}

/// Result of forward verification.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressOutcome {
    /// The geocoder matched the address; the result carries the verdict.
    Matched(VerificationResult),
    /// The geocoder found nothing. Zero confidence, not an error.
    NoMatch(VerificationResult),
}

impl AddressOutcome {
    pub fn result(&self) -> &VerificationResult {
        match self {
            AddressOutcome::Matched(r) | AddressOutcome::NoMatch(r) => r,
        }
    }

    pub fn into_result(self) -> VerificationResult {
        match self {
            AddressOutcome::Matched(r) | AddressOutcome::NoMatch(r) => r,
        }
    }
}

/// Verification entry point shared by every handler.
///
/// Providers are constructed once at startup and injected here. Without an IP
/// provider the service runs the address-only variant.
#[derive(Clone)]
pub struct VerificationService {
    geocoder: Arc<dyn GeocodingProvider>,
    ip_locator: Option<Arc<dyn IpGeolocationProvider>>,
    policy: VerificationPolicy,
}

impl VerificationService {
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        ip_locator: Option<Arc<dyn IpGeolocationProvider>>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            geocoder,
            ip_locator,
            policy,
        }
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    pub fn ip_check_enabled(&self) -> bool {
        self.ip_locator.is_some()
    }

    /// Verifies a free-text address.
    ///
    /// # Errors
    ///
    /// * `BadRequest` when the address is blank, or when the IP check is
    ///   enabled and no client IP is known.
    /// * `ExternalApiError` when either provider fails.
    pub async fn verify_address(
        &self,
        address: &str,
        client_ip: Option<&str>,
    ) -> Result<AddressOutcome, AppError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::BadRequest("Address is required".to_string()));
        }

        let ip_check = match (&self.ip_locator, client_ip) {
            (Some(locator), Some(ip)) => Some((locator, ip)),
            (Some(_), None) => {
                return Err(AppError::BadRequest(
                    "Unable to determine IP address".to_string(),
                ))
            }
            (None, _) => None,
        };

        let Some(matched) = self
            .geocoder
            .geocode(address, &self.policy.country_code)
            .await?
        else {
            tracing::info!("No geocoding result for '{}'", address);
            return Ok(AddressOutcome::NoMatch(
                VerificationResult::unverified().with_error("No geocoding result found"),
            ));
        };

        let confidence = confidence_for(matched.partial_match);
        let country = matched.country().map(str::to_string);
        let address_ok = self.policy.is_target(country.as_deref())
            && meets_threshold(confidence, self.policy.threshold);

        let mut result = VerificationResult {
            confidence,
            is_verified: false,
            full_address: Some(matched.formatted_address),
            country,
            ip_country: None,
            error: None,
        };

        match ip_check {
            Some((locator, ip)) => {
                result.ip_country = locator.country_for_ip(ip).await?;
                let ip_ok = self.policy.is_target(result.ip_country.as_deref());

                if address_ok && ip_ok {
                    result.is_verified = true;
                } else {
                    result.error = Some(format!(
                        "Country mismatch: the IP does not match the address country or is not in {}.",
                        self.policy.country_name
                    ));
                }
            }
            None => {
                if address_ok {
                    result.is_verified = true;
                } else {
                    result.error = Some(format!(
                        "Country mismatch: the address is not in {} or matched with low confidence.",
                        self.policy.country_name
                    ));
                }
            }
        }

        tracing::info!(
            "Address verification: verified={}, confidence={}, country={:?}, ip_country={:?}",
            result.is_verified,
            result.confidence,
            result.country,
            result.ip_country
        );

        Ok(AddressOutcome::Matched(result))
    }

    /// Verifies a manually entered address by joining its fields.
    pub async fn verify_manual_address(
        &self,
        input: &ManualAddressInput,
        client_ip: Option<&str>,
    ) -> Result<AddressOutcome, AppError> {
        if let Some(field) = input.first_missing_field() {
            return Err(AppError::BadRequest(format!("{} is required", capitalize(field))));
        }

        self.verify_address(&input.to_query(), client_ip).await
    }

    /// Reverse-geocodes coordinates and reports the resolved address.
    ///
    /// Zero is a valid latitude and longitude; only absent, non-finite or
    /// out-of-range values are rejected.
    pub async fn verify_coordinates(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<VerificationResult, AppError> {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(AppError::BadRequest(
                "Latitude and longitude are required".to_string(),
            ));
        };
        validate_coordinates(latitude, longitude)?;

        let Some(matched) = self.geocoder.reverse_geocode(latitude, longitude).await? else {
            tracing::info!("No reverse geocoding result for {},{}", latitude, longitude);
            return Ok(VerificationResult::unverified());
        };

        let Some(country) = matched.country().map(str::to_string) else {
            tracing::info!("Reverse geocoding result has no country component");
            return Ok(VerificationResult::unverified());
        };

        let confidence = EXACT_MATCH_CONFIDENCE;
        Ok(VerificationResult {
            confidence,
            is_verified: meets_threshold(confidence, self.policy.threshold),
            full_address: Some(matched.formatted_address),
            country: Some(country),
            ip_country: None,
            error: None,
        })
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::BadRequest(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::BadRequest(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
