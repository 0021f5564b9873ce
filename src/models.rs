use serde::{Deserialize, Serialize};

// ============ Verification Models ============

/// Outcome of a forward or reverse verification.
///
/// Built fresh for every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Match quality in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// True only when every verification gate passed.
    #[serde(default)]
    pub is_verified: bool,
    /// Provider-formatted address of the matched place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    /// Country the matched address lies in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Country inferred from the requester's IP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_country: Option<String>,
    /// Explanation when verification did not pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    /// Zero-confidence, unverified result.
    pub fn unverified() -> Self {
        Self {
            confidence: 0.0,
            is_verified: false,
            full_address: None,
            country: None,
            ip_country: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Address typed field by field when autocomplete could not find it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualAddressInput {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
}

impl ManualAddressInput {
    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("street", self.street.as_str()),
            ("suburb", self.suburb.as_str()),
            ("state", self.state.as_str()),
            ("postcode", self.postcode.as_str()),
            ("country", self.country.as_str()),
        ]
    }

    /// Returns the name of the first field that is empty after trimming.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }

    /// Joins the fields into the free-text query sent to forward verification.
    ///
    /// Order is street, suburb, state, postcode, country, separated by `", "`.
    pub fn to_query(&self) -> String {
        self.fields()
            .iter()
            .map(|(_, value)| value.trim())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Reply to a manual submission: the typed fields plus the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[serde(flatten)]
    pub address: ManualAddressInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl AddressPayload {
    pub fn new(address: ManualAddressInput, result: &VerificationResult) -> Self {
        Self {
            address,
            full_address: result.full_address.clone(),
            is_verified: result.is_verified,
        }
    }
}

// ============ Request Models ============

/// Query string of `GET /verify-address`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

/// Body of `POST /verify-coordinates`.
///
/// Both fields are optional so that an absent value can be reported as a 400
/// naming the field instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatesRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ============ Provider Models ============

/// One component of a geocoded address (street number, locality, country...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Best match returned by a geocoding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeMatch {
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    /// Set by the provider when only part of the query matched.
    #[serde(default)]
    pub partial_match: bool,
}

impl GeocodeMatch {
    /// Long name of the component tagged `country`, if any.
    pub fn country(&self) -> Option<&str> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == "country"))
            .map(|c| c.long_name.as_str())
    }
}
