use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with an external API.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Innermost message, without the variant prefix used by `Display`.
    fn detail(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::ExternalApiError(msg)
            | AppError::InternalError(msg) => msg.clone(),
            AppError::WithContext { source, .. } => source.detail(),
        }
    }

    /// HTTP status the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalApiError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status_code(),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client errors echo their message. Upstream failures reply with a generic
    /// message and carry the raw provider message in `details`.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::BadRequest(msg) => json!({ "error": msg }),
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                json!({
                    "error": "External service error",
                    "details": msg,
                })
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": "Internal server error" })
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                if status.is_server_error() {
                    json!({
                        "error": context,
                        "details": source.detail(),
                    })
                } else {
                    json!({ "error": source.detail() })
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Failure reported by an upstream geocoding or IP-geolocation provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request never produced a response (connect, timeout, TLS...).
    Request(String),
    /// The provider answered but refused or failed the lookup.
    ///
    /// `status` keeps the provider's own code (e.g. `REQUEST_DENIED` or `403 Forbidden`).
    Status {
        provider: &'static str,
        status: String,
        message: Option<String>,
    },
    /// The response body could not be decoded.
    Decode(String),
    /// The provider's circuit breaker is open and the call was not attempted.
    CircuitOpen(&'static str),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Request(msg) => write!(f, "request failed: {}", msg),
            ProviderError::Status {
                provider,
                status,
                message: Some(message),
            } => write!(f, "{} returned {}: {}", provider, status, message),
            ProviderError::Status {
                provider, status, ..
            } => write!(f, "{} returned {}", provider, status),
            ProviderError::Decode(msg) => write!(f, "failed to decode response: {}", msg),
            ProviderError::CircuitOpen(provider) => {
                write!(f, "{} is unavailable (circuit open)", provider)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Malformed or mistyped JSON bodies are client errors like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }
}
