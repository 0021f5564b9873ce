use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub google_maps_api_key: String,
    pub ip_geolocation_api_key: Option<String>,
    pub geocoding_base_url: String,
    pub ip_geolocation_base_url: String,
    /// ISO 3166-1 alpha-2 code passed to the geocoder's country filter.
    pub target_country_code: String,
    /// Long country name both the address and the IP lookup must report.
    pub target_country_name: String,
    pub verification_threshold: f64,
    /// Enables the IP-aware variant of forward verification.
    pub ip_check_enabled: bool,
    pub ip_cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode";
const DEFAULT_IP_GEOLOCATION_BASE_URL: &str = "https://api.ipgeolocation.io";

/// Longest IP cache TTL accepted (one week).
const MAX_IP_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
/// Longest outbound HTTP timeout accepted.
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let ip_check_enabled = parse_bool("IP_CHECK_ENABLED", true)?;

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            google_maps_api_key: std::env::var("GOOGLE_MAPS_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_MAPS_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GOOGLE_MAPS_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            ip_geolocation_api_key: match std::env::var("IP_GEOLOCATION_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty())
            {
                Some(key) => Some(key),
                None if ip_check_enabled => anyhow::bail!(
                    "IP_GEOLOCATION_API_KEY environment variable required when IP_CHECK_ENABLED is true"
                ),
                None => None,
            },
            geocoding_base_url: parse_url("GEOCODING_BASE_URL", DEFAULT_GEOCODING_BASE_URL)?,
            ip_geolocation_base_url: parse_url(
                "IP_GEOLOCATION_BASE_URL",
                DEFAULT_IP_GEOLOCATION_BASE_URL,
            )?,
            target_country_code: std::env::var("TARGET_COUNTRY_CODE")
                .unwrap_or_else(|_| "au".to_string())
                .trim()
                .to_lowercase(),
            target_country_name: std::env::var("TARGET_COUNTRY_NAME")
                .unwrap_or_else(|_| "Australia".to_string())
                .trim()
                .to_string(),
            verification_threshold: std::env::var("VERIFICATION_THRESHOLD")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("VERIFICATION_THRESHOLD must be a number"))
                .and_then(|t| {
                    if !(0.0..=1.0).contains(&t) {
                        anyhow::bail!("VERIFICATION_THRESHOLD must be between 0 and 1");
                    }
                    Ok(t)
                })?,
            ip_check_enabled,
            ip_cache_ttl_secs: parse_u64("IP_CACHE_TTL_SECS", 900)?,
            http_timeout_secs: parse_u64("HTTP_TIMEOUT_SECS", 10)?,
            rate_limit_per_second: parse_u64("RATE_LIMIT_PER_SECOND", 10)?,
            rate_limit_burst: u32::try_from(parse_u64("RATE_LIMIT_BURST", 20)?)
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must fit in 32 bits"))?,
        };

        config.validate()?;

        // Log successful configuration load (without API keys)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Geocoding Base URL: {}", config.geocoding_base_url);
        tracing::debug!("IP Geolocation Base URL: {}", config.ip_geolocation_base_url);
        tracing::debug!(
            "Target country: {} ({})",
            config.target_country_name,
            config.target_country_code
        );
        if !config.ip_check_enabled {
            tracing::warn!("IP_CHECK_ENABLED is false - addresses are verified without an IP check");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Checks the invariants the rest of the service relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.target_country_code.len() != 2 {
            anyhow::bail!("TARGET_COUNTRY_CODE must be a two-letter country code");
        }
        if self.target_country_name.is_empty() {
            anyhow::bail!("TARGET_COUNTRY_NAME cannot be empty");
        }
        if !(0.0..=1.0).contains(&self.verification_threshold) {
            anyhow::bail!("VERIFICATION_THRESHOLD must be between 0 and 1");
        }
        if self.ip_check_enabled && self.ip_geolocation_api_key.is_none() {
            anyhow::bail!("IP_GEOLOCATION_API_KEY is required when IP_CHECK_ENABLED is true");
        }
        if !(1..=MAX_IP_CACHE_TTL_SECS).contains(&self.ip_cache_ttl_secs) {
            anyhow::bail!(
                "IP_CACHE_TTL_SECS must be between 1 and {}",
                MAX_IP_CACHE_TTL_SECS
            );
        }
        if !(1..=MAX_HTTP_TIMEOUT_SECS).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "HTTP_TIMEOUT_SECS must be between 1 and {}",
                MAX_HTTP_TIMEOUT_SECS
            );
        }
        if self.rate_limit_per_second == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND must be at least 1");
        }
        if self.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_BURST must be at least 1");
        }
        Ok(())
    }
}

fn parse_url(key: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(key).unwrap_or_else(|_| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer", key)),
        Err(_) => Ok(default),
    }
}

fn parse_bool(key: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be true or false", key),
        },
        Err(_) => Ok(default),
    }
}
