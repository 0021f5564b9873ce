//! Client IP extraction for the IP-aware verification variant.

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Returns the originating client from an `X-Forwarded-For` value.
///
/// Proxies append to the header, so the client is the first entry.
/// Blank entries yield `None`.
pub fn first_forwarded_ip(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

/// Client IP taken from the request's `X-Forwarded-For` header.
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    first_forwarded_ip(raw).map(str::to_string)
}
