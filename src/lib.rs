//! Address Verification API Library
//!
//! This library verifies that a postal address lies inside a target country
//! (Australia by default) and that the requester's IP agrees with it, and
//! reverse-geocodes coordinates back to a formatted address.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core verification logic.
//! - `integrations`: External service integrations.
//! - `app`: Router and state construction.
//! - `circuit_breaker`: Circuit breaker for upstream providers.
//! - `client_ip`: Client IP extraction from forwarded headers.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `geocoding`: Geocoding provider (Google Geocoding API).
//! - `handlers`: HTTP request handlers.
//! - `ip_geolocation`: IP geolocation provider (ipgeolocation.io) and cache.
//! - `models`: Request, response and provider models.
//! - `verification`: Verification service and verdict rules.
//! - `verify_client`: Client for the verification endpoints.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod app;
pub mod circuit_breaker;
pub mod client_ip;
pub mod config;
pub mod errors;
pub mod geocoding;
pub mod handlers;
pub mod ip_geolocation;
pub mod models;
pub mod verification;
pub mod verify_client;
