use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

/// Circuit breaker type shared by the upstream provider clients.
pub type ProviderCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates a circuit breaker for an upstream provider to prevent cascading failures.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// # States
///
/// - **CLOSED**: Normal operation, requests pass through.
/// - **OPEN**: Too many failures, requests fail fast.
/// - **HALF_OPEN**: Testing if service recovered.
///
/// A zero-result lookup is a success; only transport, status and decode
/// failures count towards the threshold.
pub fn create_provider_circuit_breaker() -> ProviderCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

/// Runs a provider call through `breaker`.
///
/// The call is made at most once. A rejection by an open breaker surfaces as
/// [`ProviderError::CircuitOpen`].
pub async fn guarded<T, F>(
    breaker: &ProviderCircuitBreaker,
    provider: &'static str,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match breaker.call(call).await {
        Ok(value) => Ok(value),
        Err(failsafe::Error::Inner(e)) => Err(e),
        Err(failsafe::Error::Rejected) => {
            tracing::warn!("{} circuit breaker is open, rejecting call", provider);
            Err(ProviderError::CircuitOpen(provider))
        }
    }
}
