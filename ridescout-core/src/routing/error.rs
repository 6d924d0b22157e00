#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`crate::routing::RoutingProvider::route`].
///
/// Every variant is recoverable at the caller: a failed driver estimate is
/// reported as unavailable and a failed trip route leaves the last good
/// route in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RoutingError {
    /// The service could not be reached or answered with an HTTP error.
    #[error("routing service unreachable: {message}")]
    Unreachable { message: String },
    /// The call did not complete within its timeout.
    #[error("routing request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// The service found no road path between the points.
    #[error("no route found: {message}")]
    NoRoute { message: String },
    /// The service answered with a payload that could not be interpreted.
    #[error("malformed routing response: {message}")]
    MalformedResponse { message: String },
}

impl RoutingError {
    /// Timeout error for a call bounded by `timeout`.
    #[must_use]
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
