//! Road routing between two points.
//!
//! The [`RoutingProvider`] trait abstracts a road-routing service. Callers
//! supply an origin, a destination and a per-call timeout and receive the
//! road route between them as a [`TripRoute`].
//!
//! Failures are reported as [`RoutingError`] values that callers can fold
//! into per-driver outcomes rather than aborting a whole discovery cycle.

mod error;
mod provider;

pub use error::RoutingError;
pub use provider::{RoutingProvider, TripRoute};
