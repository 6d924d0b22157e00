//! Routing provider trait and the route it returns.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Coordinate;

use super::error::RoutingError;

/// Road route between two points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TripRoute {
    /// Ordered points along the road path, origin first.
    pub polyline: Vec<Coordinate>,
    /// Expected travel time in seconds.
    pub duration_seconds: f64,
    /// Road distance in metres.
    pub distance_meters: f64,
}

/// Fetch road routes between two coordinates.
///
/// Implementations must be safe to call concurrently from many tasks and
/// must honour `timeout`, returning [`RoutingError::Timeout`] when it
/// elapses. Callers still enforce their own deadline around each call.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use ridescout_core::{Coordinate, RoutingError, RoutingProvider, TripRoute};
///
/// struct StraightLine;
///
/// #[async_trait]
/// impl RoutingProvider for StraightLine {
///     async fn route(
///         &self,
///         origin: Coordinate,
///         destination: Coordinate,
///         _timeout: Duration,
///     ) -> Result<TripRoute, RoutingError> {
///         let meters = ridescout_core::distance(origin, destination);
///         Ok(TripRoute {
///             polyline: vec![origin, destination],
///             duration_seconds: meters / 10.0,
///             distance_meters: meters,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Return the road route from `origin` to `destination`.
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<TripRoute, RoutingError>;
}

#[async_trait]
impl<T> RoutingProvider for std::sync::Arc<T>
where
    T: RoutingProvider + ?Sized,
{
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<TripRoute, RoutingError> {
        (**self).route(origin, destination, timeout).await
    }
}
