//! Single routing call for the rider's own trip.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use ridescout_core::{Coordinate, RoutingError, RoutingProvider, TripRoute};

/// Fetches the pickup-to-destination route shown on the map.
///
/// Runs independently of ranking. Callers decide what to show on failure;
/// [`crate::DiscoverySession`] keeps the last good route.
#[derive(Debug)]
pub struct TripRouteFetcher<R> {
    provider: Arc<R>,
}

impl<R> TripRouteFetcher<R>
where
    R: RoutingProvider,
{
    /// Construct a fetcher sharing `provider`.
    pub const fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }

    /// Fetch the route from `pickup` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`RoutingError`], or
    /// [`RoutingError::Timeout`] when `timeout` elapses first.
    pub async fn fetch_trip_route(
        &self,
        pickup: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<TripRoute, RoutingError> {
        debug!("fetching trip route");
        tokio::time::timeout(timeout, self.provider.route(pickup, destination, timeout))
            .await
            .unwrap_or_else(|_| Err(RoutingError::timeout(timeout)))
    }
}
