//! The per-request discovery workflow.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use ridescout_core::{
    ConfigError, Coordinate, DestinationMarker, DiscoveryInput, DiscoveryPhase, DiscoveryResult,
    DriverSource, DriverSourceError, EngineConfig, InvalidInputError, MapMarker, PricingConfig,
    Region, RoutingError, RoutingProvider, TripRoute, bounding_region, build_markers,
    mark_selected,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{EtaRanker, RankingLimits, TripRouteFetcher};

/// Ways a discovery cycle can fail as a whole.
///
/// Per-driver routing failures never appear here; they are reported inside
/// [`DiscoveryResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// The input cannot produce a cycle, for example no rider position.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    /// The driver list could not be fetched.
    #[error("failed to fetch drivers: {0}")]
    DriverSource(#[from] DriverSourceError),
    /// A newer call on the same session replaced this one.
    #[error("discovery superseded by a newer request")]
    Superseded,
}

/// Publishes the phases of one cycle.
///
/// A guarded reporter goes quiet once its cycle is cancelled. The check runs
/// under the channel's write lock, so a cancelled cycle cannot overwrite a
/// phase published by the cycle that replaced it.
pub(crate) struct PhaseReporter<'a> {
    sender: &'a watch::Sender<DiscoveryPhase>,
    cancelled: Option<&'a CancellationToken>,
}

impl<'a> PhaseReporter<'a> {
    pub(crate) const fn new(sender: &'a watch::Sender<DiscoveryPhase>) -> Self {
        Self {
            sender,
            cancelled: None,
        }
    }

    pub(crate) const fn guarded(
        sender: &'a watch::Sender<DiscoveryPhase>,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            sender,
            cancelled: Some(token),
        }
    }

    fn report(&self, next: DiscoveryPhase) {
        self.sender.send_if_modified(|current| {
            if self.cancelled.is_some_and(CancellationToken::is_cancelled) {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Validated state shared by the concurrent parts of a cycle.
struct PreparedCycle {
    rider: Coordinate,
    destination: Option<Coordinate>,
    markers: Vec<MapMarker>,
    skipped_driver_ids: Vec<String>,
    region: Region,
}

/// Composes framing, markers, ranking and the trip route into one cycle.
///
/// The engine holds no per-cycle state, so one instance may serve many
/// concurrent cycles. Supersede semantics live in
/// [`crate::DiscoverySession`].
#[derive(Debug)]
pub struct DiscoveryEngine<R> {
    ranker: EtaRanker<R>,
    trips: TripRouteFetcher<R>,
    config: EngineConfig,
}

impl<R> DiscoveryEngine<R>
where
    R: RoutingProvider + 'static,
{
    /// Construct an engine over `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` or `pricing` is out of range.
    pub fn new(provider: R, config: EngineConfig, pricing: PricingConfig) -> Result<Self, ConfigError> {
        Self::with_shared_provider(Arc::new(provider), config, pricing)
    }

    /// Construct an engine over a provider that is shared elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` or `pricing` is out of range.
    pub fn with_shared_provider(
        provider: Arc<R>,
        config: EngineConfig,
        pricing: PricingConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        pricing.validate()?;
        Ok(Self {
            ranker: EtaRanker::new(Arc::clone(&provider), pricing),
            trips: TripRouteFetcher::new(provider),
            config,
        })
    }

    /// Settings the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pricing rates applied to ranked drivers.
    #[must_use]
    pub const fn pricing(&self) -> &PricingConfig {
        self.ranker.pricing()
    }

    /// Run one discovery cycle over `input`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidInput`] when the rider position is
    /// missing or any supplied coordinate is out of range. Routing failures
    /// are reported inside the result.
    pub async fn discover(&self, input: &DiscoveryInput) -> Result<DiscoveryResult, DiscoveryError> {
        let (sender, _) = watch::channel(DiscoveryPhase::Idle);
        self.discover_observed(input, &PhaseReporter::new(&sender))
            .await
    }

    /// Fetch drivers for `rider_id` from `source`, then run a cycle.
    ///
    /// The drivers in `input` are replaced by the fetched list.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::DriverSource`] when the source fails, and
    /// the errors of [`Self::discover`] otherwise.
    pub async fn discover_from_source<S>(
        &self,
        source: &S,
        rider_id: &str,
        input: DiscoveryInput,
    ) -> Result<DiscoveryResult, DiscoveryError>
    where
        S: DriverSource + ?Sized,
    {
        let (sender, _) = watch::channel(DiscoveryPhase::Idle);
        self.discover_from_source_observed(source, rider_id, input, &PhaseReporter::new(&sender))
            .await
    }

    pub(crate) async fn discover_from_source_observed<S>(
        &self,
        source: &S,
        rider_id: &str,
        mut input: DiscoveryInput,
        phase: &PhaseReporter<'_>,
    ) -> Result<DiscoveryResult, DiscoveryError>
    where
        S: DriverSource + ?Sized,
    {
        phase.report(DiscoveryPhase::FetchingDrivers);
        match source.fetch_drivers(rider_id).await {
            Ok(drivers) => {
                debug!("driver source returned {} drivers", drivers.len());
                input.drivers = drivers;
            }
            Err(err) => {
                warn!("driver source failed for rider {rider_id}: {err}");
                phase.report(DiscoveryPhase::Failed);
                return Err(err.into());
            }
        }
        self.discover_observed(&input, phase).await
    }

    pub(crate) async fn discover_observed(
        &self,
        input: &DiscoveryInput,
        phase: &PhaseReporter<'_>,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        phase.report(DiscoveryPhase::ComputingRegion);
        let prepared = self.prepare(input).map_err(|err| {
            warn!("discovery aborted: {err}");
            phase.report(DiscoveryPhase::Failed);
            err
        })?;

        phase.report(DiscoveryPhase::RankingDrivers);
        let trip_settled = AtomicBool::new(prepared.destination.is_none());
        let ranking = async {
            let outcome = self
                .ranker
                .rank_drivers(
                    &prepared.markers,
                    prepared.rider,
                    RankingLimits::from(&self.config),
                )
                .await;
            if !trip_settled.load(Ordering::SeqCst) {
                phase.report(DiscoveryPhase::FetchingTripRoute);
            }
            outcome
        };
        let trip_fetch = async {
            let fetched = self.fetch_trip(prepared.rider, prepared.destination).await;
            trip_settled.store(true, Ordering::SeqCst);
            fetched
        };
        let (outcome, trip) = tokio::join!(ranking, trip_fetch);

        let unavailable_driver_ids = outcome.unavailable_driver_ids();
        let (trip_route, trip_route_error) = split_trip(trip);
        info!(
            "discovery ready: {} ranked, {} unavailable, {} skipped",
            outcome.ranking.ranked.len(),
            unavailable_driver_ids.len(),
            prepared.skipped_driver_ids.len()
        );
        phase.report(DiscoveryPhase::Ready);

        Ok(DiscoveryResult {
            region: prepared.region,
            markers: prepared.markers,
            destination_marker: prepared.destination.map(DestinationMarker::new),
            ranked: outcome.ranking.ranked,
            unavailable_driver_ids,
            unavailable: outcome.ranking.unavailable,
            skipped_driver_ids: prepared.skipped_driver_ids,
            trip_route,
            trip_route_error,
            trip_route_stale: false,
            timed_out: outcome.timed_out,
        })
    }

    async fn fetch_trip(
        &self,
        pickup: Coordinate,
        destination: Option<Coordinate>,
    ) -> Option<Result<TripRoute, RoutingError>> {
        let target = destination?;
        Some(
            self.trips
                .fetch_trip_route(pickup, target, self.config.per_call_timeout)
                .await,
        )
    }

    fn prepare(&self, input: &DiscoveryInput) -> Result<PreparedCycle, InvalidInputError> {
        let rider = input
            .rider_position
            .ok_or(InvalidInputError::MissingRiderPosition)?
            .require_valid("rider_position")?;
        let destination = input
            .destination
            .map(|point| point.require_valid("destination"))
            .transpose()?;

        let batch = build_markers(&input.drivers, rider);
        let mut markers = batch.markers;
        if let Some(selected) = input.selected_driver_id.as_deref() {
            markers = mark_selected(&markers, selected);
        }
        let region = self.frame(rider, destination, &markers)?;

        Ok(PreparedCycle {
            rider,
            destination,
            markers,
            skipped_driver_ids: batch.skipped_driver_ids,
            region,
        })
    }

    /// Frame the rider, the destination and every placed driver.
    fn frame(
        &self,
        rider: Coordinate,
        destination: Option<Coordinate>,
        markers: &[MapMarker],
    ) -> Result<Region, InvalidInputError> {
        let points: Vec<Coordinate> = std::iter::once(rider)
            .chain(destination)
            .chain(markers.iter().map(|marker| marker.coordinate))
            .collect();
        if points.len() == 1 {
            return Ok(Region::around(rider, self.config.default_span_degrees));
        }
        Ok(bounding_region(&points, self.config.region_padding)?
            .with_minimum_span(self.config.default_span_degrees))
    }
}

fn split_trip(
    trip: Option<Result<TripRoute, RoutingError>>,
) -> (Option<TripRoute>, Option<RoutingError>) {
    match trip {
        Some(Ok(route)) => (Some(route), None),
        Some(Err(err)) => {
            warn!("trip route unavailable: {err}");
            (None, Some(err))
        }
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Script, ScriptedRoutingProvider};
    use ridescout_core::DriverRecord;
    use ridescout_core::test_support::StaticDriverSource;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rider() -> Coordinate {
        Coordinate::unchecked(40.0, -75.0)
    }

    fn engine(provider: ScriptedRoutingProvider) -> DiscoveryEngine<ScriptedRoutingProvider> {
        DiscoveryEngine::new(provider, EngineConfig::default(), PricingConfig::default())
            .expect("default config is valid")
    }

    #[rstest]
    fn rejects_invalid_configuration() {
        let config = EngineConfig {
            concurrency_limit: 0,
            ..EngineConfig::default()
        };
        let result =
            DiscoveryEngine::new(ScriptedRoutingProvider::new(), config, PricingConfig::default());
        assert!(matches!(result, Err(ConfigError::ZeroConcurrency)));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn missing_rider_position_fails_the_cycle() {
        let engine = engine(ScriptedRoutingProvider::new());
        let (sender, watcher) = watch::channel(DiscoveryPhase::Idle);

        let err = engine
            .discover_observed(&DiscoveryInput::default(), &PhaseReporter::new(&sender))
            .await
            .expect_err("no rider");

        assert_eq!(
            err,
            DiscoveryError::InvalidInput(InvalidInputError::MissingRiderPosition)
        );
        assert_eq!(*watcher.borrow(), DiscoveryPhase::Failed);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cancelled_cycle_stops_publishing_phases(rider: Coordinate) {
        let engine = engine(ScriptedRoutingProvider::new());
        let (sender, watcher) = watch::channel(DiscoveryPhase::Idle);
        let token = CancellationToken::new();
        token.cancel();
        sender.send_replace(DiscoveryPhase::ComputingRegion);

        let input = DiscoveryInput {
            rider_position: Some(rider),
            ..DiscoveryInput::default()
        };
        engine
            .discover_observed(&input, &PhaseReporter::guarded(&sender, &token))
            .await
            .expect("cycle still completes");

        assert_eq!(*watcher.borrow(), DiscoveryPhase::ComputingRegion);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn invalid_destination_fails_the_cycle(rider: Coordinate) {
        let engine = engine(ScriptedRoutingProvider::new());
        let input = DiscoveryInput {
            rider_position: Some(rider),
            destination: Some(Coordinate::unchecked(40.0, 200.0)),
            ..DiscoveryInput::default()
        };

        let err = engine.discover(&input).await.expect_err("bad destination");

        assert!(matches!(
            err,
            DiscoveryError::InvalidInput(InvalidInputError::InvalidCoordinate {
                field: "destination",
                ..
            })
        ));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn lone_rider_gets_the_default_span(rider: Coordinate) {
        let engine = engine(ScriptedRoutingProvider::new());
        let input = DiscoveryInput {
            rider_position: Some(rider),
            ..DiscoveryInput::default()
        };

        let result = engine.discover(&input).await.expect("cycle succeeds");

        assert_eq!(result.region, Region::around(rider, 0.01));
        assert!(result.ranked.is_empty());
        assert!(result.trip_route.is_none());
        assert!(result.destination_marker.is_none());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn selection_and_skips_flow_into_the_result(rider: Coordinate) {
        let engine = engine(ScriptedRoutingProvider::new());
        let input = DiscoveryInput {
            rider_position: Some(rider),
            destination: None,
            drivers: vec![
                DriverRecord::new("a", Coordinate::unchecked(40.01, -75.0), "Ann"),
                DriverRecord::new("b", Coordinate::unchecked(-95.0, -75.0), "Bad"),
                DriverRecord::new("c", Coordinate::unchecked(40.0, -75.01), "Cal"),
            ],
            selected_driver_id: Some("c".to_owned()),
        };

        let result = engine.discover(&input).await.expect("cycle succeeds");

        assert_eq!(result.skipped_driver_ids, vec!["b".to_owned()]);
        let selected: Vec<_> = result
            .markers
            .iter()
            .filter(|m| m.is_selected)
            .map(|m| m.driver_id.as_str())
            .collect();
        assert_eq!(selected, vec!["c"]);
        assert_eq!(result.ranked.len(), 2);
        assert!(!result.unavailable_driver_ids.contains("b"));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn failed_trip_route_is_reported_not_fatal(rider: Coordinate) {
        let provider = ScriptedRoutingProvider::new().script(
            rider,
            Script::failure(RoutingError::NoRoute {
                message: "island".to_owned(),
            }),
        );
        let engine = engine(provider);
        let input = DiscoveryInput {
            rider_position: Some(rider),
            destination: Some(Coordinate::unchecked(40.1, -75.1)),
            ..DiscoveryInput::default()
        };

        let result = engine.discover(&input).await.expect("cycle succeeds");

        assert!(result.trip_route.is_none());
        assert!(matches!(
            result.trip_route_error,
            Some(RoutingError::NoRoute { .. })
        ));
        assert_eq!(
            result.destination_marker.map(|m| m.title),
            Some("Destination".to_owned())
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn drivers_come_from_the_source(rider: Coordinate) {
        let source = StaticDriverSource::with_drivers(
            "rider-1",
            vec![DriverRecord::new(
                "d-1",
                Coordinate::unchecked(40.01, -75.0),
                "Dee",
            )],
        );
        let engine = engine(ScriptedRoutingProvider::new());
        let input = DiscoveryInput {
            rider_position: Some(rider),
            ..DiscoveryInput::default()
        };

        let result = engine
            .discover_from_source(&source, "rider-1", input.clone())
            .await
            .expect("known rider");
        assert_eq!(result.markers.len(), 1);

        let err = engine
            .discover_from_source(&source, "stranger", input)
            .await
            .expect_err("unknown rider");
        assert!(matches!(err, DiscoveryError::DriverSource(_)));
    }
}
