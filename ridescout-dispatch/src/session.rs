//! Supersede-on-new-input wrapper around [`DiscoveryEngine`].

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use ridescout_core::{
    Coordinate, DiscoveryInput, DiscoveryPhase, DiscoveryResult, DriverSource, RoutingProvider,
    TripRoute,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::engine::PhaseReporter;
use crate::{DiscoveryEngine, DiscoveryError};

/// Trip route kept from the last cycle that fetched one successfully.
#[derive(Debug, Clone)]
struct RetainedTrip {
    destination: Coordinate,
    route: TripRoute,
}

/// One logical rider session.
///
/// Only the latest call matters: starting a new `discover` cancels the
/// previous call, aborting its outstanding routing requests, and the
/// previous caller receives [`DiscoveryError::Superseded`]. Between calls
/// the session remembers the last good trip route so that a failed refresh
/// toward the same destination keeps the old route on screen.
///
/// # Examples
///
/// ```rust,no_run
/// use ridescout_core::{Coordinate, DiscoveryInput, EngineConfig, PricingConfig};
/// use ridescout_dispatch::{DiscoveryEngine, DiscoverySession};
/// # use ridescout_core::RoutingProvider;
///
/// # async fn demo<R: RoutingProvider + 'static>(provider: R) -> Result<(), Box<dyn std::error::Error>> {
/// let engine = DiscoveryEngine::new(provider, EngineConfig::default(), PricingConfig::default())?;
/// let session = DiscoverySession::new(engine);
/// let mut phases = session.subscribe();
///
/// let input = DiscoveryInput {
///     rider_position: Some(Coordinate::new(40.0, -75.0)?),
///     ..DiscoveryInput::default()
/// };
/// let result = session.discover(&input).await?;
/// assert!(phases.borrow_and_update().is_terminal());
/// println!("{} drivers ranked", result.ranked.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DiscoverySession<R> {
    engine: Arc<DiscoveryEngine<R>>,
    current: Mutex<Option<CancellationToken>>,
    retained_trip: Mutex<Option<RetainedTrip>>,
    phase: watch::Sender<DiscoveryPhase>,
}

impl<R> DiscoverySession<R>
where
    R: RoutingProvider + 'static,
{
    /// Start a session over `engine`.
    #[must_use]
    pub fn new(engine: DiscoveryEngine<R>) -> Self {
        Self::with_shared_engine(Arc::new(engine))
    }

    /// Start a session over an engine shared with other sessions.
    #[must_use]
    pub fn with_shared_engine(engine: Arc<DiscoveryEngine<R>>) -> Self {
        let (phase, _) = watch::channel(DiscoveryPhase::Idle);
        Self {
            engine,
            current: Mutex::new(None),
            retained_trip: Mutex::new(None),
            phase,
        }
    }

    /// Watch the phase of the latest cycle.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryPhase> {
        self.phase.subscribe()
    }

    /// Phase of the latest cycle.
    #[must_use]
    pub fn phase(&self) -> DiscoveryPhase {
        *self.phase.borrow()
    }

    /// Run a cycle, superseding any cycle still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Superseded`] when a newer call replaces
    /// this one, and the engine's errors otherwise.
    pub async fn discover(&self, input: &DiscoveryInput) -> Result<DiscoveryResult, DiscoveryError> {
        let token = self.begin_cycle();
        let phase = PhaseReporter::guarded(&self.phase, &token);
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(DiscoveryError::Superseded),
            outcome = self.engine.discover_observed(input, &phase) => outcome,
        };
        self.complete(&token, input.destination, outcome)
    }

    /// Fetch drivers from `source` and run a cycle, superseding any cycle
    /// still in flight.
    ///
    /// # Errors
    ///
    /// As [`DiscoveryEngine::discover_from_source`], plus
    /// [`DiscoveryError::Superseded`].
    pub async fn discover_from_source<S>(
        &self,
        source: &S,
        rider_id: &str,
        input: DiscoveryInput,
    ) -> Result<DiscoveryResult, DiscoveryError>
    where
        S: DriverSource + ?Sized,
    {
        let token = self.begin_cycle();
        let destination = input.destination;
        let phase = PhaseReporter::guarded(&self.phase, &token);
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(DiscoveryError::Superseded),
            outcome = self
                .engine
                .discover_from_source_observed(source, rider_id, input, &phase) => outcome,
        };
        self.complete(&token, destination, outcome)
    }

    /// Cancel any cycle in flight without starting a new one.
    pub fn cancel(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = previous {
            token.cancel();
        }
    }

    fn begin_cycle(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(stale) = previous {
            info!("superseding in-flight discovery");
            stale.cancel();
        }
        token
    }

    /// Settle a cycle. A cycle cancelled after its last poll still counts as
    /// superseded and leaves the retained route alone.
    fn complete(
        &self,
        token: &CancellationToken,
        destination: Option<Coordinate>,
        outcome: Result<DiscoveryResult, DiscoveryError>,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let mut result = outcome?;
        let mut retained = self
            .retained_trip
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            debug!("dropping result of a superseded discovery");
            return Err(DiscoveryError::Superseded);
        }
        retain_trip_route(&mut retained, destination, &mut result);
        Ok(result)
    }
}

/// Remember a fresh trip route, or fall back to the remembered one when the
/// refresh failed and the destination has not moved.
fn retain_trip_route(
    retained: &mut Option<RetainedTrip>,
    destination: Option<Coordinate>,
    result: &mut DiscoveryResult,
) {
    let Some(target) = destination else {
        *retained = None;
        return;
    };
    if let Some(route) = &result.trip_route {
        *retained = Some(RetainedTrip {
            destination: target,
            route: route.clone(),
        });
        return;
    }
    let previous = retained
        .as_ref()
        .filter(|kept| kept.destination == target)
        .map(|kept| kept.route.clone());
    if previous.is_some() {
        debug!("keeping last good trip route after a failed refresh");
        result.trip_route = previous;
        result.trip_route_stale = true;
    } else {
        *retained = None;
    }
}
