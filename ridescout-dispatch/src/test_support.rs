//! Test-only utilities for `ridescout-dispatch`.
//!
//! The helpers in this module are available to unit tests and behavioural
//! tests. They are gated behind the `test-support` feature (and `cfg(test)`).

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ridescout_core::{Coordinate, RoutingError, RoutingProvider, TripRoute};

/// Scripted reply for calls starting at one origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    latency: Duration,
    outcome: Result<(f64, f64), RoutingError>,
}

impl Script {
    /// Reply with a route of `duration_seconds` and `distance_meters`.
    #[must_use]
    pub const fn route(duration_seconds: f64, distance_meters: f64) -> Self {
        Self {
            latency: Duration::ZERO,
            outcome: Ok((duration_seconds, distance_meters)),
        }
    }

    /// Reply with `error`.
    #[must_use]
    pub const fn failure(error: RoutingError) -> Self {
        Self {
            latency: Duration::ZERO,
            outcome: Err(error),
        }
    }

    /// Delay the reply by `latency`.
    #[must_use]
    pub const fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// A [`RoutingProvider`] whose replies are scripted per origin.
///
/// Calls whose origin has no script receive the default script, a
/// one-minute, 500 m route with no latency. The provider records how many
/// calls it has seen and the peak number in flight at once.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use ridescout_core::{Coordinate, RoutingProvider};
/// use ridescout_dispatch::test_support::{Script, ScriptedRoutingProvider};
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let origin = Coordinate::unchecked(40.0, -75.0);
/// let provider = ScriptedRoutingProvider::new().script(origin, Script::route(120.0, 900.0));
/// let route = provider
///     .route(origin, origin, Duration::from_secs(1))
///     .await
///     .expect("scripted route");
/// assert_eq!(route.duration_seconds, 120.0);
/// # });
/// ```
#[derive(Debug)]
pub struct ScriptedRoutingProvider {
    scripts: Vec<(Coordinate, Script)>,
    fallback: Script,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    origins: Mutex<Vec<Coordinate>>,
}

impl Default for ScriptedRoutingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRoutingProvider {
    /// A provider where every origin gets the default script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            fallback: Script::route(60.0, 500.0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            origins: Mutex::new(Vec::new()),
        }
    }

    /// Script replies for calls starting at `origin`.
    #[must_use]
    pub fn script(mut self, origin: Coordinate, script: Script) -> Self {
        self.scripts.retain(|(existing, _)| *existing != origin);
        self.scripts.push((origin, script));
        self
    }

    /// Replace the script used for unscripted origins.
    #[must_use]
    pub fn fallback(mut self, script: Script) -> Self {
        self.fallback = script;
        self
    }

    /// Number of calls started so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of calls ever in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Origins of every call in the order the calls started.
    #[must_use]
    pub fn origins(&self) -> Vec<Coordinate> {
        self.origins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn script_for(&self, origin: Coordinate) -> &Script {
        self.scripts
            .iter()
            .find(|(scripted, _)| *scripted == origin)
            .map_or(&self.fallback, |(_, script)| script)
    }
}

/// Decrements the in-flight counter when a call finishes or is aborted.
struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        peak.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoutingProvider for ScriptedRoutingProvider {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        _timeout: Duration,
    ) -> Result<TripRoute, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.origins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(origin);
        let _guard = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);

        let script = self.script_for(origin).clone();
        if !script.latency.is_zero() {
            tokio::time::sleep(script.latency).await;
        }
        script
            .outcome
            .map(|(duration_seconds, distance_meters)| TripRoute {
                polyline: vec![origin, destination],
                duration_seconds,
                distance_meters,
            })
    }
}
