//! Bounded, cancellable fan-out of routing calls for driver ETAs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use ridescout_core::{
    Coordinate, EngineConfig, EngineTimeoutError, EstimateOutcome, MapMarker, PricingConfig,
    Ranking, RouteEstimate, RoutingError, RoutingProvider, TripRoute, UnavailableReason,
    rank_estimates,
};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

/// Result of one routing task: the marker slot it fills and its outcome.
type SlotResult = (usize, Result<TripRoute, UnavailableReason>);

/// Running routing tasks and the slot each task id fills.
struct Calls {
    tasks: JoinSet<SlotResult>,
    slot_of: HashMap<Id, usize>,
}

/// Concurrency and deadline bounds for one ranking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingLimits {
    /// Maximum routing calls in flight at once. Zero is treated as one.
    pub concurrency_limit: usize,
    /// Upper bound on each routing call, excluding time spent queued.
    pub per_call_timeout: Duration,
    /// Upper bound on the whole pass.
    pub overall_timeout: Duration,
}

impl From<&EngineConfig> for RankingLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            per_call_timeout: config.per_call_timeout,
            overall_timeout: config.overall_timeout,
        }
    }
}

/// Everything a ranking pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    /// Ranked drivers and the side list of unavailable ones.
    pub ranking: Ranking,
    /// Raw per-driver estimates in marker order.
    pub estimates: Vec<RouteEstimate>,
    /// Set when the overall deadline cancelled outstanding calls.
    pub timed_out: Option<EngineTimeoutError>,
}

impl RankingOutcome {
    /// Ids of every driver without an ETA.
    #[must_use]
    pub fn unavailable_driver_ids(&self) -> BTreeSet<String> {
        self.ranking
            .unavailable
            .iter()
            .map(|driver| driver.driver_id.clone())
            .collect()
    }
}

/// Ranks drivers by road travel time to the pickup point.
///
/// Every marker gets its own task. A semaphore caps how many of those tasks
/// may be talking to the provider at once, each call has its own timeout,
/// and the pass as a whole races an overall deadline. Each task writes only
/// its own slot; the calling task merges the slots once they settle.
#[derive(Debug)]
pub struct EtaRanker<R> {
    provider: Arc<R>,
    pricing: PricingConfig,
}

impl<R> EtaRanker<R>
where
    R: RoutingProvider + 'static,
{
    /// Construct a ranker sharing `provider`.
    pub const fn new(provider: Arc<R>, pricing: PricingConfig) -> Self {
        Self { provider, pricing }
    }

    /// Pricing rates applied to successful estimates.
    #[must_use]
    pub const fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Route every marker to `pickup` and rank the results.
    ///
    /// Failures are isolated per driver. When the overall deadline fires,
    /// outstanding calls are aborted and reported as
    /// [`UnavailableReason::DeadlineExceeded`]; the ranking built from the
    /// calls that did finish is still returned.
    pub async fn rank_drivers(
        &self,
        markers: &[MapMarker],
        pickup: Coordinate,
        limits: RankingLimits,
    ) -> RankingOutcome {
        debug!(
            "ranking {} drivers, at most {} in flight",
            markers.len(),
            limits.concurrency_limit
        );
        let Calls { mut tasks, slot_of } = self.spawn_calls(markers, pickup, limits);
        let mut slots: Vec<Option<Result<TripRoute, UnavailableReason>>> =
            markers.iter().map(|_| None).collect();

        let deadline = tokio::time::sleep(limits.overall_timeout);
        tokio::pin!(deadline);
        let mut deadline_hit = false;

        loop {
            tokio::select! {
                biased;
                joined = tasks.join_next() => match joined {
                    Some(Ok((slot, result))) => {
                        if let Some(cell) = slots.get_mut(slot) {
                            *cell = Some(result);
                        }
                    }
                    Some(Err(err)) => {
                        warn!("routing task failed: {err}");
                        let failed = slot_of.get(&err.id()).copied();
                        if let Some(cell) = failed.and_then(|slot| slots.get_mut(slot)) {
                            *cell = Some(Err(UnavailableReason::TaskFailed));
                        }
                    }
                    None => break,
                },
                () = &mut deadline => {
                    deadline_hit = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        let pending = slots.iter().filter(|slot| slot.is_none()).count();
        let timed_out = deadline_hit.then(|| {
            warn!(
                "ranking deadline of {:?} elapsed with {pending} calls pending",
                limits.overall_timeout
            );
            EngineTimeoutError {
                overall_timeout_ms: millis(limits.overall_timeout),
                pending,
            }
        });

        let estimates: Vec<RouteEstimate> = markers
            .iter()
            .zip(slots)
            .map(|(marker, slot)| RouteEstimate {
                driver_id: marker.driver_id.clone(),
                outcome: settle(slot, deadline_hit),
            })
            .collect();
        let ranking = rank_estimates(&estimates, &self.pricing);

        RankingOutcome {
            ranking,
            estimates,
            timed_out,
        }
    }

    fn spawn_calls(
        &self,
        markers: &[MapMarker],
        pickup: Coordinate,
        limits: RankingLimits,
    ) -> Calls {
        let permits = Arc::new(Semaphore::new(limits.concurrency_limit.max(1)));
        let mut tasks = JoinSet::new();
        let mut slot_of = HashMap::with_capacity(markers.len());
        for (slot, marker) in markers.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let gate = Arc::clone(&permits);
            let origin = marker.coordinate;
            let per_call = limits.per_call_timeout;
            let handle = tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only fails if
                // that changes; report it as a task failure rather than panic.
                let Ok(_permit) = gate.acquire_owned().await else {
                    return (slot, Err(UnavailableReason::TaskFailed));
                };
                let result = tokio::time::timeout(per_call, provider.route(origin, pickup, per_call))
                    .await
                    .unwrap_or_else(|_| Err(RoutingError::timeout(per_call)))
                    .map_err(UnavailableReason::Routing)
                    .inspect_err(|reason| debug!("route from {origin:?} unavailable: {reason:?}"));
                (slot, result)
            });
            slot_of.insert(handle.id(), slot);
        }
        Calls { tasks, slot_of }
    }
}

fn settle(
    slot: Option<Result<TripRoute, UnavailableReason>>,
    deadline_hit: bool,
) -> EstimateOutcome {
    match slot {
        Some(Ok(route)) => EstimateOutcome::Available {
            duration_seconds: route.duration_seconds,
            distance_meters: route.distance_meters,
        },
        Some(Err(reason)) => EstimateOutcome::Unavailable(reason),
        None if deadline_hit => EstimateOutcome::Unavailable(UnavailableReason::DeadlineExceeded),
        None => EstimateOutcome::Unavailable(UnavailableReason::TaskFailed),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
