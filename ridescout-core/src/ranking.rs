//! Turn per-driver route estimates into a priced, ordered ranking.
//!
//! Ordering depends only on the estimates themselves, never on the order in
//! which they were produced: ascending duration compared with
//! [`f64::total_cmp`], then ascending driver id.

use std::cmp::Ordering;

use rust_decimal::Decimal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pricing::to_cents;
use crate::{PricingConfig, PricingError, RoutingError};

/// Seconds per minute, for ETA conversion.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Outcome of routing one driver to the pickup point.
///
/// A failed estimate is explicit so that "slow" and "unknown" stay distinct.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteEstimate {
    /// Driver the estimate belongs to.
    pub driver_id: String,
    /// Route metrics or the reason none are available.
    pub outcome: EstimateOutcome,
}

/// Result slot of a single routing call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EstimateOutcome {
    /// The provider returned a route.
    Available {
        /// Driver-to-pickup travel time.
        duration_seconds: f64,
        /// Driver-to-pickup road distance.
        distance_meters: f64,
    },
    /// No usable route was produced.
    Unavailable(UnavailableReason),
}

/// Why a driver has no ETA.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnavailableReason {
    /// The routing provider failed for this driver.
    Routing(RoutingError),
    /// The ranking deadline fired before the call finished.
    DeadlineExceeded,
    /// The task running the call panicked or was aborted.
    TaskFailed,
    /// The route could not be priced.
    Unpriceable(PricingError),
}

impl RouteEstimate {
    /// A successful estimate.
    pub fn available(
        driver_id: impl Into<String>,
        duration_seconds: f64,
        distance_meters: f64,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            outcome: EstimateOutcome::Available {
                duration_seconds,
                distance_meters,
            },
        }
    }

    /// A failed estimate.
    pub fn unavailable(driver_id: impl Into<String>, reason: UnavailableReason) -> Self {
        Self {
            driver_id: driver_id.into(),
            outcome: EstimateOutcome::Unavailable(reason),
        }
    }
}

/// A driver's position in the ranking.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankedDriver {
    /// Ranked driver.
    pub driver_id: String,
    /// Travel time to the pickup point in minutes.
    pub eta_minutes: f64,
    /// Quoted fare, exact to the configured rates.
    pub price_estimate: Decimal,
    /// One-based position, contiguous across the ranking.
    pub rank: usize,
}

impl RankedDriver {
    /// The quoted fare rounded to cents for display, ties away from zero.
    #[must_use]
    pub fn price_to_cents(&self) -> Decimal {
        to_cents(self.price_estimate)
    }
}

/// A driver left out of the ranking and why.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnavailableDriver {
    /// Driver without an ETA.
    pub driver_id: String,
    /// Failure that excluded the driver.
    pub reason: UnavailableReason,
}

/// Ranked drivers plus the side list of drivers without an ETA.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ranking {
    /// Drivers with an ETA, best first.
    pub ranked: Vec<RankedDriver>,
    /// Drivers without an ETA, sorted by id.
    pub unavailable: Vec<UnavailableDriver>,
}

struct Candidate<'a> {
    driver_id: &'a str,
    duration_seconds: f64,
    price_estimate: Decimal,
}

/// Price and order `estimates`.
///
/// Unavailable estimates, and available ones whose metrics cannot be
/// priced, are moved to [`Ranking::unavailable`] and receive no rank.
///
/// # Examples
///
/// ```
/// use ridescout_core::{PricingConfig, RouteEstimate, rank_estimates};
///
/// let estimates = vec![
///     RouteEstimate::available("b", 60.0, 500.0),
///     RouteEstimate::available("a", 60.0, 500.0),
///     RouteEstimate::available("c", 30.0, 250.0),
/// ];
/// let ranking = rank_estimates(&estimates, &PricingConfig::default());
/// let order: Vec<_> = ranking.ranked.iter().map(|r| r.driver_id.as_str()).collect();
/// assert_eq!(order, ["c", "a", "b"]);
/// ```
#[must_use]
pub fn rank_estimates(estimates: &[RouteEstimate], pricing: &PricingConfig) -> Ranking {
    let mut candidates = Vec::with_capacity(estimates.len());
    let mut unavailable = Vec::new();

    for estimate in estimates {
        match &estimate.outcome {
            EstimateOutcome::Available {
                duration_seconds,
                distance_meters,
            } => match pricing.estimate(*distance_meters, *duration_seconds) {
                Ok(price_estimate) => candidates.push(Candidate {
                    driver_id: &estimate.driver_id,
                    duration_seconds: *duration_seconds,
                    price_estimate,
                }),
                Err(err) => unavailable.push(UnavailableDriver {
                    driver_id: estimate.driver_id.clone(),
                    reason: UnavailableReason::Unpriceable(err),
                }),
            },
            EstimateOutcome::Unavailable(reason) => unavailable.push(UnavailableDriver {
                driver_id: estimate.driver_id.clone(),
                reason: reason.clone(),
            }),
        }
    }

    candidates.sort_by(compare_candidates);
    unavailable.sort_by(|a, b| a.driver_id.cmp(&b.driver_id));

    let ranked = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| RankedDriver {
            driver_id: candidate.driver_id.to_owned(),
            eta_minutes: candidate.duration_seconds / SECONDS_PER_MINUTE,
            price_estimate: candidate.price_estimate,
            rank: index + 1,
        })
        .collect();

    Ranking {
        ranked,
        unavailable,
    }
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.duration_seconds
        .total_cmp(&b.duration_seconds)
        .then_with(|| a.driver_id.cmp(b.driver_id))
}

impl From<PricingError> for UnavailableReason {
    fn from(value: PricingError) -> Self {
        Self::Unpriceable(value)
    }
}

impl From<RoutingError> for UnavailableReason {
    fn from(value: RoutingError) -> Self {
        Self::Routing(value)
    }
}
