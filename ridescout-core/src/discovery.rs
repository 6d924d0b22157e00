//! Inputs, outputs and lifecycle phases of one discovery cycle.

use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Coordinate, DestinationMarker, DriverRecord, MapMarker, RankedDriver, Region, RoutingError,
    TripRoute, UnavailableDriver,
};

/// Snapshot of everything a discovery cycle needs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiscoveryInput {
    /// Rider position and pickup point. Required.
    pub rider_position: Option<Coordinate>,
    /// Optional trip destination.
    pub destination: Option<Coordinate>,
    /// Active drivers for this cycle.
    pub drivers: Vec<DriverRecord>,
    /// Driver the rider has picked, if any.
    pub selected_driver_id: Option<String>,
}

/// Everything the renderer needs after one cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveryResult {
    /// Viewport framing the rider, destination and drivers.
    pub region: Region,
    /// One marker per accepted driver.
    pub markers: Vec<MapMarker>,
    /// Destination pin when a destination was supplied.
    pub destination_marker: Option<DestinationMarker>,
    /// Drivers with an ETA, best first.
    pub ranked: Vec<RankedDriver>,
    /// Ids of drivers whose ETA is unknown.
    pub unavailable_driver_ids: BTreeSet<String>,
    /// Detailed reasons for each unavailable driver.
    pub unavailable: Vec<UnavailableDriver>,
    /// Drivers dropped before ranking for a bad position or a repeated id.
    pub skipped_driver_ids: Vec<String>,
    /// Pickup-to-destination route, possibly carried from an earlier cycle.
    pub trip_route: Option<TripRoute>,
    /// Error from this cycle's trip route fetch, if it failed.
    pub trip_route_error: Option<RoutingError>,
    /// Whether `trip_route` comes from an earlier cycle.
    pub trip_route_stale: bool,
    /// Set when the ranking deadline cut the cycle short.
    pub timed_out: Option<EngineTimeoutError>,
}

/// The ranking deadline fired before every routing call settled.
///
/// Non-fatal: the result still carries the partial ranking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error("ranking deadline of {overall_timeout_ms} ms elapsed with {pending} calls pending")]
pub struct EngineTimeoutError {
    /// Configured ranking deadline.
    pub overall_timeout_ms: u64,
    /// Calls that were cancelled by the deadline.
    pub pending: usize,
}

/// Where a discovery cycle currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiscoveryPhase {
    /// No cycle has started.
    #[default]
    Idle,
    /// Waiting on the driver source.
    FetchingDrivers,
    /// Validating input and framing the viewport.
    ComputingRegion,
    /// Routing calls for driver ETAs are running.
    RankingDrivers,
    /// The trip route call is running.
    FetchingTripRoute,
    /// The cycle produced a result.
    Ready,
    /// The cycle was aborted by invalid input.
    Failed,
}

impl DiscoveryPhase {
    /// Whether the cycle has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::FetchingDrivers => "fetching drivers",
            Self::ComputingRegion => "computing region",
            Self::RankingDrivers => "ranking drivers",
            Self::FetchingTripRoute => "fetching trip route",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn input_fields_default_when_absent() {
        let input: DiscoveryInput =
            serde_json::from_str(r#"{"rider_position":{"latitude":40.0,"longitude":-75.0}}"#)
                .expect("minimal input parses");
        assert!(input.destination.is_none());
        assert!(input.drivers.is_empty());
        assert!(input.selected_driver_id.is_none());
    }

    #[rstest]
    #[case(DiscoveryPhase::Ready, true)]
    #[case(DiscoveryPhase::Failed, true)]
    #[case(DiscoveryPhase::RankingDrivers, false)]
    fn terminal_phases(#[case] phase: DiscoveryPhase, #[case] terminal: bool) {
        assert_eq!(phase.is_terminal(), terminal);
    }
}
