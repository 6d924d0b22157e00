//! Facade crate for the ridescout driver discovery engine.
//!
//! This crate re-exports the core domain types and the async discovery
//! engine, and exposes the OSRM routing adapter behind a feature flag.

#![forbid(unsafe_code)]

pub use ridescout_core::{
    ConfigError, Coordinate, CoordinateError, Decimal, DestinationMarker, DiscoveryInput,
    DiscoveryPhase, DiscoveryResult, DriverRecord, DriverSource, DriverSourceError,
    EngineConfig, EngineTimeoutError, InvalidInputError, MapMarker, PricingConfig, PricingError,
    RankedDriver, Region, RoutingError, RoutingProvider, TripRoute, UnavailableDriver,
    UnavailableReason, bounding_region, build_markers, distance, mark_selected,
};
pub use ridescout_dispatch::{DiscoveryEngine, DiscoveryError, DiscoverySession};

#[cfg(feature = "routing-osrm")]
pub use ridescout_data::{OsrmRoutingClient, OsrmRoutingConfig, ProviderBuildError};
