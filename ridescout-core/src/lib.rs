//! Core domain types for the ridescout driver discovery engine.
//!
//! Responsibilities:
//! - Validate coordinates at ingestion and keep derived records honest.
//! - Provide the pure geometry used to frame the map viewport.
//! - Turn raw driver records into renderable markers.
//! - Define the routing and driver-source seams implemented elsewhere.
//! - Order route estimates into a deterministic, priced ranking.
//!
//! Boundaries:
//! - No I/O and no async runtime. Concurrency lives in `ridescout-dispatch`
//!   and HTTP in `ridescout-data`.

#![forbid(unsafe_code)]

mod config;
mod coordinate;
mod discovery;
mod driver;
mod driver_source;
pub mod geo_math;
mod marker;
mod pricing;
mod ranking;
pub mod routing;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, EngineConfig, MIN_REGION_PADDING};
pub use coordinate::{Coordinate, CoordinateError, InvalidInputError};
pub use discovery::{DiscoveryInput, DiscoveryPhase, DiscoveryResult, EngineTimeoutError};
pub use driver::DriverRecord;
pub use driver_source::{DriverSource, DriverSourceError};
pub use geo_math::{Region, bounding_region, distance};
pub use marker::{DestinationMarker, MapMarker, MarkerBatch, build_markers, mark_selected};
pub use pricing::{PricingConfig, PricingError};
pub use ranking::{
    EstimateOutcome, RankedDriver, Ranking, RouteEstimate, UnavailableDriver, UnavailableReason,
    rank_estimates,
};
pub use routing::{RoutingError, RoutingProvider, TripRoute};
pub use rust_decimal::Decimal;
