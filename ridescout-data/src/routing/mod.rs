//! HTTP routing providers.
//!
//! [`OsrmRoutingClient`] implements [`ridescout_core::RoutingProvider`] on
//! top of the OSRM Route service. A single [`reqwest::Client`] backs every
//! clone of the provider, so connection pooling is shared across all
//! concurrent routing calls.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ridescout_core::{Coordinate, RoutingProvider};
//! use ridescout_data::routing::{OsrmRoutingClient, OsrmRoutingConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OsrmRoutingConfig::new("http://localhost:5000")
//!     .with_user_agent("my-app/1.0");
//! let client = OsrmRoutingClient::with_config(config)?;
//!
//! let route = client
//!     .route(
//!         Coordinate::new(40.0, -75.0)?,
//!         Coordinate::new(40.1, -75.1)?,
//!         Duration::from_secs(5),
//!     )
//!     .await?;
//! println!("{} m in {} s", route.distance_meters, route.duration_seconds);
//! # Ok(())
//! # }
//! ```

mod osrm;
mod provider;

pub use provider::{
    DEFAULT_OSRM_BASE_URL, DEFAULT_USER_AGENT, OsrmRoutingClient, OsrmRoutingConfig,
    ProviderBuildError,
};
