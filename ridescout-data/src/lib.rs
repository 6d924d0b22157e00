//! Adapters that connect the ridescout engine to external services.
//!
//! Responsibilities:
//! - Implement `ridescout_core::RoutingProvider` over HTTP.
//! - Own the wire formats of those services.
//!
//! Boundaries:
//! - Do not encode ranking or framing rules (live in `ridescout-core`).
//! - Never block an async executor; every call is async end to end.
//!
//! Invariants:
//! - Clients are cheap to clone and safe to share between tasks.
//! - Configuration is immutable once a client is built.

#![forbid(unsafe_code)]

pub mod routing;

pub use routing::{
    DEFAULT_OSRM_BASE_URL, DEFAULT_USER_AGENT, OsrmRoutingClient, OsrmRoutingConfig,
    ProviderBuildError,
};
