//! Concurrent driver discovery for ridescout.
//!
//! This crate drives the I/O side of a discovery cycle. [`EtaRanker`] fans
//! routing calls out across a bounded pool and folds the results into a
//! deterministic ranking, [`TripRouteFetcher`] fetches the rider's own trip
//! route, and [`DiscoveryEngine`] composes both with the pure framing and
//! marker logic from `ridescout-core`.
//!
//! [`DiscoverySession`] adds supersede semantics on top of the engine: a new
//! call cancels whatever the previous call still has in flight, and the
//! last good trip route survives a failed refresh.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod ranker;
mod session;
mod trip;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use engine::{DiscoveryEngine, DiscoveryError};
pub use ranker::{EtaRanker, RankingLimits, RankingOutcome};
pub use session::DiscoverySession;
pub use trip::TripRouteFetcher;
