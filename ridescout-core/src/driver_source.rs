//! Where active drivers come from.

use async_trait::async_trait;
use thiserror::Error;

use crate::DriverRecord;

/// Failures while fetching the active driver list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverSourceError {
    /// The backing service could not be reached.
    #[error("driver source unavailable: {message}")]
    Unavailable { message: String },
    /// The rider is not known to the source.
    #[error("unknown rider {rider_id}")]
    UnknownRider { rider_id: String },
}

/// Supplies the drivers currently available to a rider.
///
/// The engine treats the returned records as read-only for one cycle.
#[async_trait]
pub trait DriverSource: Send + Sync {
    /// Return the active drivers visible to `rider_id`.
    async fn fetch_drivers(&self, rider_id: &str) -> Result<Vec<DriverRecord>, DriverSourceError>;
}
