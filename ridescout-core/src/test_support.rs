//! In-memory collaborators for unit and behaviour tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{DriverRecord, DriverSource, DriverSourceError};

/// `DriverSource` backed by a fixed map of rider id to drivers.
///
/// Unknown riders yield [`DriverSourceError::UnknownRider`].
#[derive(Debug, Default, Clone)]
pub struct StaticDriverSource {
    drivers: HashMap<String, Vec<DriverRecord>>,
}

impl StaticDriverSource {
    /// A source that returns `drivers` for `rider_id`.
    pub fn with_drivers(rider_id: impl Into<String>, drivers: Vec<DriverRecord>) -> Self {
        let mut source = Self::default();
        source.insert(rider_id, drivers);
        source
    }

    /// Register `drivers` for `rider_id`, replacing any earlier list.
    pub fn insert(&mut self, rider_id: impl Into<String>, drivers: Vec<DriverRecord>) {
        self.drivers.insert(rider_id.into(), drivers);
    }
}

#[async_trait]
impl DriverSource for StaticDriverSource {
    async fn fetch_drivers(&self, rider_id: &str) -> Result<Vec<DriverRecord>, DriverSourceError> {
        self.drivers
            .get(rider_id)
            .cloned()
            .ok_or_else(|| DriverSourceError::UnknownRider {
                rider_id: rider_id.to_owned(),
            })
    }
}
