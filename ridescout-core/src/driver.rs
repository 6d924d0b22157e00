//! Raw driver records supplied by the driver source.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// An active driver as reported by the driver source.
///
/// Records are borrowed for a single discovery cycle and never mutated.
/// The position is unvalidated; marker building skips out-of-range values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverRecord {
    /// Stable driver identifier.
    pub id: String,
    /// Last reported position.
    pub position: Coordinate,
    /// Name shown on the driver's marker.
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: String,
    /// Opaque attributes (rating, vehicle, seats) carried through untouched.
    #[cfg_attr(feature = "serde", serde(default))]
    pub meta: BTreeMap<String, String>,
}

impl DriverRecord {
    /// Construct a record with no extra attributes.
    pub fn new(
        id: impl Into<String>,
        position: Coordinate,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            display_name: display_name.into(),
            meta: BTreeMap::new(),
        }
    }

    /// Attach an opaque attribute.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}
