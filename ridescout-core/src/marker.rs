//! Convert driver records into renderable map markers.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Coordinate, DriverRecord, distance};

/// Title given to the destination pin.
const DESTINATION_TITLE: &str = "Destination";

/// A driver's pin on the map for one discovery cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapMarker {
    /// Identifier of the driver this marker represents.
    pub driver_id: String,
    /// Validated driver position.
    pub coordinate: Coordinate,
    /// Label shown by the renderer.
    pub title: String,
    /// Whether the rider has picked this driver.
    pub is_selected: bool,
    /// Straight-line distance from the rider in metres.
    pub straight_line_meters: f64,
}

/// The destination pin. Only present when the rider has chosen one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DestinationMarker {
    /// Destination position.
    pub coordinate: Coordinate,
    /// Label shown by the renderer.
    pub title: String,
}

impl DestinationMarker {
    /// A pin titled "Destination" at `coordinate`.
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            title: DESTINATION_TITLE.to_owned(),
        }
    }
}

/// Markers built for a cycle plus the drivers that could not be placed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerBatch {
    /// One marker per accepted driver, in input order.
    pub markers: Vec<MapMarker>,
    /// Drivers skipped for an out-of-range position or a repeated id.
    pub skipped_driver_ids: Vec<String>,
}

/// Build one marker per driver, relative to the rider's position.
///
/// Drivers whose position fails validation are skipped and reported in
/// [`MarkerBatch::skipped_driver_ids`], as are repeats of an id already
/// seen. Partial output is expected; this never fails.
///
/// # Examples
///
/// ```
/// use ridescout_core::{Coordinate, DriverRecord, build_markers};
///
/// let rider = Coordinate::unchecked(40.0, -75.0);
/// let drivers = vec![
///     DriverRecord::new("a", Coordinate::unchecked(40.01, -75.0), "Ada"),
///     DriverRecord::new("b", Coordinate::unchecked(123.0, -75.0), "Bob"),
/// ];
/// let batch = build_markers(&drivers, rider);
/// assert_eq!(batch.markers.len(), 1);
/// assert_eq!(batch.skipped_driver_ids, vec!["b".to_string()]);
/// ```
#[must_use]
pub fn build_markers(drivers: &[DriverRecord], rider_position: Coordinate) -> MarkerBatch {
    let mut seen = HashSet::with_capacity(drivers.len());
    let mut batch = MarkerBatch {
        markers: Vec::with_capacity(drivers.len()),
        skipped_driver_ids: Vec::new(),
    };

    for driver in drivers {
        if !driver.position.is_valid() || !seen.insert(driver.id.as_str()) {
            batch.skipped_driver_ids.push(driver.id.clone());
            continue;
        }
        batch.markers.push(MapMarker {
            driver_id: driver.id.clone(),
            coordinate: driver.position,
            title: marker_title(driver),
            is_selected: false,
            straight_line_meters: distance(rider_position, driver.position),
        });
    }

    batch
}

fn marker_title(driver: &DriverRecord) -> String {
    let name = driver.display_name.trim();
    if name.is_empty() {
        driver.id.clone()
    } else {
        name.to_owned()
    }
}

/// Return a copy of `markers` with only `selected_driver_id` selected.
///
/// When no marker carries that id the markers are returned unchanged,
/// including any earlier selection.
#[must_use]
pub fn mark_selected(markers: &[MapMarker], selected_driver_id: &str) -> Vec<MapMarker> {
    if !markers.iter().any(|m| m.driver_id == selected_driver_id) {
        return markers.to_vec();
    }
    markers
        .iter()
        .map(|marker| MapMarker {
            is_selected: marker.driver_id == selected_driver_id,
            ..marker.clone()
        })
        .collect()
}
