//! Great-circle distance and map viewport framing.
//!
//! Distances use the haversine formula on a spherical Earth. Viewport
//! framing takes the axis-aligned bounding box of the supplied points and
//! scales its spans by a padding factor.

use geo::{BoundingRect, MultiPoint, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Coordinate, InvalidInputError};

/// Mean Earth radius used for haversine distances, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Map viewport: a centre with latitude and longitude spans in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    /// Midpoint of the framed points.
    pub center: Coordinate,
    /// Total north-south extent in degrees.
    pub latitude_span_degrees: f64,
    /// Total east-west extent in degrees.
    pub longitude_span_degrees: f64,
}

impl Region {
    /// A region of `span_degrees` in both directions around `center`.
    #[must_use]
    pub const fn around(center: Coordinate, span_degrees: f64) -> Self {
        Self {
            center,
            latitude_span_degrees: span_degrees,
            longitude_span_degrees: span_degrees,
        }
    }

    /// Widen either span to at least `minimum_degrees`.
    ///
    /// Coincident points produce a zero span which no map can display.
    #[must_use]
    pub fn with_minimum_span(self, minimum_degrees: f64) -> Self {
        Self {
            latitude_span_degrees: self.latitude_span_degrees.max(minimum_degrees),
            longitude_span_degrees: self.longitude_span_degrees.max(minimum_degrees),
            ..self
        }
    }

    /// Whether `point` lies within the region, edges included.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        let lat_offset = (point.latitude - self.center.latitude).abs();
        let lon_offset = (point.longitude - self.center.longitude).abs();
        lat_offset * 2.0 <= self.latitude_span_degrees
            && lon_offset * 2.0 <= self.longitude_span_degrees
    }
}

/// Great-circle distance between `a` and `b` in metres.
///
/// `NaN` components propagate to the result; validate coordinates first.
///
/// # Examples
///
/// ```
/// use ridescout_core::{Coordinate, distance};
///
/// let a = Coordinate::unchecked(0.0, 0.0);
/// let b = Coordinate::unchecked(0.0, 1.0);
/// let metres = distance(a, b);
/// assert!((metres - 111_194.9).abs() < 1.0);
/// ```
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Rounding can push `h` a hair above one for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Frame `points` in a [`Region`] padded by `padding_factor`.
///
/// The centre is the midpoint of the bounding box and each span is the raw
/// extent multiplied by `padding_factor`. Callers wanting a sensible
/// viewport for a single point should fall back to [`Region::around`].
///
/// # Errors
///
/// Returns [`InvalidInputError::EmptyPoints`] for an empty slice and
/// [`InvalidInputError::InvalidPaddingFactor`] when the factor is below
/// 1.0 or not finite.
///
/// # Examples
///
/// ```
/// use ridescout_core::{Coordinate, bounding_region};
///
/// let points = [
///     Coordinate::unchecked(40.0, -75.0),
///     Coordinate::unchecked(40.1, -75.1),
/// ];
/// let region = bounding_region(&points, 1.5)?;
/// assert!((region.latitude_span_degrees - 0.15).abs() < 1e-9);
/// assert!((region.center.longitude + 75.05).abs() < 1e-9);
/// # Ok::<(), ridescout_core::InvalidInputError>(())
/// ```
pub fn bounding_region(
    points: &[Coordinate],
    padding_factor: f64,
) -> Result<Region, InvalidInputError> {
    if !padding_factor.is_finite() || padding_factor < 1.0 {
        return Err(InvalidInputError::InvalidPaddingFactor {
            value: padding_factor,
        });
    }
    let multi: MultiPoint<f64> = points.iter().copied().map(Point::from).collect();
    let rect = multi
        .bounding_rect()
        .ok_or(InvalidInputError::EmptyPoints)?;

    Ok(Region {
        center: Coordinate::from(rect.center()),
        latitude_span_degrees: rect.height() * padding_factor,
        longitude_span_degrees: rect.width() * padding_factor,
    })
}
