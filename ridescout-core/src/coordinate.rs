//! Geographic coordinates and the validation applied at ingestion.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range in degrees.
const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
/// Valid longitude range in degrees.
const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A WGS84 position expressed in decimal degrees.
///
/// The struct itself does not enforce the range invariant so that raw
/// driver feeds can be deserialised and then filtered. Use
/// [`Coordinate::new`] or [`Coordinate::validate`] wherever a value enters
/// the engine.
///
/// # Examples
///
/// ```
/// use ridescout_core::Coordinate;
///
/// let rider = Coordinate::new(40.0, -75.0)?;
/// assert_eq!(rider.latitude, 40.0);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok::<(), ridescout_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]` once validated.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]` once validated.
    pub longitude: f64,
}

/// Reasons a [`Coordinate`] fails validation.
///
/// `NaN` components fail the range checks and are reported here too.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude was outside `[-90, 90]` or not a number.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange { value: f64 },
    /// Longitude was outside `[-180, 180]` or not a number.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange { value: f64 },
}

/// Input errors that abort an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    /// A named coordinate failed range validation.
    #[error("{field} is invalid: {source}")]
    InvalidCoordinate {
        field: &'static str,
        #[source]
        source: CoordinateError,
    },
    /// A computation that needs at least one point received none.
    #[error("at least one coordinate is required")]
    EmptyPoints,
    /// The region padding factor was below 1.0 or not finite.
    #[error("padding factor {value} must be finite and at least 1.0")]
    InvalidPaddingFactor { value: f64 },
    /// The rider's own position was not supplied.
    #[error("rider position is missing")]
    MissingRiderPosition,
}

impl Coordinate {
    /// Validates and constructs a [`Coordinate`].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self::unchecked(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Constructs a coordinate without range checks.
    ///
    /// Intended for raw feeds that are validated later and for values the
    /// engine derives itself from validated inputs.
    #[must_use]
    pub const fn unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check the latitude and longitude ranges.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !LATITUDE_RANGE.contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange {
                value: self.latitude,
            });
        }
        if !LONGITUDE_RANGE.contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange {
                value: self.longitude,
            });
        }
        Ok(())
    }

    /// Returns `true` when both components are within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate the coordinate, labelling any failure with `field`.
    pub fn require_valid(self, field: &'static str) -> Result<Self, InvalidInputError> {
        self.validate()
            .map(|()| self)
            .map_err(|source| InvalidInputError::InvalidCoordinate { field, source })
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Self {
            x: value.longitude,
            y: value.latitude,
        }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        Self::new(value.longitude, value.latitude)
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(value: geo::Coord<f64>) -> Self {
        Self::unchecked(value.y, value.x)
    }
}
