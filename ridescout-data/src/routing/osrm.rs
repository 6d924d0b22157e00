//! OSRM API response types for the Route service.
//!
//! The Route service finds the fastest road route between the supplied
//! coordinates. Requests ask for `overview=full&geometries=geojson`, so the
//! geometry arrives as GeoJSON `[longitude, latitude]` pairs.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use ridescout_core::{Coordinate, RoutingError, TripRoute};
use serde::Deserialize;

/// OSRM codes meaning the service understood the request but found no path.
const NO_ROUTE_CODES: [&str; 2] = ["NoRoute", "NoSegment"];

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route between the coordinates
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    /// - `"InvalidQuery"` - Invalid query parameters
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Candidate routes, fastest first.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// A single route in a [`RouteResponse`].
#[derive(Debug, Deserialize)]
pub struct RouteEntry {
    /// Travel time in seconds.
    pub duration: Option<f64>,
    /// Road distance in metres.
    pub distance: Option<f64>,
    /// Full route geometry.
    pub geometry: Option<LineGeometry>,
}

/// GeoJSON `LineString` geometry.
#[derive(Debug, Deserialize)]
pub struct LineGeometry {
    /// `[longitude, latitude]` pairs.
    pub coordinates: Vec<Vec<f64>>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Convert the fastest route into a [`TripRoute`].
    pub fn into_trip_route(self) -> Result<TripRoute, RoutingError> {
        if !self.is_ok() {
            let message = self.message.unwrap_or_else(|| self.code.clone());
            if NO_ROUTE_CODES.contains(&self.code.as_str()) {
                return Err(RoutingError::NoRoute { message });
            }
            return Err(RoutingError::MalformedResponse {
                message: format!("{}: {message}", self.code),
            });
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute {
                message: "OSRM returned no routes".to_owned(),
            })?;

        let duration_seconds = require_metric("duration", route.duration)?;
        let distance_meters = require_metric("distance", route.distance)?;
        let geometry = route
            .geometry
            .ok_or_else(|| malformed("route is missing its geometry"))?;
        let polyline = geometry
            .coordinates
            .iter()
            .map(|pair| to_coordinate(pair))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TripRoute {
            polyline,
            duration_seconds,
            distance_meters,
        })
    }
}

fn require_metric(name: &str, value: Option<f64>) -> Result<f64, RoutingError> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(malformed(&format!("route {name} {v} is not a valid quantity"))),
        None => Err(malformed(&format!("route is missing its {name}"))),
    }
}

fn to_coordinate(pair: &[f64]) -> Result<Coordinate, RoutingError> {
    let [longitude, latitude, ..] = pair else {
        return Err(malformed(&format!(
            "geometry position {pair:?} needs longitude and latitude"
        )));
    };
    Coordinate::new(*latitude, *longitude)
        .map_err(|err| malformed(&format!("geometry position out of range: {err}")))
}

fn malformed(message: &str) -> RoutingError {
    RoutingError::MalformedResponse {
        message: message.to_owned(),
    }
}
