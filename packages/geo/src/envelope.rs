//! Lat/lon bounding boxes around a search radius.

use danger_map_incident_models::Position;

/// Relative slack added to the angular radius so that rounding in the
/// distance computation never places an in-range point outside the box.
const ANGULAR_SLACK: f64 = 1.0001;

/// An axis-aligned box in degrees. Never crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchEnvelope {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl SearchEnvelope {
    /// Whether `position` lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        (self.min_lat..=self.max_lat).contains(&position.lat())
            && (self.min_lon..=self.max_lon).contains(&position.lon())
    }

    /// Bounding box of a spherical cap of `radius_m` around `center` on a
    /// sphere of `sphere_radius_m`.
    ///
    /// Uses the tangent-meridian bound: at latitude `lat` a cap of angular
    /// radius `r` spans `asin(sin r / cos lat)` of longitude. Returns `None`
    /// when the cap reaches a pole or crosses the antimeridian, or when any
    /// input is not finite.
    #[must_use]
    pub fn around(center: Position, radius_m: f64, sphere_radius_m: f64) -> Option<Self> {
        if !center.is_finite() || !radius_m.is_finite() || radius_m < 0.0 {
            return None;
        }

        let angular = (radius_m / sphere_radius_m) * ANGULAR_SLACK;
        let lat = center.lat().to_radians();
        let min_lat = lat - angular;
        let max_lat = lat + angular;

        if min_lat <= -std::f64::consts::FRAC_PI_2 || max_lat >= std::f64::consts::FRAC_PI_2 {
            return None;
        }

        let sin_ratio = angular.sin() / lat.cos();
        if sin_ratio >= 1.0 {
            return None;
        }
        let delta_lon = sin_ratio.asin().to_degrees();
        let min_lon = center.lon() - delta_lon;
        let max_lon = center.lon() + delta_lon;

        if min_lon < -180.0 || max_lon > 180.0 {
            return None;
        }

        Some(Self {
            min_lat: min_lat.to_degrees(),
            max_lat: max_lat.to_degrees(),
            min_lon,
            max_lon,
        })
    }
}
