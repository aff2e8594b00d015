//! Spherical great-circle distance.

use danger_map_incident_models::Position;

use crate::{DistanceModel, EARTH_RADIUS_M, SearchEnvelope};

/// Haversine distance in meters on a sphere of [`EARTH_RADIUS_M`].
///
/// The evaluation order is fixed so results are reproducible bit for bit.
#[must_use]
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    haversine_on_sphere(a, b, EARTH_RADIUS_M)
}

fn radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

#[allow(clippy::suboptimal_flops)]
fn haversine_on_sphere(a: Position, b: Position, radius_m: f64) -> f64 {
    let phi1 = radians(a.lat());
    let phi2 = radians(b.lat());
    let delta_phi = radians(b.lat() - a.lat());
    let delta_lambda = radians(b.lon() - a.lon());

    let h = (delta_phi / 2.0).sin() * (delta_phi / 2.0).sin()
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin() * (delta_lambda / 2.0).sin();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    radius_m * c
}

/// The position reached by travelling `distance_m` from `origin` along the
/// great circle with initial `bearing_deg` (clockwise from north).
///
/// Longitude is normalized to `[-180, 180)`.
#[must_use]
pub fn destination_point(
    origin: Position,
    bearing_deg: f64,
    distance_m: f64,
    sphere_radius_m: f64,
) -> Position {
    let delta = distance_m / sphere_radius_m;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat().to_radians();
    let lambda1 = origin.lon().to_radians();

    let phi2 = phi1
        .sin()
        .mul_add(delta.cos(), phi1.cos() * delta.sin() * theta.cos())
        .asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(phi1.sin().mul_add(-phi2.sin(), delta.cos()));

    let lon = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Position::new(phi2.to_degrees(), lon)
}

/// The reference distance model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Haversine {
    /// Sphere radius in meters.
    pub radius_m: f64,
}

impl Default for Haversine {
    fn default() -> Self {
        Self {
            radius_m: EARTH_RADIUS_M,
        }
    }
}

impl DistanceModel for Haversine {
    fn name(&self) -> &'static str {
        "haversine"
    }

    fn distance(&self, a: Position, b: Position) -> f64 {
        haversine_on_sphere(a, b, self.radius_m)
    }

    fn search_envelope(&self, center: Position, radius_m: f64) -> Option<SearchEnvelope> {
        SearchEnvelope::around(center, radius_m, self.radius_m)
    }
}
