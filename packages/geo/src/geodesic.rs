//! Ellipsoidal distance on WGS84, backed by `geo`.

use danger_map_incident_models::Position;
use geo::{Distance, Point};

use crate::{DistanceModel, EARTH_RADIUS_M, SearchEnvelope};

/// Ratio between the reference sphere radius and the smallest WGS84
/// meridional radius of curvature (about 6,335 km), rounded up. Scaling
/// the search radius by it keeps the spherical envelope conservative for
/// ellipsoidal distances.
const ELLIPSOID_SLACK: f64 = 1.01;

/// WGS84 geodesic distance (Karney's algorithm).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geodesic;

impl DistanceModel for Geodesic {
    fn name(&self) -> &'static str {
        "geodesic"
    }

    fn distance(&self, a: Position, b: Position) -> f64 {
        if !a.is_finite() || !b.is_finite() {
            return f64::NAN;
        }
        geo::Geodesic.distance(Point::new(a.lon(), a.lat()), Point::new(b.lon(), b.lat()))
    }

    fn search_envelope(&self, center: Position, radius_m: f64) -> Option<SearchEnvelope> {
        SearchEnvelope::around(center, radius_m * ELLIPSOID_SLACK, EARTH_RADIUS_M)
    }
}
