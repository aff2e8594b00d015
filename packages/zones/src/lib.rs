#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Danger-zone clustering.
//!
//! [`ZoneClusterer`] turns geolocated incidents into circular danger zones
//! for map display using a greedy, distance-threshold algorithm:
//!
//! 1. Incidents are visited most recent first.
//! 2. Each incident not yet assigned seeds a neighborhood of every
//!    unassigned incident within the maximum zone radius (1,000 m).
//! 3. The neighborhood becomes a zone centered on the flat mean of its
//!    members, with a radius of the farthest member plus 50 m, clamped to
//!    `[100, 1000]` m, and a risk tier by member count (5+ high, 3+ medium).
//!
//! Distance and risk classification are pluggable ([`DistanceModel`],
//! [`RiskModel`]), and "now" is injected so that the recency text in zone
//! descriptions is testable.

pub mod clock;
pub mod clusterer;
pub mod config;
pub mod describe;
pub mod risk;

pub use clock::{Clock, FixedClock, SystemClock};
pub use clusterer::{ZoneCluster, ZoneClusterer};
pub use config::{ConfigError, ZoneConfig};
pub use danger_map_geo::DistanceModel;
pub use describe::ZoneDescriber;
pub use risk::RiskModel;

use danger_map_incident_models::Incident;
use danger_map_zone_models::DangerZone;

/// Computes zones with the reference settings as of `now_ms`.
#[must_use]
pub fn calculate_danger_zones(incidents: &[Incident], now_ms: i64) -> Vec<DangerZone> {
    ZoneClusterer::default().compute_zones_at(incidents, now_ms)
}
