#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Distance models for danger-zone clustering.
//!
//! The clusterer only needs one thing from geography: how far apart two
//! `[lat, lon]` positions are, in meters. [`DistanceModel`] is that seam.
//! [`Haversine`] is the reference spherical model (Earth radius
//! 6,371,000 m); [`Geodesic`] measures on the WGS84 ellipsoid.
//!
//! Models may also describe a [`SearchEnvelope`], a lat/lon box guaranteed
//! to contain every point within a given distance of a center. Spatial
//! indexes use it to skip far-away candidates without changing results.

pub mod envelope;
pub mod geodesic;
pub mod haversine;

use std::sync::Arc;

use danger_map_incident_models::Position;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use envelope::SearchEnvelope;
pub use geodesic::Geodesic;
pub use haversine::{Haversine, destination_point, haversine_distance};

/// Mean Earth radius used by the reference distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Measures distances between positions.
///
/// Implementations must be `Send + Sync` so a single clusterer can be
/// shared across threads.
pub trait DistanceModel: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Distance between `a` and `b` in meters.
    fn distance(&self, a: Position, b: Position) -> f64;

    /// A box containing every position within `radius_m` of `center`, or
    /// `None` if the model cannot bound the search (the caller must then
    /// consider every candidate).
    fn search_envelope(&self, _center: Position, _radius_m: f64) -> Option<SearchEnvelope> {
        None
    }
}

/// Selectable distance model.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceKind {
    /// Spherical great-circle distance with R = 6,371,000 m.
    #[default]
    Haversine,
    /// Ellipsoidal (WGS84) geodesic distance.
    Geodesic,
}

impl DistanceKind {
    /// Instantiates the model.
    #[must_use]
    pub fn model(self) -> Arc<dyn DistanceModel> {
        match self {
            Self::Haversine => Arc::new(Haversine::default()),
            Self::Geodesic => Arc::new(Geodesic),
        }
    }
}
