#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Danger zone types.
//!
//! A [`DangerZone`] is a derived, circular summary of nearby incidents. Zones
//! are recomputed from scratch whenever the incident set changes and are
//! never mutated after creation.

use danger_map_incident_models::Position;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fill opacity used when drawing a zone circle on the map.
pub const ZONE_FILL_OPACITY: f64 = 0.3;

/// Risk tier of a zone, derived from how many incidents it groups.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneType {
    /// Few incidents.
    Low,
    /// Moderate concentration.
    Medium,
    /// High concentration.
    High,
}

impl ZoneType {
    /// Hex colour the map uses for both stroke and fill of this tier.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "#FF0000",
            Self::Medium => "#FFA500",
            Self::Low => "#FFFF00",
        }
    }

    /// Returns all variants, highest risk first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::High, Self::Medium, Self::Low]
    }
}

/// A circular cluster of incidents for map display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DangerZone {
    /// `zone-<n>`, where `n` is the 1-based creation order.
    pub id: String,
    /// Flat mean of the member positions.
    pub center: Position,
    /// Radius in meters.
    pub radius: f64,
    /// Risk tier.
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Human-readable density and recency text.
    pub description: String,
    /// Number of member incidents.
    pub reports: usize,
}

impl DangerZone {
    /// Builds the sequential id for the `n`th zone (1-based).
    #[must_use]
    pub fn sequential_id(n: usize) -> String {
        format!("zone-{n}")
    }
}
