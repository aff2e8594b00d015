#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geolocated incident types.
//!
//! An [`Incident`] is the unit of input for danger-zone clustering: an id,
//! a `[latitude, longitude]` position and a millisecond timestamp. The
//! remaining descriptive fields travel with the incident but never affect
//! how zones are formed.
//!
//! Reports produced by the report-tracking side of the application are
//! converted into incidents via [`ReportRecord`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Errors raised when validating incidents or converting reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IncidentError {
    /// One of the coordinates is NaN or infinite.
    #[error("incident {id}: position ({lat}, {lon}) is not finite")]
    NonFinitePosition {
        /// Offending incident id.
        id: String,
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lon: f64,
    },

    /// Latitude outside `[-90, 90]`.
    #[error("incident {id}: latitude {lat} out of range [-90, 90]")]
    LatitudeOutOfRange {
        /// Offending incident id.
        id: String,
        /// Latitude as given.
        lat: f64,
    },

    /// Longitude outside `[-180, 180]`.
    #[error("incident {id}: longitude {lon} out of range [-180, 180]")]
    LongitudeOutOfRange {
        /// Offending incident id.
        id: String,
        /// Longitude as given.
        lon: f64,
    },

    /// A report timestamp string could not be parsed.
    #[error("report {id}: unparseable timestamp '{value}'")]
    InvalidTimestamp {
        /// Offending report id.
        id: String,
        /// The raw timestamp text.
        value: String,
    },
}

/// A `(latitude, longitude)` pair in degrees.
///
/// Serialized as a two-element array, `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub f64, pub f64);

impl Position {
    /// Creates a position from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self(lat, lon)
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.0
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(self) -> f64 {
        self.1
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }

    /// Whether latitude is within `[-90, 90]` and longitude within
    /// `[-180, 180]`. NaN is never in range.
    #[must_use]
    pub const fn is_in_range(self) -> bool {
        self.0 >= -90.0 && self.0 <= 90.0 && self.1 >= -180.0 && self.1 <= 180.0
    }
}

/// What kind of incident was reported.
///
/// Unrecognized names deserialize as [`IncidentKind::Other`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentKind {
    /// Taking property by force or threat.
    Robbery,
    /// Physical attack.
    Assault,
    /// Suspicious activity.
    Suspicious,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

impl IncidentKind {
    /// Parses a kind by name, falling back to [`IncidentKind::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or(Self::Other)
    }

    /// Relative weight of a single incident of this kind when zones are
    /// classified by weighted counts instead of raw counts.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::Assault => 2.0,
            Self::Robbery => 1.5,
            Self::Other => 1.0,
            Self::Suspicious => 0.5,
        }
    }
}

/// A single geolocated incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier. Used only to track which incidents were already
    /// assigned to a zone.
    pub id: String,
    /// Where the incident happened.
    pub position: Position,
    /// Incident kind.
    #[serde(rename = "type", default)]
    pub kind: IncidentKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Whether another user confirmed the incident.
    #[serde(default)]
    pub verified: bool,
}

impl Incident {
    /// Creates an unverified incident of kind [`IncidentKind::Other`] with
    /// an empty description.
    #[must_use]
    pub fn new(id: impl Into<String>, position: Position, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            position,
            kind: IncidentKind::Other,
            timestamp,
            description: String::new(),
            verified: false,
        }
    }

    /// Sets the incident kind.
    #[must_use]
    pub fn with_kind(mut self, kind: IncidentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Checks that the position is finite and within WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns an [`IncidentError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), IncidentError> {
        let Position(lat, lon) = self.position;

        if !self.position.is_finite() {
            return Err(IncidentError::NonFinitePosition {
                id: self.id.clone(),
                lat,
                lon,
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(IncidentError::LatitudeOutOfRange {
                id: self.id.clone(),
                lat,
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(IncidentError::LongitudeOutOfRange {
                id: self.id.clone(),
                lon,
            });
        }

        Ok(())
    }
}

/// Report identifier, numeric in the local database and textual elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportId {
    /// Numeric primary key.
    Number(i64),
    /// Opaque string id.
    Text(String),
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Report timestamp, either epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportTimestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC) text.
    Text(String),
}

/// Where a report was filed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Street address, when the reporter supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A community report as handed over by the report-tracking service.
///
/// Only the fields needed to build an [`Incident`] are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Report id.
    pub id: ReportId,
    /// Report location.
    pub location: ReportLocation,
    /// Report type name (e.g. `"robbery"`, `"INCIDENT"`).
    #[serde(rename = "type", default)]
    pub report_type: String,
    /// When the report was filed.
    #[serde(alias = "created_at", alias = "createdAt")]
    pub timestamp: ReportTimestamp,
    /// Report body.
    #[serde(default)]
    pub description: String,
    /// Whether the report was verified.
    #[serde(default)]
    pub verified: bool,
}

/// Parses a report timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 and the `SQLite` `datetime()` format, which is UTC.
#[must_use]
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

impl TryFrom<ReportRecord> for Incident {
    type Error = IncidentError;

    fn try_from(report: ReportRecord) -> Result<Self, Self::Error> {
        let id = report.id.to_string();
        let timestamp = match report.timestamp {
            ReportTimestamp::Millis(ms) => ms,
            ReportTimestamp::Text(text) => {
                parse_timestamp_millis(&text).ok_or(IncidentError::InvalidTimestamp {
                    id: id.clone(),
                    value: text,
                })?
            }
        };

        Ok(Self {
            id,
            position: Position::new(report.location.latitude, report.location.longitude),
            kind: IncidentKind::from_name(&report.report_type),
            timestamp,
            description: report.description,
            verified: report.verified,
        })
    }
}
