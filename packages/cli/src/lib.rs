#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading, rendering and error types behind the `danger_map` binary.

pub mod export;
pub mod input;

use std::path::PathBuf;

use danger_map_incident_models::IncidentError;
use danger_map_zone_models::DangerZone;
use danger_map_zones::ConfigError;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Errors surfaced by the command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Input was not the expected JSON shape, or output failed to encode.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The zone configuration was unreadable or inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A record was invalid and `--strict` was set.
    #[error(transparent)]
    Incident(#[from] IncidentError),
}

/// Output encoding for computed zones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    /// The zone array as JSON, with `center` as `[lat, lon]`.
    #[default]
    Json,
    /// A `GeoJSON` `FeatureCollection`.
    Geojson,
}

/// Renders zones in the requested format.
///
/// `circle_segments` only applies to [`OutputFormat::Geojson`].
///
/// # Errors
///
/// * If JSON encoding fails
pub fn render(
    zones: &[DangerZone],
    format: OutputFormat,
    circle_segments: Option<u16>,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(zones)?,
        OutputFormat::Geojson => {
            let collection = export::feature_collection(zones, circle_segments);
            serde_json::to_string_pretty(&geojson::GeoJson::FeatureCollection(collection))?
        }
    })
}
