//! Clustering configuration, loaded from TOML.
//!
//! The defaults reproduce the reference behavior exactly. They are also
//! shipped as `config/default.toml`, embedded at compile time, so the
//! `default-config` command can print a commented starting point.

use std::path::{Path, PathBuf};

use danger_map_geo::DistanceKind;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Smallest zone radius, in meters.
pub const MIN_ZONE_RADIUS: f64 = 100.0;
/// Largest zone radius and neighborhood search distance, in meters.
pub const MAX_ZONE_RADIUS: f64 = 1000.0;
/// Slack added to the farthest member distance, in meters.
pub const ZONE_RADIUS_MARGIN: f64 = 50.0;
/// Member count for a high-risk zone.
pub const HIGH_THRESHOLD: usize = 5;
/// Member count for a medium-risk zone.
pub const MEDIUM_THRESHOLD: usize = 3;
/// Minimum group size that forms a zone.
pub const LOW_THRESHOLD: usize = 1;
/// Recency window for the description text: 24 hours in milliseconds.
pub const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// The embedded default configuration file.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors from loading or validating a [`ZoneConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML was malformed or had unknown keys.
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered back to TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values parsed but are inconsistent.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// How incidents with equal timestamps are ordered when picking seeds.
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
pub enum TieBreak {
    /// Keep input order (stable sort).
    #[default]
    InputOrder,
    /// Ascending incident id.
    Id,
}

/// How the neighborhood of a seed is searched.
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
pub enum SearchStrategy {
    /// Check every incident against every seed.
    #[default]
    Linear,
    /// Pre-filter candidates with an R-tree.
    #[serde(rename = "rtree")]
    #[strum(serialize = "rtree")]
    RTree,
}

/// Which [`crate::risk::RiskModel`] classifies zones.
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
pub enum RiskKind {
    /// Compare the member count against the thresholds.
    #[default]
    Count,
    /// Compare the sum of per-kind incident weights against the thresholds.
    Weighted,
}

/// Zone radius bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadiusConfig {
    /// Smallest radius, in meters.
    pub min_meters: f64,
    /// Largest radius and search distance, in meters.
    pub max_meters: f64,
    /// Added to the farthest member distance, in meters.
    pub margin_meters: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            min_meters: MIN_ZONE_RADIUS,
            max_meters: MAX_ZONE_RADIUS,
            margin_meters: ZONE_RADIUS_MARGIN,
        }
    }
}

/// Risk tier thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// At or above this, a zone is high risk.
    pub high: usize,
    /// At or above this, a zone is medium risk.
    pub medium: usize,
    /// Minimum group size that forms a zone at all.
    pub low: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high: HIGH_THRESHOLD,
            medium: MEDIUM_THRESHOLD,
            low: LOW_THRESHOLD,
        }
    }
}

/// Description and summary text.
///
/// `template` understands `{density}`, `{total}` and `{recent}`;
/// `summary_template` understands `{level}`, `{reports}` and `{description}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescriptionConfig {
    /// Incidents newer than this many milliseconds count as recent.
    pub recent_window_ms: i64,
    /// Density phrase for high-risk zones.
    pub high: String,
    /// Density phrase for medium-risk zones.
    pub medium: String,
    /// Density phrase for low-risk zones.
    pub low: String,
    /// Zone description template.
    pub template: String,
    /// Text shown when a zone is selected on the map.
    pub summary_template: String,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            recent_window_ms: RECENT_WINDOW_MS,
            high: "Alta concentración".to_string(),
            medium: "Concentración moderada".to_string(),
            low: "Baja concentración".to_string(),
            template: "{density} de incidentes en esta zona.\n\
                       {total} incidentes totales.\n\
                       {recent} en las últimas 24 horas."
                .to_string(),
            summary_template: "Nivel de riesgo: {level}\nReportes: {reports}\n{description}"
                .to_string(),
        }
    }
}

/// Algorithm knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringConfig {
    /// Seed ordering for equal timestamps.
    pub tie_break: TieBreak,
    /// Neighborhood search strategy.
    pub search: SearchStrategy,
    /// Distance model.
    pub distance: DistanceKind,
    /// Risk model.
    pub risk: RiskKind,
}

/// Full clustering configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneConfig {
    /// Radius bounds.
    pub radius: RadiusConfig,
    /// Risk thresholds.
    pub thresholds: ThresholdConfig,
    /// Description text.
    pub description: DescriptionConfig,
    /// Algorithm knobs.
    pub clustering: ClusteringConfig,
}

impl ZoneConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for inconsistent values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded zone config from {}", path.display());
        Ok(config)
    }

    /// Parses the embedded default configuration file.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::from_toml_str`] if the embedded file
    /// is malformed.
    pub fn embedded_default() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that the values are mutually consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let RadiusConfig {
            min_meters,
            max_meters,
            margin_meters,
        } = self.radius;

        if !(min_meters.is_finite() && min_meters > 0.0) {
            return Err(ConfigError::invalid(format!(
                "radius.min_meters must be positive, got {min_meters}"
            )));
        }
        if !max_meters.is_finite() || max_meters < min_meters {
            return Err(ConfigError::invalid(format!(
                "radius.max_meters ({max_meters}) must be >= radius.min_meters ({min_meters})"
            )));
        }
        if !(margin_meters.is_finite() && margin_meters >= 0.0) {
            return Err(ConfigError::invalid(format!(
                "radius.margin_meters must be non-negative, got {margin_meters}"
            )));
        }

        let ThresholdConfig { high, medium, low } = self.thresholds;
        if low == 0 || medium < low || high < medium {
            return Err(ConfigError::invalid(format!(
                "thresholds must satisfy high >= medium >= low >= 1, got {high}/{medium}/{low}"
            )));
        }

        if self.description.recent_window_ms <= 0 {
            return Err(ConfigError::invalid(format!(
                "description.recent_window_ms must be positive, got {}",
                self.description.recent_window_ms
            )));
        }

        Ok(())
    }
}
