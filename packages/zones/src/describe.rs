//! Human-readable zone text.

use danger_map_incident_models::Incident;
use danger_map_zone_models::{DangerZone, ZoneType};

use crate::config::DescriptionConfig;

/// Renders zone descriptions and tap summaries from templates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneDescriber {
    config: DescriptionConfig,
}

impl ZoneDescriber {
    /// Creates a describer from description settings.
    #[must_use]
    pub const fn new(config: DescriptionConfig) -> Self {
        Self { config }
    }

    /// The density phrase for a tier.
    #[must_use]
    pub fn density_phrase(&self, zone_type: ZoneType) -> &str {
        match zone_type {
            ZoneType::High => &self.config.high,
            ZoneType::Medium => &self.config.medium,
            ZoneType::Low => &self.config.low,
        }
    }

    /// How many members are strictly newer than the recency window.
    ///
    /// Future timestamps count as recent.
    #[must_use]
    pub fn recent_count(&self, members: &[&Incident], now_ms: i64) -> usize {
        members
            .iter()
            .filter(|m| now_ms.saturating_sub(m.timestamp) < self.config.recent_window_ms)
            .count()
    }

    /// The zone description: density phrase, member count and recent count.
    #[must_use]
    pub fn describe(&self, zone_type: ZoneType, members: &[&Incident], now_ms: i64) -> String {
        self.config
            .template
            .replace("{density}", self.density_phrase(zone_type))
            .replace("{total}", &members.len().to_string())
            .replace("{recent}", &self.recent_count(members, now_ms).to_string())
    }

    /// The text shown when a zone is selected on the map.
    #[must_use]
    pub fn summary(&self, zone: &DangerZone) -> String {
        self.config
            .summary_template
            .replace("{level}", zone.zone_type.as_ref())
            .replace("{reports}", &zone.reports.to_string())
            .replace("{description}", &zone.description)
    }
}
