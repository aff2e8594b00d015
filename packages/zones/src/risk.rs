//! Risk tier classification for a group of incidents.

use std::sync::Arc;

use danger_map_incident_models::Incident;
use danger_map_zone_models::ZoneType;

use crate::config::{RiskKind, ThresholdConfig};

/// Decides whether a neighborhood forms a zone and which tier it gets.
pub trait RiskModel: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Smallest neighborhood that forms a zone.
    fn min_group_size(&self) -> usize;

    /// Risk tier for a zone with these members.
    fn classify(&self, members: &[&Incident]) -> ZoneType;
}

/// Tiers by member count: `>= high` is high, `>= medium` is medium,
/// anything else is low.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountThresholds {
    thresholds: ThresholdConfig,
}

impl CountThresholds {
    /// Creates the model from thresholds.
    #[must_use]
    pub const fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Tier for a raw member count.
    #[must_use]
    pub const fn tier_for(&self, count: usize) -> ZoneType {
        if count >= self.thresholds.high {
            ZoneType::High
        } else if count >= self.thresholds.medium {
            ZoneType::Medium
        } else {
            ZoneType::Low
        }
    }
}

impl Default for CountThresholds {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl RiskModel for CountThresholds {
    fn name(&self) -> &'static str {
        "count"
    }

    fn min_group_size(&self) -> usize {
        self.thresholds.low
    }

    fn classify(&self, members: &[&Incident]) -> ZoneType {
        self.tier_for(members.len())
    }
}

/// Tiers by the sum of [`danger_map_incident_models::IncidentKind::default_weight`]
/// over the members, compared against the same thresholds.
///
/// Group formation still uses the raw count, so a zone forms exactly when
/// it would under [`CountThresholds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedThresholds {
    thresholds: ThresholdConfig,
}

impl WeightedThresholds {
    /// Creates the model from thresholds.
    #[must_use]
    pub const fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }
}

impl RiskModel for WeightedThresholds {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn min_group_size(&self) -> usize {
        self.thresholds.low
    }

    #[allow(clippy::cast_precision_loss)]
    fn classify(&self, members: &[&Incident]) -> ZoneType {
        let weight: f64 = members.iter().map(|m| m.kind.default_weight()).sum();

        if weight >= self.thresholds.high as f64 {
            ZoneType::High
        } else if weight >= self.thresholds.medium as f64 {
            ZoneType::Medium
        } else {
            ZoneType::Low
        }
    }
}

impl RiskKind {
    /// Instantiates the model for these thresholds.
    #[must_use]
    pub fn model(self, thresholds: &ThresholdConfig) -> Arc<dyn RiskModel> {
        match self {
            Self::Count => Arc::new(CountThresholds::new(thresholds.clone())),
            Self::Weighted => Arc::new(WeightedThresholds::new(thresholds.clone())),
        }
    }
}
