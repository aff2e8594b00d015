//! Greedy distance-threshold clustering.
//!
//! Seeds are visited most recent first. Each unassigned seed claims every
//! unassigned incident within the maximum zone radius (itself included),
//! and the claimed group becomes one zone. Claimed incidents can neither
//! seed nor join another zone, so zones partition the incidents they cover
//! even when their circles overlap on the map.
//!
//! Neighborhoods are always collected in input order. This fixes the
//! summation order of the center, which keeps results identical across
//! search strategies.

use std::collections::BTreeSet;
use std::sync::Arc;

use danger_map_geo::DistanceModel;
use danger_map_incident_models::{Incident, Position};
use danger_map_spatial::PointIndex;
use danger_map_zone_models::DangerZone;

use crate::clock::{Clock, SystemClock};
use crate::config::{RadiusConfig, SearchStrategy, TieBreak, ZoneConfig};
use crate::describe::ZoneDescriber;
use crate::risk::RiskModel;

/// A zone together with the incidents it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneCluster<'a> {
    /// The derived zone.
    pub zone: DangerZone,
    /// Member incidents, in input order.
    pub members: Vec<&'a Incident>,
}

/// Turns incidents into danger zones.
///
/// Holds only immutable settings and `Send + Sync` collaborators, so one
/// instance can serve concurrent callers.
pub struct ZoneClusterer {
    radius: RadiusConfig,
    tie_break: TieBreak,
    search: SearchStrategy,
    distance: Arc<dyn DistanceModel>,
    risk: Arc<dyn RiskModel>,
    describer: ZoneDescriber,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ZoneClusterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneClusterer")
            .field("radius", &self.radius)
            .field("tie_break", &self.tie_break)
            .field("search", &self.search)
            .field("distance", &self.distance.name())
            .field("risk", &self.risk.name())
            .finish_non_exhaustive()
    }
}

impl Default for ZoneClusterer {
    fn default() -> Self {
        Self::new(&ZoneConfig::default())
    }
}

impl ZoneClusterer {
    /// Builds a clusterer from a config, reading time from the wall clock.
    ///
    /// The config is assumed valid; see [`ZoneConfig::validate`].
    #[must_use]
    pub fn new(config: &ZoneConfig) -> Self {
        Self {
            radius: config.radius.clone(),
            tie_break: config.clustering.tie_break,
            search: config.clustering.search,
            distance: config.clustering.distance.model(),
            risk: config.clustering.risk.model(&config.thresholds),
            describer: ZoneDescriber::new(config.description.clone()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the distance model.
    #[must_use]
    pub fn with_distance_model(mut self, distance: Arc<dyn DistanceModel>) -> Self {
        self.distance = distance;
        self
    }

    /// Replaces the risk model.
    #[must_use]
    pub fn with_risk_model(mut self, risk: Arc<dyn RiskModel>) -> Self {
        self.risk = risk;
        self
    }

    /// Replaces the clock used by [`Self::compute_zones`].
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the neighborhood search strategy.
    #[must_use]
    pub fn with_search(mut self, search: SearchStrategy) -> Self {
        self.search = search;
        self
    }

    /// The describer, for rendering tap summaries of produced zones.
    #[must_use]
    pub const fn describer(&self) -> &ZoneDescriber {
        &self.describer
    }

    /// Computes zones, taking "now" from the configured clock.
    #[must_use]
    pub fn compute_zones(&self, incidents: &[Incident]) -> Vec<DangerZone> {
        self.compute_zones_at(incidents, self.clock.now_millis())
    }

    /// Computes zones as of `now_ms`. Pure: equal inputs give equal zones.
    #[must_use]
    pub fn compute_zones_at(&self, incidents: &[Incident], now_ms: i64) -> Vec<DangerZone> {
        self.cluster_at(incidents, now_ms)
            .into_iter()
            .map(|cluster| cluster.zone)
            .collect()
    }

    /// Computes zones with their member incidents, as of `now_ms`.
    #[must_use]
    pub fn cluster_at<'a>(&self, incidents: &'a [Incident], now_ms: i64) -> Vec<ZoneCluster<'a>> {
        if incidents.is_empty() {
            return Vec::new();
        }

        let index = match self.search {
            SearchStrategy::Linear => None,
            SearchStrategy::RTree => {
                let positions: Vec<Position> = incidents.iter().map(|i| i.position).collect();
                Some(PointIndex::build(&positions))
            }
        };

        let mut processed: BTreeSet<&str> = BTreeSet::new();
        let mut clusters: Vec<ZoneCluster<'a>> = Vec::new();

        for seed in self.seed_order(incidents) {
            let seed = &incidents[seed];
            if processed.contains(seed.id.as_str()) {
                continue;
            }

            let members = self.neighborhood(incidents, seed.position, &processed, index.as_ref());
            if members.len() < self.risk.min_group_size() {
                log::trace!(
                    "Seed {} gathered {} incident(s), below the minimum group size",
                    seed.id,
                    members.len()
                );
                continue;
            }

            let zone = self.build_zone(&members, clusters.len() + 1, now_ms);
            log::debug!(
                "Created {} around seed {}: {} report(s), {}, radius {:.1} m",
                zone.id,
                seed.id,
                zone.reports,
                zone.zone_type,
                zone.radius
            );

            processed.extend(members.iter().map(|m| m.id.as_str()));
            clusters.push(ZoneCluster { zone, members });
        }

        log::debug!(
            "Clustered {} incident(s) into {} zone(s) using {} distance and {} search",
            incidents.len(),
            clusters.len(),
            self.distance.name(),
            self.search
        );

        clusters
    }

    /// Input indexes sorted most recent first. The sort is stable, so
    /// equal timestamps keep input order unless ids break the tie.
    fn seed_order(&self, incidents: &[Incident]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..incidents.len()).collect();
        match self.tie_break {
            TieBreak::InputOrder => {
                order.sort_by(|&a, &b| incidents[b].timestamp.cmp(&incidents[a].timestamp));
            }
            TieBreak::Id => order.sort_by(|&a, &b| {
                incidents[b]
                    .timestamp
                    .cmp(&incidents[a].timestamp)
                    .then_with(|| incidents[a].id.cmp(&incidents[b].id))
            }),
        }
        order
    }

    /// Unprocessed incidents within the maximum radius of `center`, in
    /// input order.
    fn neighborhood<'a>(
        &self,
        incidents: &'a [Incident],
        center: Position,
        processed: &BTreeSet<&str>,
        index: Option<&PointIndex>,
    ) -> Vec<&'a Incident> {
        let max = self.radius.max_meters;
        let is_member = |incident: &Incident| {
            !processed.contains(incident.id.as_str())
                && self.distance.distance(center, incident.position) <= max
        };

        match index {
            None => incidents.iter().filter(|&i| is_member(i)).collect(),
            Some(index) => {
                let envelope = self.distance.search_envelope(center, max);
                index
                    .candidates(envelope.as_ref())
                    .into_iter()
                    .map(|i| &incidents[i])
                    .filter(|&i| is_member(i))
                    .collect()
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn build_zone(&self, members: &[&Incident], n: usize, now_ms: i64) -> DangerZone {
        let count = members.len() as f64;
        let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), m| {
            (lat + m.position.lat(), lon + m.position.lon())
        });
        let center = Position::new(lat_sum / count, lon_sum / count);

        let farthest = members
            .iter()
            .map(|m| self.distance.distance(center, m.position))
            .fold(f64::NEG_INFINITY, f64::max);
        let radius = (farthest + self.radius.margin_meters)
            .min(self.radius.max_meters)
            .max(self.radius.min_meters);

        let zone_type = self.risk.classify(members);

        DangerZone {
            id: DangerZone::sequential_id(n),
            center,
            radius,
            zone_type,
            description: self.describer.describe(zone_type, members, now_ms),
            reports: members.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use danger_map_geo::{DistanceKind, haversine_distance};
    use danger_map_incident_models::IncidentKind;
    use danger_map_zone_models::ZoneType;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{MAX_ZONE_RADIUS, MIN_ZONE_RADIUS, RiskKind};

    const NOW: i64 = 1_700_000_000_000;

    fn incident(id: &str, lat: f64, lon: f64, timestamp: i64) -> Incident {
        Incident::new(id, Position::new(lat, lon), timestamp)
    }

    fn zones(incidents: &[Incident]) -> Vec<DangerZone> {
        ZoneClusterer::default().compute_zones_at(incidents, NOW)
    }

    /// Linear congruential generator yielding values in `[0, 1)`.
    struct Lcg(u64);

    impl Lcg {
        #[allow(clippy::cast_precision_loss)]
        fn next_unit(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 11) as f64 / (1_u64 << 53) as f64
        }
    }

    /// Deterministic scatter of `n` incidents over roughly 5 km x 5 km.
    #[allow(clippy::cast_possible_truncation)]
    fn scatter(n: usize, seed: u64) -> Vec<Incident> {
        let mut rng = Lcg(seed);
        (0..n)
            .map(|i| {
                let lat = rng.next_unit().mul_add(0.045, 40.40);
                let lon = rng.next_unit().mul_add(0.06, -3.72);
                let ts = NOW - (rng.next_unit() * 172_800_000.0) as i64;
                incident(&format!("inc-{i}"), lat, lon, ts)
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_no_zones() {
        assert!(zones(&[]).is_empty());
    }

    #[test]
    fn single_incident_yields_minimum_low_zone() {
        let result = zones(&[incident("a", 40.0, -3.0, NOW)]);
        assert_eq!(result.len(), 1);
        let zone = &result[0];
        assert_eq!(zone.id, "zone-1");
        assert_eq!(zone.reports, 1);
        assert_eq!(zone.zone_type, ZoneType::Low);
        assert!((zone.radius - MIN_ZONE_RADIUS).abs() < f64::EPSILON);
        assert_eq!(zone.center, Position::new(40.0, -3.0));
    }

    #[test]
    fn three_points_along_equator() {
        let t = NOW;
        let result = zones(&[
            incident("a", 0.0, 0.0, t),
            incident("b", 0.0, 0.001, t - 1),
            incident("c", 0.0, 0.002, t - 2),
        ]);
        assert_eq!(result.len(), 1);
        let zone = &result[0];
        assert_eq!(zone.reports, 3);
        assert_eq!(zone.zone_type, ZoneType::Medium);
        assert!(zone.center.lat().abs() < 1e-12);
        assert!((zone.center.lon() - 0.001).abs() < 1e-12);
        let expected = haversine_distance(zone.center, Position::new(0.0, 0.0)) + 50.0;
        assert!((zone.radius - expected).abs() < 1e-9, "radius {}", zone.radius);
        assert!((zone.radius - 161.19).abs() < 0.01);
    }

    #[test]
    fn tiers_follow_member_counts() {
        for (count, expected) in [
            (1, ZoneType::Low),
            (2, ZoneType::Low),
            (3, ZoneType::Medium),
            (4, ZoneType::Medium),
            (5, ZoneType::High),
            (7, ZoneType::High),
        ] {
            let incidents: Vec<Incident> = (0..count)
                .map(|i| {
                    let offset = f64::from(i) * 0.0005;
                    incident(&format!("i{i}"), 10.0 + offset, 20.0, NOW - i64::from(i))
                })
                .collect();
            let result = zones(&incidents);
            assert_eq!(result.len(), 1, "count {count}");
            assert_eq!(result[0].reports, usize::try_from(count).unwrap());
            assert_eq!(result[0].zone_type, expected, "count {count}");
        }
    }

    #[test]
    fn wide_group_is_clamped_to_maximum_radius() {
        let result = zones(&[
            incident("seed", 0.0, 0.0, NOW),
            incident("east", 0.0, 0.0089, NOW - 1),
            incident("west", 0.0, -0.0089, NOW - 2),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].reports, 3);
        assert!((result[0].radius - MAX_ZONE_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn coincident_group_gets_minimum_radius() {
        let incidents: Vec<Incident> = (0..4)
            .map(|i| incident(&format!("i{i}"), 51.5, -0.12, NOW - i))
            .collect();
        let result = zones(&incidents);
        assert_eq!(result.len(), 1);
        assert!((result[0].radius - MIN_ZONE_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn absorbed_incidents_do_not_seed_or_join_again() {
        // b is within reach of both a and c; a is newer, so it claims b.
        let result = zones(&[
            incident("a", 0.0, 0.0, 3),
            incident("b", 0.0, 0.0085, 1),
            incident("c", 0.0, 0.017, 2),
        ]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "zone-1");
        assert_eq!(result[0].reports, 2);
        assert_eq!(result[1].id, "zone-2");
        assert_eq!(result[1].reports, 1);
        assert_eq!(result[1].center, Position::new(0.0, 0.017));
        assert!((result[1].radius - MIN_ZONE_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn shared_id_is_claimed_once() {
        // Claimed incidents are tracked by id, so the second "dup" is
        // skipped even though it is far from the first.
        let result = zones(&[
            incident("dup", 0.0, 0.0, 2),
            incident("dup", 10.0, 10.0, 1),
            incident("other", 10.0, 10.0001, 0),
        ]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].reports, 1);
        assert_eq!(result[0].center, Position::new(0.0, 0.0));
        assert_eq!(result[1].reports, 1);
        assert_eq!(result[1].center, Position::new(10.0, 10.0001));
    }

    #[test]
    fn every_incident_lands_in_exactly_one_zone() {
        let incidents = scatter(200, 7);
        let clusterer = ZoneClusterer::default();
        let clusters = clusterer.cluster_at(&incidents, NOW);

        let total: usize = clusters.iter().map(|c| c.zone.reports).sum();
        assert_eq!(total, incidents.len());

        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            assert_eq!(cluster.zone.reports, cluster.members.len());
            assert!(cluster.zone.radius >= MIN_ZONE_RADIUS);
            assert!(cluster.zone.radius <= MAX_ZONE_RADIUS);
            for member in &cluster.members {
                assert!(seen.insert(member.id.as_str()), "{} in two zones", member.id);
            }
        }
    }

    #[test]
    fn zone_ids_are_sequential() {
        let result = zones(&scatter(80, 3));
        for (i, zone) in result.iter().enumerate() {
            assert_eq!(zone.id, format!("zone-{}", i + 1));
        }
    }

    #[test]
    fn same_input_same_instant_same_zones() {
        let incidents = scatter(120, 11);
        assert_eq!(zones(&incidents), zones(&incidents));
    }

    #[test]
    fn input_permutation_with_distinct_timestamps_keeps_zones() {
        let incidents: Vec<Incident> = scatter(60, 5)
            .into_iter()
            .enumerate()
            .map(|(i, mut inc)| {
                inc.timestamp = NOW - i64::try_from(i).unwrap() * 1_000;
                inc
            })
            .collect();
        let mut reversed = incidents.clone();
        reversed.reverse();

        let forward = zones(&incidents);
        let backward = zones(&reversed);
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!(f.id, b.id);
            assert_eq!(f.reports, b.reports);
            assert_eq!(f.zone_type, b.zone_type);
            assert!((f.center.lat() - b.center.lat()).abs() < 1e-9);
            assert!((f.center.lon() - b.center.lon()).abs() < 1e-9);
            assert!((f.radius - b.radius).abs() < 1e-6);
        }
    }

    #[test]
    fn equal_timestamps_follow_configured_tie_break() {
        let incidents = [incident("b", 0.0, 0.0, 5), incident("a", 0.0, 1.0, 5)];

        let by_input = zones(&incidents);
        assert_eq!(by_input[0].center, Position::new(0.0, 0.0));

        let mut config = ZoneConfig::default();
        config.clustering.tie_break = TieBreak::Id;
        let by_id = ZoneClusterer::new(&config).compute_zones_at(&incidents, NOW);
        assert_eq!(by_id[0].center, Position::new(0.0, 1.0));
        assert_eq!(by_id[1].center, Position::new(0.0, 0.0));
    }

    #[test]
    fn non_finite_positions_never_join_a_zone() {
        let incidents = [
            incident("bad", f64::NAN, 0.0, 10),
            incident("good", 0.0, 0.0, 5),
        ];
        for search in [SearchStrategy::Linear, SearchStrategy::RTree] {
            let result = ZoneClusterer::default()
                .with_search(search)
                .compute_zones_at(&incidents, NOW);
            assert_eq!(result.len(), 1, "{search}");
            assert_eq!(result[0].reports, 1);
            assert_eq!(result[0].center, Position::new(0.0, 0.0));
        }
    }

    #[test]
    fn rtree_search_matches_linear_scan() {
        for seed in [1, 2, 3] {
            let incidents = scatter(300, seed);
            let linear = ZoneClusterer::default().compute_zones_at(&incidents, NOW);
            let indexed = ZoneClusterer::default()
                .with_search(SearchStrategy::RTree)
                .compute_zones_at(&incidents, NOW);
            assert_eq!(linear, indexed, "seed {seed}");
        }
    }

    #[test]
    fn rtree_search_matches_linear_scan_for_wrapped_longitude() {
        let incidents = [
            incident("a", 10.0, 20.0, NOW),
            incident("b", 10.0, 380.0, NOW - 1),
            incident("c", 10.0, 20.0005, NOW - 2),
        ];
        let linear = zones(&incidents);
        let indexed = ZoneClusterer::default()
            .with_search(SearchStrategy::RTree)
            .compute_zones_at(&incidents, NOW);
        assert_eq!(linear.len(), 1);
        assert_eq!(linear[0].reports, 3);
        assert_eq!(linear, indexed);
    }

    #[test]
    fn rtree_search_matches_linear_scan_for_geodesic_model() {
        let incidents = scatter(150, 9);
        let geodesic = DistanceKind::Geodesic.model();
        let linear = ZoneClusterer::default()
            .with_distance_model(geodesic.clone())
            .compute_zones_at(&incidents, NOW);
        let indexed = ZoneClusterer::default()
            .with_distance_model(geodesic)
            .with_search(SearchStrategy::RTree)
            .compute_zones_at(&incidents, NOW);
        assert_eq!(linear, indexed);
    }

    #[test]
    fn description_counts_recent_members() {
        let result = zones(&[
            incident("a", 0.0, 0.0, NOW - 1_000),
            incident("b", 0.0, 0.0, NOW - 90_000_000),
            incident("c", 0.0, 0.0, NOW - 100_000_000),
        ]);
        assert_eq!(
            result[0].description,
            "Concentración moderada de incidentes en esta zona.\n\
             3 incidentes totales.\n\
             1 en las últimas 24 horas."
        );
    }

    #[test]
    fn compute_zones_reads_the_injected_clock() {
        let incidents = [incident("a", 0.0, 0.0, NOW - 1_000)];
        let clusterer = ZoneClusterer::default().with_clock(Arc::new(FixedClock(NOW)));
        assert_eq!(
            clusterer.compute_zones(&incidents),
            clusterer.compute_zones_at(&incidents, NOW)
        );

        let later = ZoneClusterer::default().with_clock(Arc::new(FixedClock(NOW + 86_400_000)));
        assert!(later.compute_zones(&incidents)[0]
            .description
            .ends_with("0 en las últimas 24 horas."));
    }

    #[test]
    fn weighted_risk_model_changes_tiers_not_groups() {
        let incidents: Vec<Incident> = (0..3)
            .map(|i| incident(&format!("i{i}"), 0.0, 0.0, NOW - i).with_kind(IncidentKind::Assault))
            .collect();

        let mut config = ZoneConfig::default();
        config.clustering.risk = RiskKind::Weighted;
        let weighted = ZoneClusterer::new(&config).compute_zones_at(&incidents, NOW);
        let counted = zones(&incidents);

        assert_eq!(weighted.len(), counted.len());
        assert_eq!(weighted[0].reports, counted[0].reports);
        assert_eq!(counted[0].zone_type, ZoneType::Medium);
        assert_eq!(weighted[0].zone_type, ZoneType::High);
    }

    #[test]
    fn higher_minimum_group_size_drops_isolated_incidents() {
        let mut config = ZoneConfig::default();
        config.thresholds.low = 2;
        let result = ZoneClusterer::new(&config).compute_zones_at(
            &[
                incident("lonely", 0.0, 1.0, 10),
                incident("a", 0.0, 0.0, 9),
                incident("b", 0.0, 0.001, 8),
            ],
            NOW,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "zone-1");
        assert_eq!(result[0].reports, 2);
    }

    #[test]
    fn clusterer_is_shareable_across_threads() {
        let clusterer = Arc::new(ZoneClusterer::default());
        let incidents = Arc::new(scatter(50, 4));
        let expected = clusterer.compute_zones_at(&incidents, NOW);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clusterer = Arc::clone(&clusterer);
                let incidents = Arc::clone(&incidents);
                std::thread::spawn(move || clusterer.compute_zones_at(&incidents, NOW))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
