#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index over incident positions.
//!
//! Builds an R-tree of `[lon, lat]` points once per clustering run and
//! answers "which incidents could be within this envelope" queries. The
//! index only narrows the candidate set: the caller still applies the exact
//! distance check, and candidates come back in input order so results are
//! identical to a full linear scan.

use danger_map_geo::SearchEnvelope;
use danger_map_incident_models::Position;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

/// An indexed point: `[lon, lat]` plus the incident's input index.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Pre-built spatial index over a slice of positions.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
    /// Indexes of positions that cannot be placed in the tree: NaN,
    /// infinite, or outside WGS84 ranges. Distance models may wrap an
    /// out-of-range coordinate onto a nearby point, so these are returned
    /// with every query.
    unindexed: Vec<usize>,
    len: usize,
}

impl PointIndex {
    /// Bulk-loads the positions. Index `i` in query results refers to
    /// `positions[i]`.
    #[must_use]
    pub fn build(positions: &[Position]) -> Self {
        let mut points = Vec::with_capacity(positions.len());
        let mut unindexed = Vec::new();

        for (i, position) in positions.iter().enumerate() {
            if position.is_in_range() {
                points.push(IndexedPoint::new([position.lon(), position.lat()], i));
            } else {
                unindexed.push(i);
            }
        }

        if !unindexed.is_empty() {
            log::debug!(
                "{} of {} positions are not finite or out of range and bypass the spatial index",
                unindexed.len(),
                positions.len()
            );
        }

        Self {
            tree: RTree::bulk_load(points),
            unindexed,
            len: positions.len(),
        }
    }

    /// Number of positions the index was built from.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index was built from an empty slice.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Candidate indexes for `envelope`, in ascending (input) order.
    ///
    /// With no envelope every index is a candidate.
    #[must_use]
    pub fn candidates(&self, envelope: Option<&SearchEnvelope>) -> Vec<usize> {
        let Some(envelope) = envelope else {
            return (0..self.len).collect();
        };

        let query = AABB::from_corners(
            [envelope.min_lon, envelope.min_lat],
            [envelope.max_lon, envelope.max_lat],
        );

        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope(&query)
            .map(|point| point.data)
            .chain(self.unindexed.iter().copied())
            .collect();
        found.sort_unstable();
        found
    }
}
