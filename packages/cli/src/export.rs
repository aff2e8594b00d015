//! `GeoJSON` export of danger zones.

use danger_map_geo::{EARTH_RADIUS_M, destination_point};
use danger_map_incident_models::Position;
use danger_map_zone_models::{DangerZone, ZONE_FILL_OPACITY};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};

/// `[lon, lat]`, the `GeoJSON` axis order.
fn coordinates(position: Position) -> Vec<f64> {
    vec![position.lon(), position.lat()]
}

/// A closed, counter-clockwise ring of `segments` great-circle destination
/// points around the zone center.
#[must_use]
pub fn circle_ring(center: Position, radius_m: f64, segments: u16) -> Vec<Vec<f64>> {
    let step = 360.0 / f64::from(segments);
    let mut ring: Vec<Vec<f64>> = (0..segments)
        .map(|i| {
            let bearing = -step * f64::from(i);
            coordinates(destination_point(center, bearing, radius_m, EARTH_RADIUS_M))
        })
        .collect();

    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    ring
}

fn properties(zone: &DangerZone) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), zone.id.clone().into());
    properties.insert("type".to_string(), zone.zone_type.as_ref().into());
    properties.insert("radius".to_string(), zone.radius.into());
    properties.insert("reports".to_string(), zone.reports.into());
    properties.insert("description".to_string(), zone.description.clone().into());
    properties.insert("color".to_string(), zone.zone_type.color().into());
    properties.insert("fillOpacity".to_string(), ZONE_FILL_OPACITY.into());
    properties
}

/// One feature for a zone: its center point, or a circle polygon when
/// `circle_segments` is given.
#[must_use]
pub fn zone_feature(zone: &DangerZone, circle_segments: Option<u16>) -> Feature {
    let value = match circle_segments {
        Some(segments) => Value::Polygon(vec![circle_ring(zone.center, zone.radius, segments)]),
        None => Value::Point(coordinates(zone.center)),
    };

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: Some(Id::String(zone.id.clone())),
        properties: Some(properties(zone)),
        foreign_members: None,
    }
}

/// All zones as a `FeatureCollection`, in zone order.
#[must_use]
pub fn feature_collection(zones: &[DangerZone], circle_segments: Option<u16>) -> FeatureCollection {
    let features: Vec<Feature> = zones
        .iter()
        .map(|zone| zone_feature(zone, circle_segments))
        .collect();

    log::debug!("Exporting {} zone features", features.len());

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use danger_map_geo::haversine_distance;
    use danger_map_zone_models::ZoneType;

    use super::*;

    fn zone(zone_type: ZoneType) -> DangerZone {
        DangerZone {
            id: "zone-7".to_string(),
            center: Position::new(19.4326, -99.1332),
            radius: 250.0,
            zone_type,
            description: "Alta concentración".to_string(),
            reports: 6,
        }
    }

    #[test]
    fn point_feature_uses_lon_lat_order() {
        let feature = zone_feature(&zone(ZoneType::High), None);
        let Some(Geometry {
            value: Value::Point(coords),
            ..
        }) = feature.geometry
        else {
            panic!("expected a point geometry");
        };
        assert_eq!(coords, vec![-99.1332, 19.4326]);
        assert_eq!(feature.id, Some(Id::String("zone-7".to_string())));
    }

    #[test]
    fn feature_properties_carry_style() {
        let feature = zone_feature(&zone(ZoneType::High), None);
        let properties = feature.properties.unwrap();
        assert_eq!(properties["type"], "high");
        assert_eq!(properties["color"], "#FF0000");
        assert_eq!(properties["fillOpacity"], 0.3);
        assert_eq!(properties["reports"], 6);
        assert_eq!(properties["radius"], 250.0);

        let feature = zone_feature(&zone(ZoneType::Low), None);
        assert_eq!(feature.properties.unwrap()["color"], "#FFFF00");
    }

    #[test]
    fn circle_ring_is_closed_and_on_radius() {
        let center = Position::new(19.4326, -99.1332);
        let ring = circle_ring(center, 250.0, 16);

        assert_eq!(ring.len(), 17);
        assert_eq!(ring.first(), ring.last());
        for coords in &ring {
            let d = haversine_distance(center, Position::new(coords[1], coords[0]));
            assert!((d - 250.0).abs() < 0.01, "vertex at {d} m");
        }
    }

    #[test]
    fn circle_ring_winds_counter_clockwise() {
        let ring = circle_ring(Position::new(0.0, 0.0), 1_000.0, 8);
        let area2: f64 = ring
            .windows(2)
            .map(|w| w[0][0].mul_add(w[1][1], -(w[1][0] * w[0][1])))
            .sum();
        assert!(area2 > 0.0);
    }

    #[test]
    fn polygon_feature_when_segments_given() {
        let feature = zone_feature(&zone(ZoneType::Medium), Some(12));
        let Some(Geometry {
            value: Value::Polygon(rings),
            ..
        }) = feature.geometry
        else {
            panic!("expected a polygon geometry");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 13);
    }

    #[test]
    fn collection_keeps_zone_order() {
        let mut second = zone(ZoneType::Low);
        second.id = "zone-8".to_string();
        let collection = feature_collection(&[zone(ZoneType::High), second], None);
        let ids: Vec<_> = collection.features.iter().map(|f| f.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                Some(Id::String("zone-7".to_string())),
                Some(Id::String("zone-8".to_string())),
            ]
        );
    }
}
