/// Minimal GeoJSON model for region outlines
///
/// Only `Polygon` and `MultiPolygon` geometries carry cells; every other
/// geometry type deserializes to [`Geometry::Unsupported`] and is skipped.

use geo_types::{Coord, LineString, Polygon};
use serde::Deserialize;
use serde_json::Value;

/// [lon, lat, ...]
pub type Position = Vec<f64>;
pub type Ring = Vec<Position>;
/// Outer ring followed by holes
pub type PolygonCoords = Vec<Ring>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.features.iter().filter_map(|feature| feature.geometry.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGeometry")]
pub enum Geometry {
    Polygon(PolygonCoords),
    MultiPolygon(Vec<PolygonCoords>),
    Unsupported(String),
}

impl Geometry {
    /// Constituent polygons; empty for unsupported geometry
    pub fn polygons(&self) -> Vec<&PolygonCoords> {
        match self {
            Geometry::Polygon(polygon) => vec![polygon],
            Geometry::MultiPolygon(polygons) => polygons.iter().collect(),
            Geometry::Unsupported(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl TryFrom<RawGeometry> for Geometry {
    type Error = serde_json::Error;

    fn try_from(raw: RawGeometry) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "Polygon" => Ok(Geometry::Polygon(serde_json::from_value(raw.coordinates)?)),
            "MultiPolygon" => Ok(Geometry::MultiPolygon(serde_json::from_value(raw.coordinates)?)),
            _ => Ok(Geometry::Unsupported(raw.kind)),
        }
    }
}

/// Ring vertices with the closing duplicate and repeated points removed
pub fn distinct_ring_positions(ring: &Ring) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for position in ring {
        if position.len() < 2 {
            continue;
        }
        let point = (position[0], position[1]);
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// A ring is usable when it has at least three distinct vertices
pub fn is_degenerate_ring(ring: &Ring) -> bool {
    distinct_ring_positions(ring).len() < 3
}

fn to_line_string(ring: &Ring) -> Option<LineString<f64>> {
    let points = distinct_ring_positions(ring);
    if points.len() < 3 {
        return None;
    }
    Some(LineString::new(
        points.into_iter().map(|(x, y)| Coord { x, y }).collect(),
    ))
}

/// Convert GeoJSON polygon coordinates (degrees) into a `geo` polygon.
/// Degenerate holes are dropped; a degenerate outer ring yields `None`.
pub fn to_geo_polygon(polygon: &PolygonCoords) -> Option<Polygon<f64>> {
    let (outer, holes) = polygon.split_first()?;
    let exterior = to_line_string(outer)?;
    let interiors = holes.iter().filter_map(to_line_string).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Closed square ring centred on (lon, lat), handy for fixtures
pub fn square_ring(lon: f64, lat: f64, half_size: f64) -> Ring {
    vec![
        vec![lon - half_size, lat - half_size],
        vec![lon + half_size, lat - half_size],
        vec![lon + half_size, lat + half_size],
        vec![lon - half_size, lat + half_size],
        vec![lon - half_size, lat - half_size],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "a"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": null,
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,2]]]]}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [5, 5]}},
                {"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": []}},
                {"type": "Feature", "geometry": null}
            ]
        }"#;

        let collection = FeatureCollection::from_json_str(json).unwrap();
        assert_eq!(collection.features.len(), 5);
        assert_eq!(collection.geometries().count(), 4);

        let geometries: Vec<_> = collection.geometries().collect();
        assert!(matches!(geometries[0], Geometry::Polygon(rings) if rings[0].len() == 5));
        assert!(matches!(geometries[1], Geometry::MultiPolygon(polygons) if polygons.len() == 1));
        assert_eq!(geometries[2], &Geometry::Unsupported("Point".to_string()));
        assert!(geometries[3].polygons().is_empty());
    }

    #[test]
    fn test_malformed_polygon_is_an_error() {
        let json = r#"{"features": [{"geometry": {"type": "Polygon", "coordinates": "nope"}}]}"#;
        assert!(FeatureCollection::from_json_str(json).is_err());
    }

    #[test]
    fn test_degenerate_rings() {
        assert!(is_degenerate_ring(&vec![]));
        assert!(is_degenerate_ring(&vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
        assert!(is_degenerate_ring(&vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]]));
        assert!(!is_degenerate_ring(&square_ring(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_to_geo_polygon_drops_bad_holes() {
        let polygon = vec![
            square_ring(0.0, 0.0, 2.0),
            vec![vec![0.0, 0.0], vec![0.1, 0.1]],
            square_ring(0.0, 0.0, 0.5),
        ];
        let converted = to_geo_polygon(&polygon).unwrap();
        assert_eq!(converted.interiors().len(), 1);

        assert!(to_geo_polygon(&vec![]).is_none());
        assert!(to_geo_polygon(&vec![vec![vec![0.0, 0.0]]]).is_none());
    }
}
