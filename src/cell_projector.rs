/// Geographic cell enumeration and plane projection
///
/// Turns region polygons into a deduplicated set of H3 cells and places each
/// cell on a flat plane with a spherical Mercator projection. Pure geometry:
/// the projector owns no cells and no positions.

use crate::constants::{HEX_RESOLUTION, MAX_MERCATOR_LAT};
use crate::error::{Result, SolarHexError};
use crate::geo_json::{
    FeatureCollection, Geometry, PolygonCoords, distinct_ring_positions, to_geo_polygon,
};
use glam::{DVec2, Vec3};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Which cells count as covering a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Cell centre inside the polygon (classic polyfill)
    #[default]
    Centroid,
    /// Whole cell inside the polygon
    Contained,
    /// Cell touches the polygon
    Intersects,
    /// Smallest set fully covering the polygon
    Covers,
}

impl From<Coverage> for ContainmentMode {
    fn from(coverage: Coverage) -> Self {
        match coverage {
            Coverage::Centroid => ContainmentMode::ContainsCentroid,
            Coverage::Contained => ContainmentMode::ContainsBoundary,
            Coverage::Intersects => ContainmentMode::IntersectsBoundary,
            Coverage::Covers => ContainmentMode::Covers,
        }
    }
}

/// Projected outline of a polygon: outer ring plus holes
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneShape {
    pub outer: Vec<DVec2>,
    pub holes: Vec<Vec<DVec2>>,
}

/// Spherical Mercator in radians. Latitude is clamped to ±85.05112878° so the
/// poles stay finite; absolute scale is irrelevant because the scene is
/// fitted to view afterwards.
pub fn project_to_plane(lon: f64, lat: f64) -> DVec2 {
    let clamped_lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lon_radians = lon * PI / 180.0;
    let lat_radians = clamped_lat * PI / 180.0;
    DVec2::new(lon_radians, (PI / 4.0 + lat_radians / 2.0).tan().ln())
}

/// Plane point to world position: plane `y` runs along world `-z`
pub fn plane_to_world(point: DVec2) -> Vec3 {
    Vec3::new(point.x as f32, 0.0, -point.y as f32)
}

#[derive(Debug, Clone, Copy)]
pub struct CellProjector {
    resolution: Resolution,
    coverage: Coverage,
}

impl CellProjector {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            coverage: Coverage::default(),
        }
    }

    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Cells covering one polygon (degrees, holes excluded).
    /// A degenerate outer ring covers nothing.
    pub fn cells_covering_polygon(&self, polygon: &PolygonCoords) -> Result<BTreeSet<CellIndex>> {
        let Some(polygon) = to_geo_polygon(polygon) else {
            log::debug!("Skipping polygon with a degenerate outer ring");
            return Ok(BTreeSet::new());
        };

        let mut tiler = TilerBuilder::new(self.resolution)
            .containment_mode(self.coverage.into())
            .build();
        tiler
            .add(polygon)
            .map_err(|e| SolarHexError::Geometry(e.to_string()))?;

        Ok(tiler.into_coverage().collect())
    }

    /// Union of the cells of every constituent polygon
    pub fn cells_covering_geometry(&self, geometry: &Geometry) -> Result<BTreeSet<CellIndex>> {
        let mut cells = BTreeSet::new();
        for polygon in geometry.polygons() {
            cells.extend(self.cells_covering_polygon(polygon)?);
        }
        Ok(cells)
    }

    pub fn cells_covering_features(&self, collection: &FeatureCollection) -> Result<BTreeSet<CellIndex>> {
        let mut cells = BTreeSet::new();
        for geometry in collection.geometries() {
            if let Geometry::Unsupported(kind) = geometry {
                log::debug!("Ignoring {} geometry", kind);
                continue;
            }
            cells.extend(self.cells_covering_geometry(geometry)?);
        }
        log::info!(
            "Collected {} cells at resolution {} from {} features",
            cells.len(),
            u8::from(self.resolution),
            collection.features.len()
        );
        Ok(cells)
    }

    /// Cell containing a point, `None` for non-finite coordinates
    pub fn cell_for(&self, lon: f64, lat: f64) -> Option<CellIndex> {
        LatLng::new(lat, lon).ok().map(|ll| ll.to_cell(self.resolution))
    }

    /// Outline of a polygon in the projection plane, `None` when degenerate
    pub fn project_polygon_outline(&self, polygon: &PolygonCoords) -> Option<PlaneShape> {
        let (outer, holes) = polygon.split_first()?;
        let outer = project_ring(&distinct_ring_positions(outer))?;
        let holes = holes
            .iter()
            .filter_map(|hole| project_ring(&distinct_ring_positions(hole)))
            .collect();
        Some(PlaneShape { outer, holes })
    }
}

impl Default for CellProjector {
    fn default() -> Self {
        CellProjector::new(HEX_RESOLUTION)
    }
}

/// Representative centre of a cell as (lon, lat) degrees
pub fn cell_center(cell: CellIndex) -> (f64, f64) {
    let center = LatLng::from(cell);
    (center.lng(), center.lat())
}

/// World position of a cell's bar base
pub fn cell_plane_position(cell: CellIndex) -> Vec3 {
    let (lon, lat) = cell_center(cell);
    plane_to_world(project_to_plane(lon, lat))
}

/// Projected hexagon (or pentagon) boundary of a cell
pub fn cell_outline(cell: CellIndex) -> Vec<DVec2> {
    cell.boundary()
        .iter()
        .map(|vertex| project_to_plane(vertex.lng(), vertex.lat()))
        .collect()
}

fn project_ring(points: &[(f64, f64)]) -> Option<Vec<DVec2>> {
    if points.len() < 3 {
        return None;
    }
    Some(points.iter().map(|&(lon, lat)| project_to_plane(lon, lat)).collect())
}
