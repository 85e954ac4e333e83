/// Shared hexagonal bar prototype
///
/// Every instance draws the same extruded hexagon, stretched vertically by its
/// own transform. The prototype is built once and handed to the registry by
/// `Rc`, so there is no global geometry state.

use glam::{Vec2, Vec3};

/// Centred hexagon footprint in projected plane units (radians), one
/// resolution-5 cell across at mid latitudes
const HEX_FOOTPRINT: [[f32; 2]; 6] = [
    [-0.000_458_520_07, 0.002_554_029_6],
    [-0.002_388_586_3, 0.001_118_824_5],
    [-0.001_924_098, -0.001_435_346_9],
    [0.000_462_735_64, -0.002_554_029_6],
    [0.002_388_586_3, -0.001_125_041_3],
    [0.001_931_819_7, 0.001_428_828_1],
];

const FOOTPRINT_SCALE: f32 = 0.9;
const EXTRUDE_DEPTH: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct HexPrototype {
    footprint: Vec<Vec2>,
    height: f32,
}

impl HexPrototype {
    pub fn new() -> Self {
        let footprint = HEX_FOOTPRINT
            .iter()
            .map(|[x, y]| Vec2::new(*x, *y) * FOOTPRINT_SCALE)
            .collect();
        Self {
            footprint,
            height: EXTRUDE_DEPTH * FOOTPRINT_SCALE,
        }
    }

    /// Footprint corners in the projected (x, y) plane
    pub fn footprint(&self) -> &[Vec2] {
        &self.footprint
    }

    /// Unscaled bar height along +Y
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Largest corner distance from the bar axis
    pub fn radius(&self) -> f32 {
        self.footprint.iter().map(|corner| corner.length()).fold(0.0, f32::max)
    }

    /// Prism corners: bottom ring (y = 0) then top ring (y = height).
    /// Plane `(x, y)` lies in world XZ as `(x, -y)`, matching instance placement.
    pub fn vertices(&self) -> Vec<Vec3> {
        let bottom = self.footprint.iter().map(|c| Vec3::new(c.x, 0.0, -c.y));
        let top = self.footprint.iter().map(|c| Vec3::new(c.x, self.height, -c.y));
        bottom.chain(top).collect()
    }

    /// Triangle indices into [`HexPrototype::vertices`]: both caps as fans plus two
    /// triangles per side
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let n = self.footprint.len() as u32;
        let mut triangles = Vec::with_capacity((4 * n - 4) as usize);

        for i in 1..n - 1 {
            triangles.push([0, i + 1, i]);
            triangles.push([n, n + i, n + i + 1]);
        }

        for i in 0..n {
            let next = (i + 1) % n;
            triangles.push([i, next, n + next]);
            triangles.push([i, n + next, n + i]);
        }

        triangles
    }
}

impl Default for HexPrototype {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_prism_shape() {
        let prototype = HexPrototype::new();
        let vertices = prototype.vertices();
        assert_eq!(vertices.len(), 12);
        assert_eq!(prototype.triangles().len(), 20);
        assert_abs_diff_eq!(prototype.height(), 0.9, epsilon = 1e-6);

        for (i, v) in vertices.iter().enumerate() {
            let expected_y = if i < 6 { 0.0 } else { 0.9 };
            assert_abs_diff_eq!(v.y, expected_y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_footprint_is_centred() {
        let prototype = HexPrototype::new();
        let centroid = prototype.footprint().iter().copied().sum::<Vec2>() / 6.0;
        assert_abs_diff_eq!(centroid.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(centroid.y, 0.0, epsilon = 1e-5);
        assert!(prototype.radius() > 0.002 && prototype.radius() < 0.003);
    }

    #[test]
    fn test_triangle_indices_in_range() {
        let prototype = HexPrototype::new();
        let count = prototype.vertices().len() as u32;
        for triangle in prototype.triangles() {
            assert!(triangle.iter().all(|&i| i < count));
        }
    }
}
