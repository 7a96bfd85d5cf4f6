//! Facet normal computation and flat-shading expansion

use glam::DVec3;

use crate::mesh::{Facet, Mesh, Point};

/// Unit normal of a triangle by the right-hand rule
///
/// Degenerate (zero-area) triangles get a zero vector.
pub fn facet_normal(facet: &Facet) -> Point {
    let [a, b, c] = facet.map(DVec3::from_array);
    (b - a).cross(c - a).normalize_or_zero().to_array()
}

impl Mesh {
    /// Replace `facet_normals` with normals derived from the geometry
    pub fn compute_facet_normals(&mut self) {
        let normals = self.facets().map(|f| facet_normal(&f)).collect();
        self.facet_normals = Some(normals);
    }
}

/// Per-corner normals for flat shading, `3 * triangle_count` entries
///
/// Corner `3 * t + k` belongs to corner `k` of triangle `t`, matching
/// [`expanded_corners`]. `None` when the mesh has no facet normals.
pub fn corner_normals(mesh: &Mesh) -> Option<Vec<Point>> {
    let normals = mesh.facet_normals.as_ref()?;
    Some(normals.iter().flat_map(|&n| [n, n, n]).collect())
}

/// Corner positions in expanded (non-indexed) order
pub fn expanded_corners(mesh: &Mesh) -> Vec<Point> {
    mesh.facets().flatten().collect()
}
