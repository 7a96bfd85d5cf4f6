//! In-memory mesh representation

use hashbrown::HashMap;

use crate::error::{ErrorKind, FormatError};

/// A 3D position or direction
pub type Point = [f64; 3];

/// Vertex indices of one triangle; order defines the winding
pub type Triangle = [u32; 3];

/// One triangle given by its three corner positions (not yet indexed)
pub type Facet = [Point; 3];

/// Indexed triangle mesh, as produced by a read or consumed by a write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<Point>,
    /// Triangle index triples into `vertices`
    pub triangles: Vec<Triangle>,
    /// One normal per triangle, when the file carried them
    pub facet_normals: Option<Vec<Point>>,
}

impl Mesh {
    /// Build a mesh from raw facets, sharing bit-identical corners
    pub fn from_facets<I>(facets: I) -> Self
    where
        I: IntoIterator<Item = Facet>,
    {
        let mut pool = VertexPool::default();
        let triangles = facets
            .into_iter()
            .map(|[a, b, c]| [pool.insert(a), pool.insert(b), pool.insert(c)])
            .collect();

        Self {
            vertices: pool.into_vertices(),
            triangles,
            facet_normals: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Expand back into per-triangle corner positions, in triangle order
    ///
    /// Indices are assumed valid; see [`Mesh::validate`].
    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        self.triangles.iter().map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Check index bounds and the facet normal count
    pub fn validate(&self) -> Result<(), FormatError> {
        let vertex_count = self.vertices.len();
        for tri in &self.triangles {
            if tri.iter().any(|&i| i as usize >= vertex_count) {
                return Err(FormatError::new(
                    ErrorKind::IndexOutOfRange,
                    "index out of range",
                ));
            }
        }
        match &self.facet_normals {
            Some(normals) if normals.len() != self.triangles.len() => Err(FormatError::new(
                ErrorKind::MalformedRecord,
                format!(
                    "{} facet normals for {} triangles",
                    normals.len(),
                    self.triangles.len()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Reverse the orientation of every triangle (`i0, i1, i2` -> `i0, i2, i1`)
    ///
    /// Facet normals are negated to stay consistent.
    pub fn flip_winding(&mut self) {
        for tri in &mut self.triangles {
            tri.swap(1, 2);
        }
        if let Some(normals) = &mut self.facet_normals {
            for n in normals {
                *n = [-n[0], -n[1], -n[2]];
            }
        }
    }

    /// Axis-aligned bounds `(min, max)`, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.vertices.first()?;
        let bounds = self.vertices.iter().fold((first, first), |(mut min, mut max), v| {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
            (min, max)
        });
        Some(bounds)
    }
}

/// Insertion-ordered vertex pool keyed by exact coordinate bits
///
/// `0.0` and `-0.0` are distinct keys, as are values that differ in the last
/// bit. No spatial tolerance is applied.
#[derive(Debug, Default)]
pub struct VertexPool {
    lookup: HashMap<[u64; 3], u32>,
    vertices: Vec<Point>,
}

impl VertexPool {
    /// Index of `point`, appending it if it was not seen before
    pub fn insert(&mut self, point: Point) -> u32 {
        let key = point.map(f64::to_bits);
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(key).or_insert(next);
        if index == next {
            self.vertices.push(point);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<Point> {
        self.vertices
    }
}
