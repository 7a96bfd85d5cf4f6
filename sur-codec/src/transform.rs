//! Global scale and axis conversion between a file frame and the canonical
//! frame (forward `Y`, up `Z`)

use core::fmt;
use core::str::FromStr;

use glam::{DMat3, DVec3};
use thiserror::Error;

use crate::mesh::{Facet, Mesh};

/// Signed coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl Axis {
    pub fn vector(self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
            Axis::NegX => DVec3::NEG_X,
            Axis::NegY => DVec3::NEG_Y,
            Axis::NegZ => DVec3::NEG_Z,
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X | Axis::NegX => 0,
            Axis::Y | Axis::NegY => 1,
            Axis::Z | Axis::NegZ => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" | "+X" => Ok(Axis::X),
            "Y" | "+Y" => Ok(Axis::Y),
            "Z" | "+Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(TransformError::UnknownAxis(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("Unknown axis '{0}' (expected X, Y, Z, -X, -Y or -Z)")]
    UnknownAxis(String),

    #[error("Forward axis {forward} and up axis {up} must be perpendicular")]
    CollinearAxes { forward: Axis, up: Axis },

    #[error("Scale must be a positive finite number, got {0}")]
    InvalidScale(f64),
}

/// Uniform scale plus a change of basis
///
/// `forward` and `up` name the axes of the file frame that correspond to the
/// canonical `Y` and `Z` axes. The scale multiplies coordinates in both
/// directions, so an import followed by an export scales by `scale²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f64,
    forward: Axis,
    up: Axis,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            forward: Axis::Y,
            up: Axis::Z,
        }
    }
}

impl Transform {
    pub fn new(scale: f64, forward: Axis, up: Axis) -> Result<Self, TransformError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TransformError::InvalidScale(scale));
        }
        if forward.index() == up.index() {
            return Err(TransformError::CollinearAxes { forward, up });
        }
        Ok(Self { scale, forward, up })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn forward(&self) -> Axis {
        self.forward
    }

    pub fn up(&self) -> Axis {
        self.up
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Rotation taking file-frame directions to canonical directions
    fn rotation(&self) -> DMat3 {
        let forward = self.forward.vector();
        let up = self.up.vector();
        let right = forward.cross(up);
        // Rows are the file-frame images of canonical X, Y and Z
        DMat3::from_cols(right, forward, up).transpose()
    }

    /// File frame -> canonical frame (import direction)
    pub fn import_matrix(&self) -> DMat3 {
        self.rotation() * self.scale
    }

    /// Canonical frame -> file frame (export direction)
    pub fn export_matrix(&self) -> DMat3 {
        self.rotation().transpose() * self.scale
    }

    /// Move an imported mesh into the canonical frame
    pub fn import_mesh(&self, mesh: &mut Mesh) {
        apply_to_mesh(mesh, self.import_matrix(), self.rotation());
    }

    /// Move a mesh from the canonical frame into the file frame
    pub fn export_mesh(&self, mesh: &mut Mesh) {
        apply_to_mesh(mesh, self.export_matrix(), self.rotation().transpose());
    }

    /// Map facets from the canonical frame into the file frame
    pub fn export_facets<I>(&self, facets: I) -> impl Iterator<Item = Facet>
    where
        I: IntoIterator<Item = Facet>,
    {
        let m = self.export_matrix();
        facets
            .into_iter()
            .map(move |facet| facet.map(|p| (m * DVec3::from_array(p)).to_array()))
    }
}

fn apply_to_mesh(mesh: &mut Mesh, points: DMat3, directions: DMat3) {
    for v in &mut mesh.vertices {
        *v = (points * DVec3::from_array(*v)).to_array();
    }
    if let Some(normals) = &mut mesh.facet_normals {
        for n in normals {
            *n = (directions * DVec3::from_array(*n)).to_array();
        }
    }
}
