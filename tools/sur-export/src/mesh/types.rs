//! Types shared by the mesh conversion paths

use std::path::Path;

use sur_codec::{FormatVersion, Point, ReadOptions, Transform, WriteOptions};

/// File extension of SUR meshes
pub const SUR_EXT: &str = "sur";

/// File extension of Wavefront OBJ meshes
pub const OBJ_EXT: &str = "obj";

/// Mesh file kinds understood by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFile {
    Sur,
    Obj,
}

impl MeshFile {
    /// Detect the kind from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())?;
        match ext.as_str() {
            SUR_EXT => Some(MeshFile::Sur),
            OBJ_EXT => Some(MeshFile::Obj),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MeshFile::Sur => SUR_EXT,
            MeshFile::Obj => OBJ_EXT,
        }
    }

    /// Kind a conversion produces when no output path is given
    pub fn default_target(self) -> Self {
        match self {
            MeshFile::Sur => MeshFile::Obj,
            MeshFile::Obj => MeshFile::Sur,
        }
    }
}

/// Everything a single conversion needs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvertOptions {
    /// How SUR inputs are decoded
    pub read: ReadOptions,
    /// How SUR outputs are encoded; `facet_normals` also selects whether
    /// normals from a SUR input are carried into OBJ output
    pub write: WriteOptions,
    /// Frame of the SUR side of the conversion
    pub transform: Transform,
}

/// Summary of a SUR file, as printed by `sur-export info`
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub version: FormatVersion,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub has_facet_normals: bool,
    pub bounds: Option<(Point, Point)>,
}
