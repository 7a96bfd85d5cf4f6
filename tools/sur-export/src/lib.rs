//! sur-export library
//!
//! Conversion and batch-build functions behind the `sur-export` binary.

pub mod manifest;
pub mod mesh;

pub use mesh::{ConvertOptions, MeshFile, MeshInfo, convert, inspect, load_facets};
