//! sur-codec: reader and writer for the SUR triangle mesh format
//!
//! SUR is a minimal indexed triangle mesh interchange format: a vertex count,
//! the vertex list, a triangle count and the triangle index list. Two
//! encodings of the same logical structure exist:
//!
//! - **ASCII v1**: newline-delimited text, the canonical encoding
//! - **Binary v2**: fixed-width little-endian fields behind a `SUR2` magic,
//!   optionally followed by per-triangle facet normals
//!
//! # Key Features
//!
//! - **Stateless**: every call builds its own [`Mesh`], so independent files
//!   can be processed from any number of threads
//! - **Strict parsing**: a corrupt record aborts the whole read with a
//!   [`FormatError`] naming the line or record
//! - **Vertex deduplication**: [`write`] collapses bit-identical corners into
//!   one shared vertex, in encounter order
//! - **Atomic files**: [`write_file`] writes to a temporary file and renames it
//!   into place only on success
//!
//! # ASCII Layout
//!
//! ```text
//! <numVertices>
//! <x> <y> <z>        (numVertices times)
//! <numTriangles>
//! <i0> <i1> <i2>     (numTriangles times, 0-based)
//! ```
//!
//! See [`format`] for the binary layout.
//!
//! # Usage
//!
//! ```ignore
//! use sur_codec::{read, write, ReadOptions, WriteOptions};
//!
//! let facets = vec![[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]];
//! let mut bytes = Vec::new();
//! write(&mut bytes, facets, &WriteOptions::default())?;
//!
//! let mesh = read(bytes.as_slice(), &ReadOptions::default())?;
//! println!("{} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
//! ```

mod error;
pub mod format;
mod mesh;
mod normals;
mod reader;
mod transform;
mod writer;

pub use error::{ErrorKind, FormatError, Location};
pub use format::FormatVersion;
pub use mesh::{Facet, Mesh, Point, Triangle, VertexPool};
pub use normals::{corner_normals, expanded_corners, facet_normal};
pub use reader::{ReadOptions, read, read_file};
pub use transform::{Axis, Transform, TransformError};
pub use writer::{WriteOptions, write, write_file, write_mesh, write_mesh_file};

// =============================================================================
// Constants
// =============================================================================

/// Magic tag at the start of every binary SUR file
pub const SUR_MAGIC: &[u8; 4] = b"SUR2";

/// Fractional digits used for ASCII coordinates (`%f` formatting)
pub const ASCII_PRECISION: usize = 6;

/// Binary flag: one facet normal per triangle follows the triangle section
pub const FLAG_FACET_NORMALS: u32 = 1 << 0;

/// All flag bits understood by this version of the codec
pub const KNOWN_FLAGS: u32 = FLAG_FACET_NORMALS;

/// Upper bound on preallocation from a declared count
///
/// Counts come from the file and are untrusted; vectors still grow past this
/// when the records really are there.
pub(crate) const MAX_PREALLOCATED_RECORDS: usize = 1 << 16;
