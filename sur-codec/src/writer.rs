//! SUR stream writer

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::FormatError;
use crate::format::{BinaryHeader, FormatVersion};
use crate::mesh::{Facet, Mesh};
use crate::ASCII_PRECISION;

/// Options for [`write`], [`write_mesh`] and [`write_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Output encoding
    pub version: FormatVersion,
    /// Fractional digits for ASCII coordinates
    pub precision: usize,
    /// Store one facet normal per triangle (binary only)
    ///
    /// [`write`] computes them from the geometry; [`write_mesh`] uses the
    /// mesh's own normals and computes them only when it has none.
    pub facet_normals: bool,
    /// Reverse every triangle's winding before writing
    pub flip_winding: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: FormatVersion::AsciiV1,
            precision: ASCII_PRECISION,
            facet_normals: false,
            flip_winding: false,
        }
    }
}

impl WriteOptions {
    pub fn with_version(version: FormatVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

/// Serialize raw facets, sharing bit-identical corners
///
/// Returns the deduplicated mesh that was written.
///
/// # Example
/// ```ignore
/// let facets = [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]];
/// let mut out = Vec::new();
/// let mesh = write(&mut out, facets, &WriteOptions::default())?;
/// assert_eq!(mesh.vertex_count(), 3);
/// ```
pub fn write<W, I>(writer: &mut W, facets: I, options: &WriteOptions) -> Result<Mesh, FormatError>
where
    W: Write,
    I: IntoIterator<Item = Facet>,
{
    let mut mesh = Mesh::from_facets(facets);
    if options.flip_winding {
        mesh.flip_winding();
    }
    if options.facet_normals && options.version == FormatVersion::BinaryV2 {
        mesh.compute_facet_normals();
    }

    let encode_options = WriteOptions {
        flip_winding: false,
        ..*options
    };
    write_mesh(writer, &mesh, &encode_options)?;
    Ok(mesh)
}

/// Serialize an indexed mesh as-is
///
/// Vertex and triangle tables are written in their existing order, so a mesh
/// produced by [`read`](crate::read) re-serializes to identical tables.
pub fn write_mesh<W: Write>(
    writer: &mut W,
    mesh: &Mesh,
    options: &WriteOptions,
) -> Result<(), FormatError> {
    mesh.validate()?;

    let flipped;
    let mesh = if options.flip_winding {
        let mut copy = mesh.clone();
        copy.flip_winding();
        flipped = copy;
        &flipped
    } else {
        mesh
    };

    match options.version {
        FormatVersion::AsciiV1 => {
            if options.facet_normals {
                tracing::warn!("ASCII SUR cannot store facet normals, ignoring");
            }
            write_ascii(writer, mesh, options.precision)
        }
        FormatVersion::BinaryV2 => {
            if options.facet_normals && mesh.facet_normals.is_none() {
                let mut with_normals = mesh.clone();
                with_normals.compute_facet_normals();
                write_binary(writer, &with_normals, true)
            } else {
                write_binary(writer, mesh, options.facet_normals)
            }
        }
    }
    .map_err(FormatError::from_write)?;

    writer.flush().map_err(FormatError::from_write)?;

    tracing::debug!(
        "Wrote SUR ({}): {} vertices, {} triangles",
        options.version,
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(())
}

/// Write facets to `path` atomically
///
/// Data goes to a temporary file in the destination directory, which is
/// renamed over `path` only after every record was written and flushed.
pub fn write_file<I>(path: &Path, facets: I, options: &WriteOptions) -> Result<Mesh, FormatError>
where
    I: IntoIterator<Item = Facet>,
{
    write_atomically(path, |writer| write(writer, facets, options))
}

/// [`write_mesh`] to `path`, atomically like [`write_file`]
pub fn write_mesh_file(
    path: &Path,
    mesh: &Mesh,
    options: &WriteOptions,
) -> Result<(), FormatError> {
    write_atomically(path, |writer| write_mesh(writer, mesh, options))
}

/// Run `encode` against a temporary file next to `path` and move it into
/// place on success. On error the temporary file is removed and `path` is
/// left as it was.
fn write_atomically<T, F>(path: &Path, encode: F) -> Result<T, FormatError>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> Result<T, FormatError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir).map_err(FormatError::from_write)?;
    let mut writer = BufWriter::new(temp);
    let value = encode(&mut writer)?;

    let temp = writer
        .into_inner()
        .map_err(|e| FormatError::from_write(e.into_error()))?;
    temp.as_file().sync_all().map_err(FormatError::from_write)?;
    temp.persist(path).map_err(|e| FormatError::from_write(e.error))?;

    Ok(value)
}

// =============================================================================
// Encoders
// =============================================================================

fn write_ascii<W: Write>(w: &mut W, mesh: &Mesh, precision: usize) -> std::io::Result<()> {
    writeln!(w, "{}", mesh.vertices.len())?;
    for [x, y, z] in &mesh.vertices {
        writeln!(w, "{:.*} {:.*} {:.*}", precision, x, precision, y, precision, z)?;
    }

    writeln!(w, "{}", mesh.triangles.len())?;
    for [a, b, c] in &mesh.triangles {
        writeln!(w, "{} {} {}", a, b, c)?;
    }

    Ok(())
}

fn write_binary<W: Write>(w: &mut W, mesh: &Mesh, with_normals: bool) -> std::io::Result<()> {
    let normals = match (&mesh.facet_normals, with_normals) {
        (Some(normals), true) => Some(normals),
        _ => None,
    };

    let header = BinaryHeader::new(normals.is_some());
    w.write_all(&header.to_bytes())?;

    w.write_all(&binary_count(mesh.vertices.len())?.to_le_bytes())?;
    for v in &mesh.vertices {
        for c in v {
            w.write_all(&(*c as f32).to_le_bytes())?;
        }
    }

    w.write_all(&binary_count(mesh.triangles.len())?.to_le_bytes())?;
    for tri in &mesh.triangles {
        for &i in tri {
            // Indices are bounded by the vertex count, already checked above
            w.write_all(&(i as i32).to_le_bytes())?;
        }
    }

    if let Some(normals) = normals {
        for n in normals {
            for c in n {
                w.write_all(&(*c as f32).to_le_bytes())?;
            }
        }
    }

    Ok(())
}

fn binary_count(count: usize) -> std::io::Result<i32> {
    i32::try_from(count).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} records exceed the binary SUR limit of {}", count, i32::MAX),
        )
    })
}
