//! SUR stream reader

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{ErrorKind, FormatError, Location};
use crate::format::{BinaryHeader, FormatVersion};
use crate::mesh::{Mesh, Point, Triangle};
use crate::{KNOWN_FLAGS, MAX_PREALLOCATED_RECORDS, SUR_MAGIC};

/// Options for [`read`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Force an encoding; `None` sniffs the magic at the stream start
    pub version: Option<FormatVersion>,
}

impl ReadOptions {
    pub fn with_version(version: FormatVersion) -> Self {
        Self {
            version: Some(version),
        }
    }
}

/// Parse a complete SUR stream into a [`Mesh`]
///
/// The stream must be positioned at the start of the file. Data after the
/// last record is ignored. On error no mesh is returned.
///
/// # Example
/// ```ignore
/// let mesh = read(File::open("part.sur")?, &ReadOptions::default())?;
/// println!("{} triangles", mesh.triangle_count());
/// ```
pub fn read<R: Read>(mut reader: R, options: &ReadOptions) -> Result<Mesh, FormatError> {
    // Pull the magic-sized prefix so sniffing does not depend on how much a
    // single read call happens to return, then stitch it back in front.
    let mut prefix = Vec::with_capacity(SUR_MAGIC.len());
    (&mut reader)
        .take(SUR_MAGIC.len() as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| FormatError::from_read(e, Location::Line(1)))?;

    let version = options
        .version
        .unwrap_or_else(|| FormatVersion::sniff(&prefix));
    let stream = BufReader::new(io::Cursor::new(prefix).chain(reader));

    let mesh = match version {
        FormatVersion::AsciiV1 => read_ascii(stream)?,
        FormatVersion::BinaryV2 => read_binary(stream)?,
    };

    tracing::debug!(
        "Read SUR ({}): {} vertices, {} triangles, facet normals: {}",
        version,
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.facet_normals.is_some()
    );

    Ok(mesh)
}

/// Open and parse a SUR file
pub fn read_file(path: &Path, options: &ReadOptions) -> Result<Mesh, FormatError> {
    let file = File::open(path).map_err(|e| {
        FormatError::new(
            ErrorKind::TruncatedStream,
            format!("failed to open {}", path.display()),
        )
        .with_source(e)
    })?;
    read(file, options)
}

// =============================================================================
// ASCII v1
// =============================================================================

/// Line source that tracks 1-based line numbers
struct Lines<R> {
    inner: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
            line: 0,
        }
    }

    /// Next line with trailing whitespace removed, `None` at end of stream
    fn next_line(&mut self) -> Result<Option<&str>, FormatError> {
        self.buf.clear();
        self.line += 1;
        let n = self
            .inner
            .read_line(&mut self.buf)
            .map_err(|e| FormatError::from_read(e, Location::Line(self.line)))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.trim_end()))
    }

    fn location(&self) -> Location {
        Location::Line(self.line)
    }
}

fn read_ascii<R: BufRead>(reader: R) -> Result<Mesh, FormatError> {
    let mut lines = Lines::new(reader);

    let vertex_count = read_ascii_count(&mut lines, "missing vertex count")?;
    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED_RECORDS));
    for _ in 0..vertex_count {
        let line = require_record(&mut lines)?;
        let vertex = parse_vertex(line)
            .ok_or_else(|| malformed("malformed vertex", lines.location()))?;
        vertices.push(vertex);
    }

    let triangle_count = read_ascii_count(&mut lines, "missing triangle count")?;
    let mut triangles = Vec::with_capacity(triangle_count.min(MAX_PREALLOCATED_RECORDS));
    for _ in 0..triangle_count {
        let line = require_record(&mut lines)?;
        let indices = parse_indices(line)
            .ok_or_else(|| malformed("malformed triangle", lines.location()))?;
        let triangle = check_indices(indices, vertex_count)
            .ok_or_else(|| out_of_range(lines.location()))?;
        triangles.push(triangle);
    }

    Ok(Mesh {
        vertices,
        triangles,
        facet_normals: None,
    })
}

fn read_ascii_count<R: BufRead>(lines: &mut Lines<R>, message: &str) -> Result<usize, FormatError> {
    let count = lines
        .next_line()?
        .and_then(|line| line.trim().parse::<usize>().ok());
    count.ok_or_else(|| FormatError::new(ErrorKind::MissingCount, message).at(lines.location()))
}

fn require_record<R: BufRead>(lines: &mut Lines<R>) -> Result<&str, FormatError> {
    let location = Location::Line(lines.line + 1);
    lines.next_line()?.ok_or_else(|| {
        FormatError::new(ErrorKind::TruncatedStream, "truncated stream").at(location)
    })
}

/// Exactly three whitespace-separated values
fn parse_fields<T: std::str::FromStr>(line: &str) -> Option<[T; 3]> {
    let mut fields = line.split_whitespace().map(|s| s.parse::<T>().ok());
    let a = fields.next()??;
    let b = fields.next()??;
    let c = fields.next()??;
    if fields.next().is_some() {
        return None;
    }
    Some([a, b, c])
}

fn parse_vertex(line: &str) -> Option<Point> {
    parse_fields::<f64>(line)
}

fn parse_indices(line: &str) -> Option<[i64; 3]> {
    parse_fields::<i64>(line)
}

// =============================================================================
// Binary v2
// =============================================================================

fn read_binary<R: Read>(mut reader: R) -> Result<Mesh, FormatError> {
    let mut header_bytes = [0u8; BinaryHeader::SIZE];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|e| FormatError::from_read(e, Location::Record(0)))?;
    let header = BinaryHeader::from_bytes(&header_bytes).ok_or_else(|| {
        FormatError::new(ErrorKind::MalformedRecord, "missing binary SUR magic")
            .at(Location::Record(0))
    })?;
    if header.flags & !KNOWN_FLAGS != 0 {
        return Err(FormatError::new(
            ErrorKind::MalformedRecord,
            format!("unknown binary SUR flags 0x{:08X}", header.flags),
        )
        .at(Location::Record(0)));
    }

    let vertex_count = read_binary_count(&mut reader, "missing vertex count")?;
    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED_RECORDS));
    for record in 1..=vertex_count {
        vertices.push(read_vec3(&mut reader, record)?);
    }

    let triangle_count = read_binary_count(&mut reader, "missing triangle count")?;
    let mut triangles = Vec::with_capacity(triangle_count.min(MAX_PREALLOCATED_RECORDS));
    for record in 1..=triangle_count {
        let location = Location::Record(record);
        let mut indices = [0i64; 3];
        for index in &mut indices {
            *index = read_i32(&mut reader, location)? as i64;
        }
        let triangle = check_indices(indices, vertex_count).ok_or_else(|| out_of_range(location))?;
        triangles.push(triangle);
    }

    let facet_normals = if header.has_facet_normals() {
        let mut normals = Vec::with_capacity(triangle_count.min(MAX_PREALLOCATED_RECORDS));
        for record in 1..=triangle_count {
            normals.push(read_vec3(&mut reader, record)?);
        }
        Some(normals)
    } else {
        None
    };

    Ok(Mesh {
        vertices,
        triangles,
        facet_normals,
    })
}

/// Section count, reported as record 0 of its section
fn read_binary_count<R: Read>(reader: &mut R, message: &str) -> Result<usize, FormatError> {
    let location = Location::Record(0);
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::new(ErrorKind::MissingCount, message)
                .at(location)
                .with_source(e)
        } else {
            FormatError::from_read(e, location)
        }
    })?;
    let count = i32::from_le_bytes(bytes);
    usize::try_from(count).map_err(|_| {
        FormatError::new(ErrorKind::MissingCount, format!("{} (got {})", message, count))
            .at(location)
    })
}

fn read_i32<R: Read>(reader: &mut R, location: Location) -> Result<i32, FormatError> {
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| FormatError::from_read(e, location))?;
    Ok(i32::from_le_bytes(bytes))
}

fn read_vec3<R: Read>(reader: &mut R, record: usize) -> Result<Point, FormatError> {
    let mut bytes = [0u8; 12];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| FormatError::from_read(e, Location::Record(record)))?;
    let component = |i: usize| {
        f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]) as f64
    };
    Ok([component(0), component(4), component(8)])
}

// =============================================================================
// Shared helpers
// =============================================================================

fn check_indices(indices: [i64; 3], vertex_count: usize) -> Option<Triangle> {
    let mut triangle = [0u32; 3];
    for (slot, &index) in triangle.iter_mut().zip(&indices) {
        let index = usize::try_from(index).ok().filter(|&i| i < vertex_count)?;
        *slot = u32::try_from(index).ok()?;
    }
    Some(triangle)
}

fn malformed(message: &str, location: Location) -> FormatError {
    FormatError::new(ErrorKind::MalformedRecord, message).at(location)
}

fn out_of_range(location: Location) -> FormatError {
    FormatError::new(ErrorKind::IndexOutOfRange, "index out of range").at(location)
}
