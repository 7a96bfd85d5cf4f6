//! SUR format versions and the binary header
//!
//! # Binary Layout (v2)
//! ```text
//! 0x00: magic        [u8; 4] = "SUR2"
//! 0x04: flags        u32 (bit 0: facet normals present)
//! 0x08: numVertices  i32
//! var:  vertices     numVertices * (f32 x, f32 y, f32 z)
//! var:  numTriangles i32
//! var:  triangles    numTriangles * (i32 i0, i32 i1, i32 i2)
//! var:  normals      numTriangles * (f32 nx, f32 ny, f32 nz), if flag bit 0
//! ```
//!
//! Every field is little-endian. ASCII files carry no magic; anything that
//! does not start with [`SUR_MAGIC`](crate::SUR_MAGIC) is treated as ASCII.

use core::fmt;
use core::str::FromStr;

use crate::{FLAG_FACET_NORMALS, SUR_MAGIC};

/// Encoding of a SUR stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatVersion {
    /// Newline-delimited decimal text
    #[default]
    AsciiV1,
    /// Fixed-width little-endian fields behind the `SUR2` magic
    BinaryV2,
}

impl FormatVersion {
    /// Detect the encoding from the first bytes of a stream
    ///
    /// A prefix shorter than the magic is ASCII; a one-line file such as
    /// `"0\n"` is a valid (empty) mesh.
    pub fn sniff(prefix: &[u8]) -> Self {
        if prefix.starts_with(SUR_MAGIC) {
            FormatVersion::BinaryV2
        } else {
            FormatVersion::AsciiV1
        }
    }

    /// Short lowercase name, accepted back by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            FormatVersion::AsciiV1 => "ascii",
            FormatVersion::BinaryV2 => "binary",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "ascii_v1" | "v1" => Ok(FormatVersion::AsciiV1),
            "binary" | "binary_v2" | "v2" => Ok(FormatVersion::BinaryV2),
            other => Err(format!(
                "unknown SUR format '{}' (expected 'ascii' or 'binary')",
                other
            )),
        }
    }
}

/// Binary header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub flags: u32,
}

impl BinaryHeader {
    pub const SIZE: usize = 8;

    pub fn new(has_facet_normals: bool) -> Self {
        let flags = if has_facet_normals {
            FLAG_FACET_NORMALS
        } else {
            0
        };
        Self { flags }
    }

    pub fn has_facet_normals(&self) -> bool {
        self.flags & FLAG_FACET_NORMALS != 0
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(SUR_MAGIC);
        bytes[4..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes
    }

    /// Read header from bytes, `None` if the magic does not match
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || &bytes[0..4] != SUR_MAGIC {
            return None;
        }
        Some(Self {
            flags: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}
