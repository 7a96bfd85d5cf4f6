//! SUR codec error types

use core::fmt;

use thiserror::Error;

/// Machine-readable reason for a [`FormatError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Vertex or triangle count absent, not an integer, or negative
    MissingCount,
    /// Record with the wrong number of fields or a non-numeric field
    MalformedRecord,
    /// Triangle index outside `[0, numVertices)`
    IndexOutOfRange,
    /// Stream ended (or failed) before all declared records were read
    TruncatedStream,
    /// Underlying writer failed
    WriteFailure,
}

impl ErrorKind {
    /// Stable kebab-case reason code
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MissingCount => "missing-count",
            ErrorKind::MalformedRecord => "malformed-record",
            ErrorKind::IndexOutOfRange => "index-out-of-range",
            ErrorKind::TruncatedStream => "truncated-stream",
            ErrorKind::WriteFailure => "write-failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where in the stream an error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 1-based line number (ASCII)
    Line(usize),
    /// 1-based record number within its section (binary)
    Record(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line(n) => write!(f, "line {}", n),
            Location::Record(n) => write!(f, "record {}", n),
        }
    }
}

/// The single error type of the codec
#[derive(Debug, Error)]
#[error("{message} [{kind}]{}", location_suffix(.location))]
pub struct FormatError {
    kind: ErrorKind,
    message: String,
    location: Option<Location>,
    #[source]
    source: Option<std::io::Error>,
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

impl FormatError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            source: None,
        }
    }

    pub(crate) fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub(crate) fn with_source(mut self, source: std::io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Map a failed read into the codec's vocabulary
    pub(crate) fn from_read(err: std::io::Error, location: Location) -> Self {
        let (kind, message) = match err.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                (ErrorKind::TruncatedStream, "truncated stream")
            }
            std::io::ErrorKind::InvalidData => {
                (ErrorKind::MalformedRecord, "invalid text encoding")
            }
            _ => (ErrorKind::TruncatedStream, "read failure"),
        };
        Self::new(kind, message).at(location).with_source(err)
    }

    pub(crate) fn from_write(err: std::io::Error) -> Self {
        Self::new(ErrorKind::WriteFailure, "write failure").with_source(err)
    }

    /// Reason code
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message without location
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Line or record where the error was detected, if applicable
    pub fn location(&self) -> Option<Location> {
        self.location
    }
}
