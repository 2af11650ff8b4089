//! Error types for the lobulus library.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Data domain an attribute lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataDomain {
    /// Aligned with mesh points.
    Point,
    /// Aligned with mesh cells.
    Cell,
}

impl fmt::Display for DataDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Cell => write!(f, "cell"),
        }
    }
}

/// Main error type for lobulus operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Time-series source cannot be opened or parsed
    #[error("Source unreadable: {}: {reason}", .path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// Invalid magic bytes at start of payload file
    #[error("Invalid payload file: expected MTCB magic bytes")]
    InvalidMagic,

    /// Unsupported container or payload version
    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// Payload is truncated or corrupted
    #[error("Unexpected end of payload at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in container
    #[error("Invalid container structure: {0}")]
    InvalidStructure(String),

    /// Step index out of bounds
    #[error("Step index {index} out of bounds (count: {count})")]
    StepOutOfBounds { index: usize, count: usize },

    /// Attribute not found by name
    #[error("Attribute not found in {domain} data: {name}")]
    MissingAttribute { name: String, domain: DataDomain },

    /// Attribute set or shape changed between timesteps
    #[error("Attribute '{name}' missing or reshaped at step {step}")]
    AttributeSetMismatch { name: String, step: usize },

    /// Requested interpolation times fall outside the source time range
    #[error(
        "Interpolation range [{requested_start}, {requested_end}] outside \
         of data range [{data_start}, {data_end}]"
    )]
    InterpolationRange {
        requested_start: f64,
        requested_end: f64,
        data_start: f64,
        data_end: f64,
    },

    /// Mesh has no labeled boundary cells to anchor the zonation coordinate
    #[error("No inflow or outflow cells labeled; zonation position is undefined")]
    InsufficientBoundaryCells,

    /// Boundary label outside the admissible set {0, 1, 2}
    #[error("Unknown boundary label {value} on cell {cell} (expected 0, 1 or 2)")]
    UnknownBoundaryLabel { cell: usize, value: f64 },

    /// Cell references a point index past the end of the point array
    #[error("Point index {index} out of bounds (points: {count})")]
    PointOutOfBounds { index: usize, count: usize },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a source-unreadable error with path context.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-attribute error.
    pub fn missing_attribute(name: impl Into<String>, domain: DataDomain) -> Self {
        Self::MissingAttribute {
            name: name.into(),
            domain,
        }
    }
}

/// Result type alias for lobulus operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::StepOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::missing_attribute("cell_type", DataDomain::Cell);
        assert!(e.to_string().contains("cell_type"));
        assert!(e.to_string().contains("cell data"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_interpolation_range_context() {
        let e = Error::InterpolationRange {
            requested_start: -1.0,
            requested_end: 5.0,
            data_start: 0.0,
            data_end: 10.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("-1"));
        assert!(msg.contains("10"));
    }
}
