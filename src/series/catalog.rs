//! Attribute catalog: one-shot introspection of a time course.
//!
//! Built once per source before any processing; downstream code
//! dispatches on the cataloged [`AttributeKind`] instead of probing
//! raw array shapes per step.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::mesh::AttributeMap;
use crate::mtc::TimeSeriesReader;
use crate::util::{Error, Result};

/// Tensor kind of an attribute, inferred from its trailing-axis
/// length on the first timestep and fixed for the source's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Scalar,
    Vector,
    Tensor,
    Matrix,
    Other,
}

impl AttributeKind {
    /// Infer the kind from the trailing-axis length.
    pub fn from_components(components: usize) -> Self {
        match components {
            1 => Self::Scalar,
            3 => Self::Vector,
            6 => Self::Tensor,
            9 => Self::Matrix,
            _ => Self::Other,
        }
    }

    /// True for single-component attributes.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scalar => "Scalar",
            Self::Vector => "Vector",
            Self::Tensor => "Tensor",
            Self::Matrix => "Matrix",
            Self::Other => "Other",
        };
        write!(f, "{s}")
    }
}

/// Shape and kind of one attribute.
#[derive(Clone, Debug)]
pub struct AttributeInfo {
    /// Attribute name, unique within its domain.
    pub name: String,
    /// Tensor kind.
    pub kind: AttributeKind,
    /// Trailing-axis length per row.
    pub components: usize,
    /// Number of rows (points or cells).
    pub rows: usize,
}

/// Immutable summary of a time course: time range, step count,
/// topology sizes and per-domain attribute shapes.
#[derive(Clone, Debug)]
pub struct AttributeCatalog {
    /// Manifest path this catalog was built from.
    pub path: PathBuf,
    /// Timestamp of the first step.
    pub time_start: f64,
    /// Timestamp of the last step.
    pub time_end: f64,
    /// Number of timesteps.
    pub step_count: usize,
    /// Number of mesh points.
    pub point_count: usize,
    /// Number of mesh cells.
    pub cell_count: usize,
    /// Point attributes by name.
    pub point_attributes: BTreeMap<String, AttributeInfo>,
    /// Cell attributes by name.
    pub cell_attributes: BTreeMap<String, AttributeInfo>,
}

impl AttributeCatalog {
    /// Build a catalog by reading topology, the first timestep's data
    /// and the last timestep's timestamp. No intermediate steps are
    /// materialized and no file handle is held on return.
    pub fn build(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = TimeSeriesReader::open(path)?;

        if reader.num_steps() == 0 {
            return Err(Error::unreadable(path, "time course has no steps"));
        }

        let mesh = reader.read_topology()?;
        let (point_data, cell_data) = reader.read_step(0)?;

        let times = reader.times();
        let time_start = times[0];
        let time_end = times[times.len() - 1];

        Ok(Self {
            path: path.to_path_buf(),
            time_start,
            time_end,
            step_count: reader.num_steps(),
            point_count: mesh.num_points(),
            cell_count: mesh.num_cells(),
            point_attributes: catalog_map(&point_data),
            cell_attributes: catalog_map(&cell_data),
        })
    }

    /// Names of scalar point attributes, then scalar cell attributes.
    /// Point and cell scalars share one flat namespace downstream.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.point_attributes
            .values()
            .chain(self.cell_attributes.values())
            .filter(|info| info.kind.is_scalar())
            .map(|info| info.name.as_str())
    }
}

fn catalog_map(data: &AttributeMap) -> BTreeMap<String, AttributeInfo> {
    data.iter()
        .map(|(name, array)| {
            (
                name.clone(),
                AttributeInfo {
                    name: name.clone(),
                    kind: AttributeKind::from_components(array.components()),
                    components: array.components(),
                    rows: array.rows(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_components() {
        assert_eq!(AttributeKind::from_components(1), AttributeKind::Scalar);
        assert_eq!(AttributeKind::from_components(3), AttributeKind::Vector);
        assert_eq!(AttributeKind::from_components(6), AttributeKind::Tensor);
        assert_eq!(AttributeKind::from_components(9), AttributeKind::Matrix);
        assert_eq!(AttributeKind::from_components(2), AttributeKind::Other);
    }

    #[test]
    fn test_build_missing_source() {
        let err = AttributeCatalog::build("/nonexistent/run.mtc").unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable { .. }));
    }
}
