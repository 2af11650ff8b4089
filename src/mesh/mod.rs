//! Mesh topology and per-timestep attribute data.
//!
//! A [`Mesh`] is an ordered point cloud plus one or more [`CellBlock`]s
//! of fixed-arity cells. A [`MeshSnapshot`] pairs a shared topology
//! with the named point/cell [`AttributeArray`]s of one timestep.

pub mod patterns;
pub mod zonation;

use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Cell geometry type tag.
///
/// Each type has a fixed number of points per cell; connectivity is
/// stored flat in that arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Vertex,
    Line,
    Triangle,
    Quad,
    Tetra,
    Pyramid,
    Wedge,
    Hexahedron,
}

impl CellType {
    /// Number of points referenced by one cell of this type.
    pub fn nodes_per_cell(&self) -> usize {
        match self {
            Self::Vertex => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
            Self::Tetra => 4,
            Self::Pyramid => 5,
            Self::Wedge => 6,
            Self::Hexahedron => 8,
        }
    }

    /// Stable string tag as stored in container manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Quad => "quad",
            Self::Tetra => "tetra",
            Self::Pyramid => "pyramid",
            Self::Wedge => "wedge",
            Self::Hexahedron => "hexahedron",
        }
    }
}

/// One block of cells sharing a cell type.
///
/// Connectivity is flat: cell `k` occupies indices
/// `[k * nodes_per_cell, (k + 1) * nodes_per_cell)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CellBlock {
    cell_type: CellType,
    connectivity: Vec<u32>,
}

impl CellBlock {
    /// Create a block; connectivity length must be a multiple of the
    /// cell arity.
    pub fn new(cell_type: CellType, connectivity: Vec<u32>) -> Result<Self> {
        let arity = cell_type.nodes_per_cell();
        if connectivity.len() % arity != 0 {
            return Err(Error::invalid(format!(
                "connectivity length {} is not a multiple of {} ({} cells)",
                connectivity.len(),
                arity,
                cell_type.as_str(),
            )));
        }
        Ok(Self {
            cell_type,
            connectivity,
        })
    }

    /// The cell type of this block.
    #[inline]
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Flat connectivity array.
    #[inline]
    pub fn connectivity(&self) -> &[u32] {
        &self.connectivity
    }

    /// Number of cells in this block.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.connectivity.len() / self.cell_type.nodes_per_cell()
    }

    /// Point indices of cell `k` within this block.
    pub fn cell(&self, k: usize) -> &[u32] {
        let arity = self.cell_type.nodes_per_cell();
        &self.connectivity[k * arity..(k + 1) * arity]
    }

    /// Iterate cells as point-index slices.
    pub fn iter_cells(&self) -> impl Iterator<Item = &[u32]> {
        self.connectivity
            .chunks_exact(self.cell_type.nodes_per_cell())
    }
}

/// Unstructured mesh: ordered 3D points plus cell blocks.
///
/// Point index is the identity key; every index referenced by a cell
/// is validated to be within bounds at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    points: Vec<DVec3>,
    blocks: Vec<CellBlock>,
}

impl Mesh {
    /// Create a mesh, validating cell connectivity against the point count.
    pub fn new(points: Vec<DVec3>, blocks: Vec<CellBlock>) -> Result<Self> {
        let count = points.len();
        for block in &blocks {
            if let Some(&index) = block.connectivity.iter().find(|&&i| i as usize >= count) {
                return Err(Error::PointOutOfBounds {
                    index: index as usize,
                    count,
                });
            }
        }
        Ok(Self { points, blocks })
    }

    /// Point coordinates.
    #[inline]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Cell blocks in order.
    #[inline]
    pub fn blocks(&self) -> &[CellBlock] {
        &self.blocks
    }

    /// Number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Total number of cells over all blocks.
    pub fn num_cells(&self) -> usize {
        self.blocks.iter().map(CellBlock::num_cells).sum()
    }

    /// Iterate all cells over all blocks, in block order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &[u32]> {
        self.blocks.iter().flat_map(CellBlock::iter_cells)
    }

    /// Centroid of every cell (arithmetic mean of its member points),
    /// in global cell order.
    pub fn cell_centroids(&self) -> Vec<DVec3> {
        let mut centroids = Vec::with_capacity(self.num_cells());
        for cell in self.iter_cells() {
            let mut center = DVec3::ZERO;
            for &kp in cell {
                center += self.points[kp as usize];
            }
            centroids.push(center / cell.len() as f64);
        }
        centroids
    }
}

/// Flat numeric array aligned with points or cells.
///
/// Stores `rows * components` values row-major; `components` is the
/// trailing-axis length (1 scalar, 3 vector, 6 tensor, 9 matrix).
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeArray {
    data: Vec<f64>,
    components: usize,
}

impl AttributeArray {
    /// Create an array; data length must be a multiple of `components`.
    pub fn new(data: Vec<f64>, components: usize) -> Result<Self> {
        if components == 0 {
            return Err(Error::invalid("attribute components must be > 0"));
        }
        if data.len() % components != 0 {
            return Err(Error::invalid(format!(
                "attribute data length {} is not a multiple of {} components",
                data.len(),
                components,
            )));
        }
        Ok(Self { data, components })
    }

    /// Create a scalar (1-component) array.
    pub fn scalar(values: Vec<f64>) -> Self {
        Self {
            data: values,
            components: 1,
        }
    }

    /// Raw values, row-major.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Trailing-axis length.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of rows (points or cells).
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.len() / self.components
    }

    /// Values as a scalar slice, if this is a 1-component array.
    pub fn as_scalar(&self) -> Option<&[f64]> {
        (self.components == 1).then_some(self.data.as_slice())
    }

    /// Elementwise (min, max) over all values; `None` for empty arrays.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let first = *self.data.first()?;
        let mut min = first;
        let mut max = first;
        for &v in &self.data[1..] {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }

    /// Convex combination `w_lo * lo + w_hi * hi`, elementwise.
    ///
    /// Shapes must match; checked by the caller against the step-0
    /// attribute set before getting here.
    pub(crate) fn lerp(lo: &Self, hi: &Self, w_lo: f64, w_hi: f64) -> Self {
        debug_assert_eq!(lo.data.len(), hi.data.len());
        debug_assert_eq!(lo.components, hi.components);
        let data = lo
            .data
            .iter()
            .zip(&hi.data)
            .map(|(&a, &b)| w_lo * a + w_hi * b)
            .collect();
        Self {
            data,
            components: lo.components,
        }
    }
}

/// Snapshot of one timestep: shared topology plus attribute maps.
///
/// Immutable once constructed; derived snapshots are new values.
#[derive(Clone, Debug)]
pub struct MeshSnapshot {
    mesh: Arc<Mesh>,
    point_data: AttributeMap,
    cell_data: AttributeMap,
    time: f64,
}

/// Named attribute arrays of one domain.
pub type AttributeMap = std::collections::BTreeMap<String, AttributeArray>;

impl MeshSnapshot {
    /// Create a snapshot; attribute rows must match the mesh point/cell
    /// counts.
    pub fn new(
        mesh: Arc<Mesh>,
        point_data: AttributeMap,
        cell_data: AttributeMap,
        time: f64,
    ) -> Result<Self> {
        for (name, array) in &point_data {
            if array.rows() != mesh.num_points() {
                return Err(Error::invalid(format!(
                    "point attribute '{}' has {} rows, mesh has {} points",
                    name,
                    array.rows(),
                    mesh.num_points(),
                )));
            }
        }
        for (name, array) in &cell_data {
            if array.rows() != mesh.num_cells() {
                return Err(Error::invalid(format!(
                    "cell attribute '{}' has {} rows, mesh has {} cells",
                    name,
                    array.rows(),
                    mesh.num_cells(),
                )));
            }
        }
        Ok(Self {
            mesh,
            point_data,
            cell_data,
            time,
        })
    }

    /// Shared mesh topology.
    #[inline]
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Point attributes.
    #[inline]
    pub fn point_data(&self) -> &AttributeMap {
        &self.point_data
    }

    /// Cell attributes.
    #[inline]
    pub fn cell_data(&self) -> &AttributeMap {
        &self.cell_data
    }

    /// Timestamp of this snapshot.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }
}
