//! Zonation position computation.
//!
//! Derives, for every mesh cell, a scalar position in [0, 1] between
//! the inflow (periportal) and outflow (perivenous) boundary regions
//! of a liver-lobule mesh. Boundary membership comes from a labeled
//! cell attribute:
//!
//! - `0`: interior cell
//! - `1`: periportal (inflow), position 0
//! - `2`: perivenous (outflow), position 1
//!
//! Interior cells get `d_in / (d_in + d_out)` from nearest-neighbor
//! distances between cell centroids.

use glam::DVec3;
use rayon::prelude::*;

use super::{AttributeArray, AttributeMap, MeshSnapshot};
use crate::util::{DataDomain, Error, Result};

/// Cell attribute holding the boundary labels, unless overridden.
pub const DEFAULT_BOUNDARY_ATTRIBUTE: &str = "cell_type";

/// Cell attribute written by [`attach_positions`].
pub const POSITION_ATTRIBUTE: &str = "position";

/// Labels arrive as floats; compare with this tolerance.
const LABEL_TOLERANCE: f64 = 1e-9;

#[inline]
fn label_matches(value: f64, label: f64) -> bool {
    (value - label).abs() <= LABEL_TOLERANCE
}

/// Shortest Euclidean distance from `x` to any centroid in `set`.
fn nearest_distance(x: DVec3, set: &[DVec3]) -> f64 {
    set.iter()
        .map(|&c| x.distance(c))
        .fold(f64::INFINITY, f64::min)
}

/// Compute the zonation position for every cell of a snapshot.
///
/// Returns one position per cell in global cell order: 0 on inflow
/// cells, 1 on outflow cells, `d_in / (d_in + d_out)` on interior
/// cells. The result is finite and NaN-free.
///
/// Errors: [`Error::MissingAttribute`] if `boundary_attribute` is not
/// a scalar cell attribute, [`Error::UnknownBoundaryLabel`] for any
/// label outside {0, 1, 2}, [`Error::InsufficientBoundaryCells`] if
/// no cell carries a boundary label.
pub fn compute_positions(snapshot: &MeshSnapshot, boundary_attribute: &str) -> Result<Vec<f64>> {
    let labels = snapshot
        .cell_data()
        .get(boundary_attribute)
        .and_then(AttributeArray::as_scalar)
        .ok_or_else(|| Error::missing_attribute(boundary_attribute, DataDomain::Cell))?;

    let centroids = snapshot.mesh().cell_centroids();
    if labels.len() != centroids.len() {
        return Err(Error::invalid(format!(
            "boundary attribute '{}' has {} rows, mesh has {} cells",
            boundary_attribute,
            labels.len(),
            centroids.len(),
        )));
    }

    let mut inflow: Vec<DVec3> = Vec::new();
    let mut outflow: Vec<DVec3> = Vec::new();
    let mut interior: Vec<usize> = Vec::new();
    let mut positions = vec![f64::NAN; centroids.len()];

    for (kc, &label) in labels.iter().enumerate() {
        if label_matches(label, 1.0) {
            positions[kc] = 0.0;
            inflow.push(centroids[kc]);
        } else if label_matches(label, 2.0) {
            positions[kc] = 1.0;
            outflow.push(centroids[kc]);
        } else if label_matches(label, 0.0) {
            interior.push(kc);
        } else {
            return Err(Error::UnknownBoundaryLabel {
                cell: kc,
                value: label,
            });
        }
    }

    if inflow.is_empty() && outflow.is_empty() {
        return Err(Error::InsufficientBoundaryCells);
    }

    let interior_positions: Vec<(usize, f64)> = interior
        .par_iter()
        .map(|&kc| {
            let x = centroids[kc];
            let position = if outflow.is_empty() {
                // only inflow labels exist: all distance attributed to outflow
                1.0
            } else if inflow.is_empty() {
                0.0
            } else {
                let d_in = nearest_distance(x, &inflow);
                let d_out = nearest_distance(x, &outflow);
                let denom = d_in + d_out;
                if denom > 0.0 {
                    d_in / denom
                } else {
                    // centroid coincides with both boundary sets
                    0.5
                }
            };
            (kc, position)
        })
        .collect();

    for (kc, position) in interior_positions {
        positions[kc] = position;
    }

    Ok(positions)
}

/// Compute positions and return a reduced snapshot carrying only the
/// boundary attribute and the derived `position` cell attribute.
///
/// Point data and unrelated cell data are dropped; topology and
/// timestamp are shared with the input.
pub fn attach_positions(snapshot: &MeshSnapshot, boundary_attribute: &str) -> Result<MeshSnapshot> {
    let positions = compute_positions(snapshot, boundary_attribute)?;

    let mut cell_data = AttributeMap::new();
    cell_data.insert(
        boundary_attribute.to_string(),
        snapshot.cell_data()[boundary_attribute].clone(),
    );
    cell_data.insert(
        POSITION_ATTRIBUTE.to_string(),
        AttributeArray::scalar(positions),
    );

    MeshSnapshot::new(
        snapshot.mesh().clone(),
        AttributeMap::new(),
        cell_data,
        snapshot.time(),
    )
}
