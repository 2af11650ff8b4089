//! Zonation pattern functions.
//!
//! Maps a per-cell `position` array in [0, 1] to a derived zonated
//! variable. Patterns are pure functions; [`apply_pattern`] wires one
//! into a snapshot's cell data under a caller-chosen name.
//!
//! Position 0 is periportal (inflow), position 1 is perivenous
//! (pericentral, outflow).

use super::{AttributeArray, MeshSnapshot};
use super::zonation::POSITION_ATTRIBUTE;
use crate::util::{DataDomain, Error, Result};

/// Default exponent for the sharp sigmoid patterns.
pub const DEFAULT_SHARPNESS: f64 = 10.0;

/// Constant value everywhere.
pub fn constant(p: &[f64], value: f64) -> Vec<f64> {
    vec![value; p.len()]
}

/// Linear increase from `value_min` at position 0 to `value_max` at 1.
pub fn linear_increase(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    p.iter().map(|&x| value_min + (value_max - value_min) * x).collect()
}

/// Linear decrease from `value_max` at position 0 to `value_min` at 1.
pub fn linear_decrease(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    p.iter()
        .map(|&x| value_min + (value_max - value_min) * (1.0 - x))
        .collect()
}

/// Exponential increase, normalized so position 0 maps to `value_min`
/// and position 1 to `value_max`.
pub fn exp_increase(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    let norm = f64::exp(1.0) - 1.0;
    p.iter()
        .map(|&x| value_min + (value_max - value_min) * (f64::exp(x) - 1.0) / norm)
        .collect()
}

/// Mirror image of [`exp_increase`].
pub fn exp_decrease(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    exp_increase(p, value_min, value_max)
        .into_iter()
        .map(|v| 1.0 - v)
        .collect()
}

/// Sigmoid concentrated on the periportal side (midpoint 0.25).
pub fn sharp_periportal(p: &[f64], value_min: f64, value_max: f64, n: f64) -> Vec<f64> {
    let k = 0.25f64.powf(n);
    p.iter()
        .map(|&x| {
            let xn = x.powf(n);
            value_min + (value_max - value_min) * (1.0 - xn / (xn + k))
        })
        .collect()
}

/// Sigmoid concentrated on the pericentral side (midpoint 0.75).
pub fn sharp_pericentral(p: &[f64], value_min: f64, value_max: f64, n: f64) -> Vec<f64> {
    let k = 0.75f64.powf(n);
    p.iter()
        .map(|&x| {
            let xn = x.powf(n);
            value_min + (value_max - value_min) * xn / (xn + k)
        })
        .collect()
}

/// Step pattern: `value_max` for positions <= 0.2, `value_min` otherwise.
pub fn only_periportal(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    p.iter()
        .map(|&x| if x <= 0.2 { value_max } else { value_min })
        .collect()
}

/// Step pattern: `value_max` for positions >= 0.8, `value_min` otherwise.
pub fn only_pericentral(p: &[f64], value_min: f64, value_max: f64) -> Vec<f64> {
    p.iter()
        .map(|&x| if x >= 0.8 { value_max } else { value_min })
        .collect()
}

/// Add a zonated cell attribute derived from the `position` attribute.
///
/// Requires `position` in the snapshot's cell data (run
/// [`super::zonation::attach_positions`] first); returns a new
/// snapshot with `variable_id` added.
pub fn apply_pattern<F>(
    snapshot: &MeshSnapshot,
    variable_id: &str,
    f_zonation: F,
) -> Result<MeshSnapshot>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let position = snapshot
        .cell_data()
        .get(POSITION_ATTRIBUTE)
        .and_then(AttributeArray::as_scalar)
        .ok_or_else(|| Error::missing_attribute(POSITION_ATTRIBUTE, DataDomain::Cell))?;

    let data = f_zonation(position);
    if data.len() != position.len() {
        return Err(Error::invalid(format!(
            "pattern '{}' produced {} values for {} cells",
            variable_id,
            data.len(),
            position.len(),
        )));
    }

    let mut cell_data = snapshot.cell_data().clone();
    cell_data.insert(variable_id.to_string(), AttributeArray::scalar(data));

    MeshSnapshot::new(
        snapshot.mesh().clone(),
        snapshot.point_data().clone(),
        cell_data,
        snapshot.time(),
    )
}
