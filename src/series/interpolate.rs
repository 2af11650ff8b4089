//! Time-course resampling.
//!
//! Linearly interpolates every attribute of a source time course onto
//! an arbitrary target time grid and writes the result as a new time
//! course. No extrapolation: target times must lie inside the source
//! time range.

use std::path::Path;

use tracing::debug;

use crate::mesh::{AttributeArray, AttributeMap};
use crate::mtc::{remove_artifacts, TimeSeriesReader, TimeSeriesWriter};
use crate::util::{Error, Result};

/// Two source timestamps closer than this are treated as one sample;
/// the upper sample is then used verbatim.
const TIME_TOLERANCE: f64 = 1e-12;

/// Resample a time course onto `target_times`, writing a new course
/// at `out_path`.
///
/// Target times must be non-empty, strictly increasing and contained
/// in `[time_start, time_end]` of the source
/// ([`Error::InterpolationRange`] otherwise, with no output artifact
/// left behind). Every output step's attribute values are a convex
/// combination of the two bracketing input samples.
pub fn resample(
    source: impl AsRef<Path>,
    target_times: &[f64],
    out_path: impl AsRef<Path>,
) -> Result<()> {
    let reader = TimeSeriesReader::open(source)?;
    resample_with(&reader, target_times, out_path)
}

/// [`resample`] against an already open reader.
pub fn resample_with(
    reader: &TimeSeriesReader,
    target_times: &[f64],
    out_path: impl AsRef<Path>,
) -> Result<()> {
    let out_path = out_path.as_ref();

    if target_times.is_empty() {
        return Err(Error::invalid("target times are empty"));
    }
    if target_times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::invalid("target times are not strictly increasing"));
    }

    let times = reader.times();
    if times.is_empty() {
        return Err(Error::unreadable(reader.path(), "time course has no steps"));
    }

    let (data_start, data_end) = (times[0], times[times.len() - 1]);
    let (requested_start, requested_end) = (target_times[0], target_times[target_times.len() - 1]);
    if requested_start < data_start || requested_end > data_end {
        return Err(Error::InterpolationRange {
            requested_start,
            requested_end,
            data_start,
            data_end,
        });
    }

    // All validation passed; anything failing from here on removes
    // the partially written output.
    match write_resampled(reader, target_times, out_path) {
        Ok(()) => {
            debug!(
                "resampled {} -> {} ({} steps)",
                reader.path().display(),
                out_path.display(),
                target_times.len()
            );
            Ok(())
        }
        Err(e) => {
            remove_artifacts(out_path);
            Err(e)
        }
    }
}

fn write_resampled(
    reader: &TimeSeriesReader,
    target_times: &[f64],
    out_path: &Path,
) -> Result<()> {
    let times = reader.times();
    let mesh = reader.read_topology()?;

    let mut writer = TimeSeriesWriter::create(out_path)?;
    writer.write_topology(&mesh)?;

    // The first step fixes the attribute set and shapes; every other
    // touched step must match it exactly.
    let (reference_point, reference_cell) = reader.read_step(0)?;

    for &t in target_times {
        let (lo, hi) = bracket(times, t);

        let (point_data, cell_data) = if (times[hi] - times[lo]).abs() <= TIME_TOLERANCE {
            // equal-timestamp convention: upper sample verbatim
            let (pd, cd) = reader.read_step(hi)?;
            check_attribute_set(&reference_point, &pd, hi)?;
            check_attribute_set(&reference_cell, &cd, hi)?;
            (pd, cd)
        } else {
            let (w_lo, w_hi) = weights(times[lo], times[hi], t);
            let (pd_lo, cd_lo) = reader.read_step(lo)?;
            let (pd_hi, cd_hi) = reader.read_step(hi)?;
            check_attribute_set(&reference_point, &pd_lo, lo)?;
            check_attribute_set(&reference_cell, &cd_lo, lo)?;
            check_attribute_set(&reference_point, &pd_hi, hi)?;
            check_attribute_set(&reference_cell, &cd_hi, hi)?;
            (
                lerp_map(&pd_lo, &pd_hi, w_lo, w_hi),
                lerp_map(&cd_lo, &cd_hi, w_lo, w_hi),
            )
        };

        writer.write_step(t, &point_data, &cell_data)?;
    }

    writer.finish()
}

/// Bracketing source indices for `t`: greatest time <= t and least
/// time >= t. Requires `times[0] <= t <= times[last]`.
fn bracket(times: &[f64], t: f64) -> (usize, usize) {
    let lo = times.partition_point(|&x| x <= t).saturating_sub(1);
    let hi = times.partition_point(|&x| x < t).min(times.len() - 1);
    (lo, hi)
}

/// Convex interpolation weights for `t` in `[t_lo, t_hi]`.
fn weights(t_lo: f64, t_hi: f64, t: f64) -> (f64, f64) {
    if (t_hi - t_lo).abs() <= TIME_TOLERANCE {
        (0.0, 1.0)
    } else {
        ((t_hi - t) / (t_hi - t_lo), (t - t_lo) / (t_hi - t_lo))
    }
}

/// Verify `actual` carries exactly the reference attribute set with
/// unchanged shapes.
fn check_attribute_set(
    reference: &AttributeMap,
    actual: &AttributeMap,
    step: usize,
) -> Result<()> {
    for (name, expected) in reference {
        match actual.get(name) {
            Some(array)
                if array.rows() == expected.rows()
                    && array.components() == expected.components() => {}
            _ => {
                return Err(Error::AttributeSetMismatch {
                    name: name.clone(),
                    step,
                });
            }
        }
    }
    if let Some(extra) = actual.keys().find(|name| !reference.contains_key(*name)) {
        return Err(Error::AttributeSetMismatch {
            name: extra.clone(),
            step,
        });
    }
    Ok(())
}

fn lerp_map(lo: &AttributeMap, hi: &AttributeMap, w_lo: f64, w_hi: f64) -> AttributeMap {
    lo.iter()
        .map(|(name, array_lo)| {
            let array_hi = &hi[name];
            (
                name.clone(),
                AttributeArray::lerp(array_lo, array_hi, w_lo, w_hi),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_interior() {
        let times = [0.0, 1.0, 2.0, 4.0];
        assert_eq!(bracket(&times, 0.5), (0, 1));
        assert_eq!(bracket(&times, 3.0), (2, 3));
    }

    #[test]
    fn test_bracket_exact_hit() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(bracket(&times, 1.0), (1, 1));
        assert_eq!(bracket(&times, 0.0), (0, 0));
        assert_eq!(bracket(&times, 2.0), (2, 2));
    }

    #[test]
    fn test_weights_convex() {
        let (w_lo, w_hi) = weights(0.0, 10.0, 2.5);
        assert!((w_lo - 0.75).abs() < 1e-12);
        assert!((w_hi - 0.25).abs() < 1e-12);
        assert!((w_lo + w_hi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weights_equal_timestamps() {
        assert_eq!(weights(1.0, 1.0, 1.0), (0.0, 1.0));
    }
}
