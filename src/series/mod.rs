//! Time-series processing: introspection, resampling and data limits.
//!
//! Everything here operates on MTC time courses through
//! [`crate::mtc::TimeSeriesReader`] / [`crate::mtc::TimeSeriesWriter`]:
//! - [`AttributeCatalog`] - one-shot source introspection
//! - [`resample`] - linear re-interpolation onto a target time grid
//! - [`DataLimits`] - cached per-attribute global (min, max)

mod catalog;
mod interpolate;
mod limits;

pub use catalog::*;
pub use interpolate::*;
pub use limits::*;
