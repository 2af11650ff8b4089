//! # Lobulus
//!
//! Time-series mesh processing for liver-lobule perfusion
//! simulations.
//!
//! Simulation runs arrive as a sequence of timestamped snapshots on a
//! fixed unstructured mesh. This crate owns the processing core
//! between the solver output and the visualization layer: zonation
//! position computation from labeled boundary cells, resampling of a
//! time course onto an arbitrary time grid, and cached global data
//! limits for consistent color scaling across runs. Rendering, mesh
//! generation and plotting live elsewhere.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (errors, data domains)
//! - [`mesh`] - Mesh topology, snapshots, zonation positions and patterns
//! - [`mtc`] - The "mesh time course" container format (read/write)
//! - [`series`] - Attribute catalog, resampling, data limits
//!
//! ## Example
//!
//! ```ignore
//! use lobulus::prelude::*;
//!
//! let catalog = AttributeCatalog::build("run.mtc")?;
//! let times: Vec<f64> = (0..100)
//!     .map(|k| catalog.time_start
//!         + k as f64 / 99.0 * (catalog.time_end - catalog.time_start))
//!     .collect();
//! resample("run.mtc", &times, "run_interpolated.mtc")?;
//! let limits = DataLimits::for_source("run_interpolated.mtc", false)?;
//! ```

pub mod mesh;
pub mod mtc;
pub mod series;
pub mod util;

// Re-export commonly used types
pub use mtc::{TimeSeriesReader, TimeSeriesWriter};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::mesh::zonation::{attach_positions, compute_positions};
    pub use crate::mesh::{AttributeArray, CellBlock, CellType, Mesh, MeshSnapshot};
    pub use crate::mtc::{TimeSeriesReader, TimeSeriesWriter};
    pub use crate::series::{resample, AttributeCatalog, AttributeKind, DataLimits, KeyPolicy};
    pub use crate::util::{DataDomain, Error, Result};
}
