//! MTC container format definitions.
//!
//! A time course is stored as two colocated files sharing a stem:
//!
//! ```text
//! sim.mtc    JSON manifest: topology + per-step array directory
//! sim.mtcb   binary payload: header + appended LE arrays
//! +------------------+
//! | Magic: "MTCB"    |  4 bytes
//! +------------------+
//! | Version          |  2 bytes (u16 LE)
//! +------------------+
//! | Reserved         |  2 bytes
//! +------------------+
//! | ... Arrays ...   |  f64 / u32, little-endian
//! +------------------+
//! ```
//!
//! The manifest records, for every array, its byte offset into the
//! payload plus its shape. Step times are strictly increasing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::mesh::CellType;

/// Magic bytes at the start of a payload file.
pub const PAYLOAD_MAGIC: &[u8; 4] = b"MTCB";

/// Current payload format version.
pub const PAYLOAD_VERSION: u16 = 1;

/// Payload header size: magic + version + reserved.
pub const PAYLOAD_HEADER_SIZE: usize = 8;

/// Manifest format tag.
pub const MANIFEST_FORMAT: &str = "mtc";

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest file extension.
pub const MANIFEST_EXT: &str = "mtc";

/// Payload file extension.
pub const PAYLOAD_EXT: &str = "mtcb";

/// Location and shape of one array in the payload.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ArrayEntry {
    /// Byte offset into the payload file.
    pub offset: u64,
    /// Number of rows (points or cells).
    pub rows: u64,
    /// Trailing-axis length per row.
    pub components: u64,
}

impl ArrayEntry {
    /// Total number of values in the array.
    #[inline]
    pub fn len(&self) -> usize {
        (self.rows * self.components) as usize
    }

    /// True if the array holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cell block of the topology.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Cell type tag.
    pub cell_type: CellType,
    /// Byte offset of the u32 connectivity array.
    pub offset: u64,
    /// Number of cells in the block.
    pub count: u64,
}

/// Topology directory: points plus cell blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopologyEntry {
    /// Point coordinates (rows = point count, components = 3).
    pub points: ArrayEntry,
    /// Cell blocks in order.
    pub blocks: Vec<BlockEntry>,
}

/// Directory of one timestep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepEntry {
    /// Timestamp of this step.
    pub time: f64,
    /// Point attribute arrays by name.
    pub point_data: BTreeMap<String, ArrayEntry>,
    /// Cell attribute arrays by name.
    pub cell_data: BTreeMap<String, ArrayEntry>,
}

/// The JSON manifest of a time course.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Format tag, always `"mtc"`.
    pub format: String,
    /// Manifest format version.
    pub version: u32,
    /// Payload file name (no directory components; colocated).
    pub payload: String,
    /// Mesh topology, shared by all steps.
    pub topology: TopologyEntry,
    /// Timesteps in strictly increasing time order.
    pub steps: Vec<StepEntry>,
}

/// Payload file name derived from a manifest path's stem.
pub fn payload_name_for(manifest_path: &Path) -> String {
    let stem = manifest_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}.{PAYLOAD_EXT}")
}

/// Colocated payload path derived from a manifest path.
pub fn payload_path_for(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) => parent.join(payload_name_for(manifest_path)),
        None => PathBuf::from(payload_name_for(manifest_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_path_derivation() {
        let path = Path::new("/data/runs/sim_21.mtc");
        assert_eq!(payload_name_for(path), "sim_21.mtcb");
        assert_eq!(
            payload_path_for(path),
            PathBuf::from("/data/runs/sim_21.mtcb")
        );
    }

    #[test]
    fn test_array_entry_len() {
        let entry = ArrayEntry {
            offset: 8,
            rows: 4,
            components: 3,
        };
        assert_eq!(entry.len(), 12);
        assert!(!entry.is_empty());
    }
}
