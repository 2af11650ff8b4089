//! MTC container writer.
//!
//! Appends arrays to a binary payload and records their offsets;
//! the JSON manifest is written once on [`TimeSeriesWriter::finish`].
//! Until then no manifest exists, so an aborted write never leaves a
//! readable-but-truncated time course behind.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use super::format::*;
use crate::mesh::{AttributeMap, Mesh, MeshSnapshot};
use crate::util::{Error, Result};

/// Output stream for payload data.
struct PayloadStream {
    writer: BufWriter<File>,
    pos: u64,
}

impl PayloadStream {
    fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut stream = Self {
            writer: BufWriter::with_capacity(1024 * 1024, file),
            pos: 0,
        };

        stream.writer.write_all(PAYLOAD_MAGIC)?;
        stream.writer.write_u16::<LittleEndian>(PAYLOAD_VERSION)?;
        stream.writer.write_u16::<LittleEndian>(0)?; // reserved
        stream.pos = PAYLOAD_HEADER_SIZE as u64;
        Ok(stream)
    }

    fn write_f64_array(&mut self, values: &[f64]) -> Result<u64> {
        let offset = self.pos;
        for &v in values {
            self.writer.write_f64::<LittleEndian>(v)?;
        }
        self.pos += values.len() as u64 * 8;
        Ok(offset)
    }

    fn write_u32_array(&mut self, values: &[u32]) -> Result<u64> {
        let offset = self.pos;
        for &v in values {
            self.writer.write_u32::<LittleEndian>(v)?;
        }
        self.pos += values.len() as u64 * 4;
        Ok(offset)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writer for an MTC time course.
///
/// Usage: [`create`](Self::create), then
/// [`write_topology`](Self::write_topology) exactly once, then
/// [`write_step`](Self::write_step) in strictly increasing time order,
/// then [`finish`](Self::finish).
pub struct TimeSeriesWriter {
    manifest_path: PathBuf,
    payload_name: String,
    payload: PayloadStream,
    topology: Option<TopologyEntry>,
    num_points: usize,
    num_cells: usize,
    steps: Vec<StepEntry>,
}

impl TimeSeriesWriter {
    /// Create a new time course at `manifest_path`; the payload path
    /// is derived from the manifest stem, so colocation holds by
    /// construction.
    pub fn create(manifest_path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = manifest_path.as_ref().to_path_buf();
        let payload_name = payload_name_for(&manifest_path);
        let payload_path = payload_path_for(&manifest_path);
        let payload = PayloadStream::create(&payload_path)?;

        debug!("created time course: {}", manifest_path.display());

        Ok(Self {
            manifest_path,
            payload_name,
            payload,
            topology: None,
            num_points: 0,
            num_cells: 0,
            steps: Vec::new(),
        })
    }

    /// Write the shared mesh topology. Must be called exactly once,
    /// before the first step.
    pub fn write_topology(&mut self, mesh: &Mesh) -> Result<()> {
        if self.topology.is_some() {
            return Err(Error::invalid("topology already written"));
        }

        let mut raw = Vec::with_capacity(mesh.num_points() * 3);
        for p in mesh.points() {
            raw.extend_from_slice(&[p.x, p.y, p.z]);
        }
        let offset = self.payload.write_f64_array(&raw)?;
        let points = ArrayEntry {
            offset,
            rows: mesh.num_points() as u64,
            components: 3,
        };

        let mut blocks = Vec::with_capacity(mesh.blocks().len());
        for block in mesh.blocks() {
            let offset = self.payload.write_u32_array(block.connectivity())?;
            blocks.push(BlockEntry {
                cell_type: block.cell_type(),
                offset,
                count: block.num_cells() as u64,
            });
        }

        self.num_points = mesh.num_points();
        self.num_cells = mesh.num_cells();
        self.topology = Some(TopologyEntry { points, blocks });
        Ok(())
    }

    /// Append one timestep. Times must be strictly increasing and
    /// attribute rows must match the topology's point/cell counts.
    pub fn write_step(
        &mut self,
        time: f64,
        point_data: &AttributeMap,
        cell_data: &AttributeMap,
    ) -> Result<()> {
        if self.topology.is_none() {
            return Err(Error::invalid("write_topology must precede write_step"));
        }
        if let Some(last) = self.steps.last() {
            if time <= last.time {
                return Err(Error::invalid(format!(
                    "step time {} not after previous step time {}",
                    time, last.time,
                )));
            }
        }

        let point_entries = self.write_data_map(point_data, self.num_points, "point")?;
        let cell_entries = self.write_data_map(cell_data, self.num_cells, "cell")?;

        self.steps.push(StepEntry {
            time,
            point_data: point_entries,
            cell_data: cell_entries,
        });
        Ok(())
    }

    fn write_data_map(
        &mut self,
        data: &AttributeMap,
        expected_rows: usize,
        domain: &str,
    ) -> Result<BTreeMap<String, ArrayEntry>> {
        let mut entries = BTreeMap::new();
        for (name, array) in data {
            if array.rows() != expected_rows {
                return Err(Error::invalid(format!(
                    "{} attribute '{}' has {} rows, topology has {}",
                    domain,
                    name,
                    array.rows(),
                    expected_rows,
                )));
            }
            let offset = self.payload.write_f64_array(array.data())?;
            entries.insert(
                name.clone(),
                ArrayEntry {
                    offset,
                    rows: array.rows() as u64,
                    components: array.components() as u64,
                },
            );
        }
        Ok(entries)
    }

    /// Flush the payload and write the manifest. Consumes the writer;
    /// both file handles are released on return.
    pub fn finish(mut self) -> Result<()> {
        let topology = self
            .topology
            .take()
            .ok_or_else(|| Error::invalid("cannot finish a time course without topology"))?;

        self.payload.flush()?;

        let manifest = Manifest {
            format: MANIFEST_FORMAT.to_string(),
            version: MANIFEST_VERSION,
            payload: self.payload_name.clone(),
            topology,
            steps: std::mem::take(&mut self.steps),
        };

        let file = File::create(&self.manifest_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &manifest)?;
        writer.flush()?;

        debug!(
            "finished time course: {} ({} steps)",
            self.manifest_path.display(),
            manifest.steps.len()
        );
        Ok(())
    }

    /// Build a complete time course from snapshots sharing one
    /// topology. The first snapshot provides the mesh.
    pub fn from_snapshots<I>(manifest_path: impl AsRef<Path>, snapshots: I) -> Result<()>
    where
        I: IntoIterator<Item = MeshSnapshot>,
    {
        let mut writer = Self::create(manifest_path)?;
        let mut iter = snapshots.into_iter();

        let first = iter
            .next()
            .ok_or_else(|| Error::invalid("cannot build a time course from zero snapshots"))?;
        writer.write_topology(first.mesh())?;
        writer.write_step(first.time(), first.point_data(), first.cell_data())?;

        for snapshot in iter {
            writer.write_step(snapshot.time(), snapshot.point_data(), snapshot.cell_data())?;
        }
        writer.finish()
    }
}

/// Remove a partially written time course (manifest and payload).
/// Missing files are ignored.
pub(crate) fn remove_artifacts(manifest_path: &Path) {
    let _ = std::fs::remove_file(payload_path_for(manifest_path));
    let _ = std::fs::remove_file(manifest_path);
}
