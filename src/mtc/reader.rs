//! MTC container reader.
//!
//! Opens the JSON manifest, resolves the colocated payload and reads
//! topology and per-step arrays on demand. The payload is memory
//! mapped when possible, with a buffered file fallback.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use parking_lot::RwLock;
use tracing::debug;

use super::format::*;
use crate::mesh::{AttributeArray, AttributeMap, CellBlock, Mesh, MeshSnapshot};
use crate::util::{Error, Result};

/// Read access to a payload file.
/// Supports both memory-mapped and buffered I/O modes.
#[derive(Debug)]
pub(crate) struct Payload {
    inner: PayloadInner,
    size: u64,
}

#[derive(Debug)]
enum PayloadInner {
    /// Memory-mapped file (preferred for large payloads)
    Mmap(Mmap),
    /// Buffered file access (fallback)
    File(Arc<RwLock<File>>),
}

impl Payload {
    /// Open a payload file, validating its header.
    pub fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < PAYLOAD_HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        let inner = if use_mmap {
            // Safety: file is opened read-only
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            PayloadInner::Mmap(mmap)
        } else {
            PayloadInner::File(Arc::new(RwLock::new(file)))
        };

        let payload = Self { inner, size };
        payload.validate_header()?;
        Ok(payload)
    }

    fn validate_header(&self) -> Result<()> {
        let header = self.read_bytes(0, PAYLOAD_HEADER_SIZE)?;
        if &header[0..4] != PAYLOAD_MAGIC {
            return Err(Error::InvalidMagic);
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != PAYLOAD_VERSION {
            return Err(Error::UnsupportedVersion(version as u32));
        }
        Ok(())
    }

    /// Read bytes at a specific position.
    pub fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        if pos + len as u64 > self.size {
            return Err(Error::UnexpectedEof(pos + len as u64));
        }

        match &self.inner {
            PayloadInner::Mmap(mmap) => Ok(mmap[pos as usize..pos as usize + len].to_vec()),
            PayloadInner::File(file) => {
                let mut f = file.write();
                f.seek(SeekFrom::Start(pos))?;
                let mut buf = vec![0u8; len];
                f.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Read `count` little-endian f64 values starting at `pos`.
    pub fn read_f64_array(&self, pos: u64, count: usize) -> Result<Vec<f64>> {
        let bytes = self.read_bytes(pos, count * 8)?;
        let mut values = Vec::with_capacity(count);
        for c in bytes.chunks_exact(8) {
            values.push(f64::from_le_bytes([
                c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
            ]));
        }
        Ok(values)
    }

    /// Read `count` little-endian u32 values starting at `pos`.
    pub fn read_u32_array(&self, pos: u64, count: usize) -> Result<Vec<u32>> {
        let bytes = self.read_bytes(pos, count * 4)?;
        let mut values = Vec::with_capacity(count);
        for c in bytes.chunks_exact(4) {
            values.push(u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        }
        Ok(values)
    }
}

/// Reader for an MTC time course.
///
/// Holds one open read handle on the payload for its lifetime; both
/// files are released when the reader is dropped.
#[derive(Debug)]
pub struct TimeSeriesReader {
    path: PathBuf,
    manifest: Manifest,
    payload: Payload,
    times: Vec<f64>,
    topology: RwLock<Option<Arc<Mesh>>>,
}

impl TimeSeriesReader {
    /// Open a time course by manifest path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Open with explicit control over payload memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::unreadable(&path, e.to_string()))?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| Error::unreadable(&path, e.to_string()))?;

        if manifest.format != MANIFEST_FORMAT {
            return Err(Error::unreadable(
                &path,
                format!("unknown format tag '{}'", manifest.format),
            ));
        }
        if manifest.version != MANIFEST_VERSION {
            return Err(Error::UnsupportedVersion(manifest.version));
        }
        if manifest.payload.contains(['/', '\\']) {
            return Err(Error::invalid(format!(
                "payload must be a colocated file name, got '{}'",
                manifest.payload,
            )));
        }

        let times: Vec<f64> = manifest.steps.iter().map(|s| s.time).collect();
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid("step times are not strictly increasing"));
        }

        let payload_path = match path.parent() {
            Some(parent) => parent.join(&manifest.payload),
            None => PathBuf::from(&manifest.payload),
        };
        let payload = Payload::open(&payload_path, use_mmap)?;

        debug!(
            "opened time course: {} ({} steps)",
            path.display(),
            times.len()
        );

        Ok(Self {
            path,
            manifest,
            payload,
            times,
            topology: RwLock::new(None),
        })
    }

    /// Manifest path this reader was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Step timestamps, strictly increasing.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of timesteps.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.times.len()
    }

    /// Read the shared mesh topology (cached after the first call).
    pub fn read_topology(&self) -> Result<Arc<Mesh>> {
        if let Some(mesh) = self.topology.read().as_ref() {
            return Ok(Arc::clone(mesh));
        }

        let entry = &self.manifest.topology;
        if entry.points.components != 3 {
            return Err(Error::invalid(format!(
                "topology points must have 3 components, got {}",
                entry.points.components,
            )));
        }

        let raw = self
            .payload
            .read_f64_array(entry.points.offset, entry.points.len())?;
        let points = raw
            .chunks_exact(3)
            .map(|c| glam::DVec3::new(c[0], c[1], c[2]))
            .collect();

        let mut blocks = Vec::with_capacity(entry.blocks.len());
        for block in &entry.blocks {
            let count = block.count as usize * block.cell_type.nodes_per_cell();
            let connectivity = self.payload.read_u32_array(block.offset, count)?;
            blocks.push(CellBlock::new(block.cell_type, connectivity)?);
        }

        let mesh = Arc::new(Mesh::new(points, blocks)?);
        *self.topology.write() = Some(Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Read the point/cell attribute arrays of step `k`.
    pub fn read_step(&self, k: usize) -> Result<(AttributeMap, AttributeMap)> {
        let step = self.manifest.steps.get(k).ok_or(Error::StepOutOfBounds {
            index: k,
            count: self.num_steps(),
        })?;

        let point_data = self.read_data_map(&step.point_data)?;
        let cell_data = self.read_data_map(&step.cell_data)?;
        Ok((point_data, cell_data))
    }

    /// Read step `k` as a [`MeshSnapshot`] against the shared topology.
    pub fn read_snapshot(&self, k: usize) -> Result<MeshSnapshot> {
        let mesh = self.read_topology()?;
        let (point_data, cell_data) = self.read_step(k)?;
        MeshSnapshot::new(mesh, point_data, cell_data, self.times[k])
    }

    fn read_data_map(
        &self,
        entries: &std::collections::BTreeMap<String, ArrayEntry>,
    ) -> Result<AttributeMap> {
        let mut map = AttributeMap::new();
        for (name, entry) in entries {
            let data = self.payload.read_f64_array(entry.offset, entry.len())?;
            map.insert(
                name.clone(),
                AttributeArray::new(data, entry.components as usize)?,
            );
        }
        Ok(map)
    }
}
