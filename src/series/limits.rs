//! Global data limits of a time course.
//!
//! Per-attribute (min, max) over all timesteps, used downstream to
//! pin a consistent color scale across frames and across runs. The
//! result is persisted as a flat JSON side file next to the source;
//! the file is advisory: deleting it only forces recomputation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::series::catalog::AttributeCatalog;
use crate::mesh::AttributeMap;
use crate::mtc::TimeSeriesReader;
use crate::util::{Error, Result};

/// Key handling when merging limits from several runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Union of all key sets; an attribute seen in any input appears
    /// in the result.
    #[default]
    Union,
    /// Only keys of the first input survive; attributes unique to
    /// later inputs are dropped. Compatibility mode for consumers
    /// that expect the narrowing merge.
    FirstKeys,
}

/// Map of attribute name to global (min, max).
///
/// Entries only ever widen: updates and merges enlarge ranges, never
/// shrink them. Point and cell scalars share one flat namespace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataLimits {
    limits: BTreeMap<String, (f64, f64)>,
}

impl DataLimits {
    /// Empty limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// (min, max) of an attribute, if present.
    pub fn get(&self, name: &str) -> Option<(f64, f64)> {
        self.limits.get(name).copied()
    }

    /// Number of attributes with limits.
    #[inline]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// True if no attribute has limits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Iterate (name, (min, max)) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.limits.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Widen the entry for `name` to cover `[min, max]`, inserting it
    /// if absent.
    pub fn update(&mut self, name: &str, min: f64, max: f64) {
        match self.limits.get_mut(name) {
            Some(entry) => {
                if min < entry.0 {
                    entry.0 = min;
                }
                if max > entry.1 {
                    entry.1 = max;
                }
            }
            None => {
                self.limits.insert(name.to_string(), (min, max));
            }
        }
    }

    /// Compute limits for every scalar attribute of a time course.
    ///
    /// Iterates every timestep exactly once; vector/tensor attributes
    /// are skipped (no reduction policy for multi-component ranges).
    pub fn compute(source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref();
        let catalog = AttributeCatalog::build(source)?;
        let reader = TimeSeriesReader::open(source)?;

        let mut limits = Self::new();
        for k in 0..reader.num_steps() {
            let (point_data, cell_data) = reader.read_step(k)?;
            limits.scan_scalars(&catalog.point_attributes, &point_data, k)?;
            limits.scan_scalars(&catalog.cell_attributes, &cell_data, k)?;
        }

        debug!(
            "computed limits for {} scalars over {} steps: {}",
            limits.len(),
            reader.num_steps(),
            source.display()
        );
        Ok(limits)
    }

    fn scan_scalars(
        &mut self,
        infos: &BTreeMap<String, crate::series::AttributeInfo>,
        data: &AttributeMap,
        step: usize,
    ) -> Result<()> {
        for (name, info) in infos {
            if !info.kind.is_scalar() {
                continue;
            }
            let array = data.get(name).ok_or_else(|| Error::AttributeSetMismatch {
                name: name.clone(),
                step,
            })?;
            if let Some((min, max)) = array.min_max() {
                self.update(name, min, max);
            }
        }
        Ok(())
    }

    /// Side-file path for a source: `<parent>/<stem>_limits.json`.
    pub fn limits_path_for(source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}_limits.json");
        match source.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Load limits from a JSON side file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::unreadable(path, e.to_string()))?;
        let limits =
            serde_json::from_str(&text).map_err(|e| Error::unreadable(path, e.to_string()))?;
        Ok(limits)
    }

    /// Save limits as a flat JSON object `{name: [min, max]}`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Return cached limits from `cache_path` if present (trusted
    /// as-is; staleness is the caller's responsibility), otherwise
    /// compute and persist them. `overwrite` forces recomputation.
    pub fn load_or_compute(
        source: impl AsRef<Path>,
        cache_path: impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<Self> {
        let cache_path = cache_path.as_ref();

        if !overwrite && cache_path.exists() {
            info!("limits file exists: {}", cache_path.display());
            return Self::load(cache_path);
        }

        let limits = Self::compute(source)?;
        limits.save(cache_path)?;
        info!("limits file created: {}", cache_path.display());
        Ok(limits)
    }

    /// [`load_or_compute`](Self::load_or_compute) with the cache path
    /// derived from the source path.
    pub fn for_source(source: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        let cache_path = Self::limits_path_for(source.as_ref());
        Self::load_or_compute(source, cache_path, overwrite)
    }

    /// Merge limits from several runs into one combined range:
    /// per attribute, min of mins and max of maxes.
    pub fn merge(all: &[DataLimits], policy: KeyPolicy) -> DataLimits {
        let mut merged = match all.first() {
            Some(first) => first.clone(),
            None => return DataLimits::new(),
        };

        for limits in &all[1..] {
            for (name, &(min, max)) in &limits.limits {
                if policy == KeyPolicy::FirstKeys && !merged.limits.contains_key(name) {
                    continue;
                }
                merged.update(name, min, max);
            }
        }
        merged
    }
}
