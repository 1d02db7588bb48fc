//! Run directory layout and station-scoped working directories.
//!
//! Every engine is started inside `work/<station>/`, where it finds its
//! control file and leaves its outputs. Two stations never share a control
//! file, so the station loop can run in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::Station;
use crate::error::PipelineError;

/// Directory layout of a run, rooted at an absolute path.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(root: &Path) -> Result<Self, PipelineError> {
        let root = std::path::absolute(root)
            .map_err(|e| PipelineError::io(format!("failed to resolve {}", root.display()), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Converter input (`*.tenv3`).
    pub fn ori_dir(&self) -> PathBuf {
        self.root.join("ori_files")
    }

    /// Uncurated series, one file per component.
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw_files")
    }

    /// Curated series (offset-aware or passed through).
    pub fn obs_dir(&self) -> PathBuf {
        self.root.join("obs_files")
    }

    /// Series with outliers removed.
    pub fn pre_dir(&self) -> PathBuf {
        self.root.join("pre_files")
    }

    /// Series with fitted model column.
    pub fn fitted_dir(&self) -> PathBuf {
        self.root.join("mom_files")
    }

    pub fn data_figures_dir(&self) -> PathBuf {
        self.root.join("data_figures")
    }

    pub fn psd_figures_dir(&self) -> PathBuf {
        self.root.join("psd_figures")
    }

    pub fn work_dir(&self, name: &str) -> PathBuf {
        self.root.join("work").join(name)
    }

    pub fn trend_report_path(&self) -> PathBuf {
        self.root.join("estimatetrend_report.json")
    }

    pub fn outliers_report_path(&self) -> PathBuf {
        self.root.join("removeoutliers_report.json")
    }

    pub fn offsets_log_path(&self) -> PathBuf {
        self.root.join("offsets_BIC_c.dat")
    }

    /// Create the output directories used by analysis runs.
    pub fn prepare_analysis(&self) -> Result<(), PipelineError> {
        for dir in [
            self.pre_dir(),
            self.fitted_dir(),
            self.data_figures_dir(),
            self.psd_figures_dir(),
        ] {
            create_dir(&dir)?;
        }
        Ok(())
    }

    /// Create a fresh working directory for one station (or curation target).
    pub fn station_workspace(&self, name: &str) -> Result<PathBuf, PipelineError> {
        let dir = self.work_dir(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| PipelineError::io(format!("failed to clear {}", dir.display()), e))?;
        }
        create_dir(&dir)?;
        debug!(workspace = %dir.display(), "prepared station workspace");
        Ok(dir)
    }
}

pub fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(format!("failed to create {}", dir.display()), e))
}

/// Stations with a `<stem><suffix>` file in `dir`, sorted by id.
///
/// `suffix` is typically `.mom` or `_0.mom`; the station id is the stem
/// before the suffix.
pub fn discover_stations(dir: &Path, suffix: &str) -> Result<Vec<Station>, PipelineError> {
    let pattern = format!("{}/*{}", glob::Pattern::escape(&dir.to_string_lossy()), suffix);
    let entries = glob::glob(&pattern).map_err(|e| {
        PipelineError::io(
            format!("invalid search pattern {pattern}"),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        )
    })?;

    let mut stations = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io("failed to list observation files", e.into_error()))?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() {
                stations.push(Station::from_stem(stem));
            }
        }
    }
    stations.sort_by(|a, b| a.id().cmp(b.id()));
    Ok(stations)
}

/// Copy a file, creating the destination directory if needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = to.parent() {
        create_dir(parent)?;
    }
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| PipelineError::io(format!("failed to copy {} to {}", from.display(), to.display()), e))
}
