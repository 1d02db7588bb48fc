//! Convert NGL `.tenv3` daily solutions into per-component observation files.
//!
//! Each input yields `<site>_0.mom` (east), `<site>_1.mom` (north) and
//! `<site>_2.mom` (up) in millimetres, relative to the first epoch.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{Component, Station};
use crate::error::PipelineError;
use crate::io::workspace::create_dir;

const COL_MJD: usize = 3;
const COL_EAST: usize = 8;
const COL_NORTH: usize = 10;
const COL_UP: usize = 12;

/// Displacements are given in metres.
const METRES_TO_MM: f64 = 1000.0;

/// One converted epoch: MJD as written in the source, then E/N/U in mm.
#[derive(Debug, Clone, PartialEq)]
pub struct Tenv3Row {
    pub mjd: String,
    pub enu: [f64; 3],
}

/// Parse tenv3 text into rows relative to the first epoch.
///
/// Lines starting with `site` are headers. Malformed lines are errors; a
/// converted file must not silently lose epochs.
pub fn parse_tenv3(text: &str) -> Result<Vec<Tenv3Row>, String> {
    let mut rows = Vec::new();
    let mut origin: Option<[f64; 3]> = None;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("site") {
            continue;
        }
        let cols: Vec<&str> = trimmed.split_whitespace().collect();
        if cols.len() <= COL_UP {
            return Err(format!("line {}: expected at least {} columns", idx + 1, COL_UP + 1));
        }

        let mjd = cols[COL_MJD];
        mjd.parse::<f64>()
            .map_err(|_| format!("line {}: invalid MJD '{mjd}'", idx + 1))?;

        let mut enu = [0.0; 3];
        for (slot, col) in [COL_EAST, COL_NORTH, COL_UP].into_iter().enumerate() {
            let raw = cols[col];
            let metres = raw
                .parse::<f64>()
                .map_err(|_| format!("line {}: invalid displacement '{raw}'", idx + 1))?;
            enu[slot] = metres * METRES_TO_MM;
        }

        let base = *origin.get_or_insert(enu);
        for (v, b) in enu.iter_mut().zip(base) {
            *v -= b;
        }

        rows.push(Tenv3Row {
            mjd: mjd.to_string(),
            enu,
        });
    }
    Ok(rows)
}

/// Render one component as an observation file.
pub fn render_component(rows: &[Tenv3Row], component: Component) -> String {
    let mut out = String::from("# sampling period 1.0\n");
    for row in rows {
        out.push_str(&format!("{} {:8.2}\n", row.mjd, row.enu[component.index()]));
    }
    out
}

/// Convert every `*.tenv3` in `ori_dir` into `raw_dir`. Returns written files.
pub fn convert_directory(ori_dir: &Path, raw_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let pattern = format!("{}/*.tenv3", glob::Pattern::escape(&ori_dir.to_string_lossy()));
    let mut inputs: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| {
            PipelineError::io(
                format!("invalid search pattern {pattern}"),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
            )
        })?
        .filter_map(Result::ok)
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        return Err(PipelineError::MissingInput {
            path: ori_dir.join("*.tenv3"),
        });
    }
    create_dir(raw_dir)?;

    let mut written = Vec::new();
    for input in inputs {
        let Some(site) = input
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .filter(|s| !s.is_empty())
        else {
            warn!(file = %input.display(), "cannot derive a site name, skipping");
            continue;
        };

        let text = fs::read_to_string(&input)
            .map_err(|e| PipelineError::io(format!("failed to read {}", input.display()), e))?;
        let rows = parse_tenv3(&text).map_err(|message| PipelineError::MalformedHeader {
            path: input.clone(),
            message,
        })?;

        for component in Component::ALL {
            let station = Station::for_component(site, component);
            let path = raw_dir.join(station.file_name());
            fs::write(&path, render_component(&rows, component))
                .map_err(|e| PipelineError::io(format!("failed to write {}", path.display()), e))?;
            written.push(path);
        }
        info!(site, epochs = rows.len(), "converted tenv3 file");
    }
    Ok(written)
}
