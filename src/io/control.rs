//! Control-file rendering and (re)reading.
//!
//! Control files are plain `Key   value` lines. The engine splits on
//! whitespace, so the padding is cosmetic.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::StageConfig;
use crate::error::PipelineError;

const KEY_WIDTH: usize = 22;

/// Render a stage configuration as control-file text.
pub fn render_control(config: &StageConfig) -> String {
    let mut out = String::new();
    for (key, value) in config.entries() {
        out.push_str(&format!("{key:<width$}{value}\n", width = KEY_WIDTH.max(key.len() + 1)));
    }
    out
}

/// Render the standard-input answers, one per line.
pub fn render_answers(config: &StageConfig) -> String {
    let mut out = String::new();
    for line in config.answers() {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Write `<stage>.ctl` (and `<stage>.txt` when the stage has answers) into `dir`.
///
/// Returns the control file path.
pub fn write_control(dir: &Path, config: &StageConfig) -> Result<PathBuf, PipelineError> {
    let path = dir.join(config.stage.control_file_name());
    fs::write(&path, render_control(config))
        .map_err(|e| PipelineError::io(format!("failed to write {}", path.display()), e))?;

    if !config.answers().is_empty() {
        let answers = dir.join(format!("{}.txt", config.stage.label()));
        fs::write(&answers, render_answers(config))
            .map_err(|e| PipelineError::io(format!("failed to write {}", answers.display()), e))?;
    }
    Ok(path)
}

/// Parse control-file text back into `(key, value)` pairs.
pub fn parse_control(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let key = parts.next()?;
            let value: Vec<&str> = parts.collect();
            Some((key.to_string(), value.join(" ")))
        })
        .collect()
}
