//! Observation (`.mom`) file ingest.
//!
//! Turns a text series into an `ObservationSeries`:
//!
//! - **Strict header**: the sampling period comes from a
//!   `# sampling period <x>` comment (or a documented default).
//! - **Row-level validation**: unparsable rows are skipped and reported, they
//!   never shift the series bounds silently.
//! - **Separation of concerns**: no gap policy here, see `data::gaps`.

use std::fs;
use std::path::Path;

use crate::domain::{ObservationSeries, Sample, Station};
use crate::error::PipelineError;

const SAMPLING_PERIOD_TAG: &str = "sampling period";

/// Sampling period assumed when a header is absent and the caller allows it.
pub const DEFAULT_SAMPLING_PERIOD: f64 = 1.0;

/// What to do when the file has no sampling-period comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Missing header is a `MalformedHeader` error.
    Required,
    /// Missing header means daily sampling.
    DefaultDaily,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the series plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: ObservationSeries,
    /// Whether the sampling period was read from the file (vs defaulted).
    pub header_found: bool,
    pub row_errors: Vec<RowError>,
}

/// Read and parse an observation file.
pub fn load_series(path: &Path, station: &Station, policy: HeaderPolicy) -> Result<IngestedSeries, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)
        .map_err(|e| PipelineError::io(format!("failed to read {}", path.display()), e))?;
    parse_series(&text, station, policy).map_err(|message| PipelineError::MalformedHeader {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse observation text. Errors are header/bounds problems.
pub fn parse_series(text: &str, station: &Station, policy: HeaderPolicy) -> Result<IngestedSeries, String> {
    let mut sampling_period = None;
    let mut samples = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            if sampling_period.is_none() && samples.is_empty() {
                if let Some(period) = parse_sampling_period(comment)? {
                    sampling_period = Some(period);
                }
            }
            continue;
        }

        match parse_row(trimmed) {
            Ok(sample) => samples.push(sample),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let header_found = sampling_period.is_some();
    let sampling_period = match (sampling_period, policy) {
        (Some(p), _) => p,
        (None, HeaderPolicy::DefaultDaily) => DEFAULT_SAMPLING_PERIOD,
        (None, HeaderPolicy::Required) => {
            return Err("missing '# sampling period' comment".to_string());
        }
    };

    if samples.is_empty() {
        return Err("no observation rows".to_string());
    }

    Ok(IngestedSeries {
        series: ObservationSeries {
            station: station.clone(),
            sampling_period,
            samples,
        },
        header_found,
        row_errors,
    })
}

/// `Ok(None)` for comments that are not a sampling-period header.
fn parse_sampling_period(comment: &str) -> Result<Option<f64>, String> {
    let comment = comment.trim();
    let Some(rest) = comment.strip_prefix(SAMPLING_PERIOD_TAG) else {
        return Ok(None);
    };
    let token = rest.split_whitespace().next().unwrap_or("");
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        _ => Err(format!("invalid sampling period '{token}'")),
    }
}

fn parse_row(line: &str) -> Result<Sample, String> {
    let mut cols = line.split_whitespace();
    let epoch = parse_f64(cols.next(), "epoch")?;
    let value = parse_f64(cols.next(), "value")?;
    let model_value = match cols.next() {
        Some(raw) => Some(parse_f64(Some(raw), "model value")?),
        None => None,
    };
    Ok(Sample {
        epoch,
        value,
        model_value,
    })
}

fn parse_f64(raw: Option<&str>, name: &str) -> Result<f64, String> {
    let raw = raw.ok_or_else(|| format!("missing {name}"))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid {name} '{raw}'")),
    }
}
