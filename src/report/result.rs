//! Reader for the JSON document the trend engine leaves behind.
//!
//! Expected shape:
//!
//! ```json
//! { "driving_noise": 1.23,
//!   "NoiseModel": { "GGM":   { "fraction": 0.4, "d": 0.45, "1-phi": 6.9e-06 },
//!                   "White": { "fraction": 0.6 } },
//!   ... }
//! ```
//!
//! Model order is document order. Models this reader does not know are kept
//! with their fraction and raw value only.

use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PipelineError;

pub const KEY_NOISE_MODEL: &str = "NoiseModel";
pub const KEY_DRIVING_NOISE: &str = "driving_noise";

/// One fitted noise model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEstimate {
    /// Engine model name (`GGM`, `White`, `Matern`, ...).
    pub name: String,
    pub fraction: f64,
    /// Spectral index.
    pub d: Option<f64>,
    /// GGM complement of the pole.
    pub one_minus_phi: Option<f64>,
    /// Varying-seasonal decay.
    pub phi: Option<f64>,
    /// Matérn decay.
    pub lambda: Option<f64>,
    /// First autoregressive coefficient.
    pub ar1: Option<f64>,
    pub raw: Value,
}

/// Parsed result of a trend estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub models: Vec<ModelEstimate>,
    pub driving_noise: f64,
    document: Map<String, Value>,
}

impl StageResult {
    pub fn model(&self, name: &str) -> Option<&ModelEstimate> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }

    /// The full engine document (offsets, trend, metadata included).
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }
}

impl Serialize for StageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

/// Extract a `StageResult` from a parsed document.
pub fn read_result(document: Value) -> Result<StageResult, PipelineError> {
    let Value::Object(document) = document else {
        return Err(malformed("result is not a JSON object"));
    };

    let driving_noise = document
        .get(KEY_DRIVING_NOISE)
        .ok_or_else(|| malformed(format!("missing '{KEY_DRIVING_NOISE}'")))?
        .as_f64()
        .ok_or_else(|| malformed(format!("'{KEY_DRIVING_NOISE}' is not a number")))?;

    let entries = document
        .get(KEY_NOISE_MODEL)
        .ok_or_else(|| malformed(format!("missing '{KEY_NOISE_MODEL}'")))?
        .as_object()
        .ok_or_else(|| malformed(format!("'{KEY_NOISE_MODEL}' is not an object")))?;

    let models = entries
        .iter()
        .map(|(name, raw)| read_model(name, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StageResult {
        models,
        driving_noise,
        document,
    })
}

pub fn read_result_str(text: &str) -> Result<StageResult, PipelineError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    read_result(value)
}

pub fn read_result_file(path: &Path) -> Result<StageResult, PipelineError> {
    read_result_str(&read_text(path)?)
}

/// Read any JSON document (used for the outlier report, which has no fixed shape).
pub fn read_document_file(path: &Path) -> Result<Value, PipelineError> {
    serde_json::from_str(&read_text(path)?)
        .map_err(|e| malformed(format!("invalid JSON in {}: {e}", path.display())))
}

fn read_text(path: &Path) -> Result<String, PipelineError> {
    if !path.is_file() {
        return Err(malformed(format!("engine did not write {}", path.display())));
    }
    fs::read_to_string(path).map_err(|e| PipelineError::io(format!("failed to read {}", path.display()), e))
}

fn read_model(name: &str, raw: &Value) -> Result<ModelEstimate, PipelineError> {
    let fraction = raw
        .get("fraction")
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(format!("model '{name}' has no numeric 'fraction'")))?;

    let field = |key: &str| raw.get(key).and_then(Value::as_f64);

    let mut estimate = ModelEstimate {
        name: name.to_string(),
        fraction,
        d: None,
        one_minus_phi: None,
        phi: None,
        lambda: None,
        ar1: None,
        raw: raw.clone(),
    };

    match name {
        "GGM" => {
            estimate.d = field("d");
            estimate.one_minus_phi = field("1-phi");
        }
        "Powerlaw" | "PowerlawApprox" => estimate.d = field("d"),
        "Matern" => {
            estimate.d = field("d");
            estimate.lambda = field("lambda");
        }
        "VaryingAnnual" | "VaryingSemiAnnual" => estimate.phi = field("phi"),
        "ARMA" => {
            estimate.ar1 = raw
                .get("AR")
                .and_then(Value::as_array)
                .and_then(|ar| ar.first())
                .and_then(Value::as_f64);
        }
        _ => {}
    }

    Ok(estimate)
}

fn malformed(message: impl Into<String>) -> PipelineError {
    PipelineError::MalformedResult {
        message: message.into(),
    }
}
