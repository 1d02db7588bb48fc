//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - passed between pipeline stages without copying large buffers
//! - rendered into engine control files
//! - reported in terminal summaries

use std::fmt;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};

use crate::models::NoiseModelSet;
use crate::stages::EngineConfig;

/// Modified Julian Date of 2000-01-01, the origin of decimal-year plots.
pub const MJD_J2000: f64 = 51544.0;

/// Coordinate component encoded as a `_0`, `_1` or `_2` file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    East,
    North,
    Up,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::East, Component::North, Component::Up];

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Component::East),
            1 => Some(Component::North),
            2 => Some(Component::Up),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Component::East => 0,
            Component::North => 1,
            Component::Up => 2,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Component::East => "east",
            Component::North => "north",
            Component::Up => "up",
        }
    }
}

/// A station as identified by its observation file stem (`ALIC_0`, `YAR2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Station {
    id: String,
    marker: String,
    component: Option<Component>,
}

impl Station {
    /// Derive a station from a file stem.
    ///
    /// `MARK_<d>` with `d` in `0..=2` yields a marker plus component; anything
    /// else is an undifferentiated series whose marker is the whole id.
    pub fn from_stem(stem: &str) -> Self {
        let split = stem.rsplit_once('_').and_then(|(marker, suffix)| {
            let index = suffix.parse::<u32>().ok()?;
            let component = Component::from_index(index)?;
            (!marker.is_empty()).then(|| (marker.to_string(), component))
        });

        match split {
            Some((marker, component)) => Self {
                id: stem.to_string(),
                marker,
                component: Some(component),
            },
            None => Self {
                id: stem.to_string(),
                marker: stem.to_string(),
                component: None,
            },
        }
    }

    /// Station for one component of a marker.
    pub fn for_component(marker: &str, component: Component) -> Self {
        Self {
            id: format!("{marker}_{}", component.index()),
            marker: marker.to_string(),
            component: Some(component),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn component(&self) -> Option<Component> {
        self.component
    }

    /// Observation file name (`<id>.mom`).
    pub fn file_name(&self) -> String {
        format!("{}.mom", self.id)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// One observation row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Epoch in Modified Julian Days.
    pub epoch: f64,
    pub value: f64,
    pub model_value: Option<f64>,
}

/// An observation series as read from a `.mom` file.
///
/// Samples are in file order (ascending epoch). Missing epochs are not
/// interpolated; the gap analyzer quantifies them.
#[derive(Debug, Clone)]
pub struct ObservationSeries {
    pub station: Station,
    pub sampling_period: f64,
    pub samples: Vec<Sample>,
}

impl ObservationSeries {
    pub fn first_epoch(&self) -> Option<f64> {
        self.samples.first().map(|s| s.epoch)
    }

    pub fn last_epoch(&self) -> Option<f64> {
        self.samples.last().map(|s| s.epoch)
    }

    pub fn observed_count(&self) -> usize {
        self.samples.len()
    }

    /// Calendar span of the series (first and last epoch).
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = mjd_to_date(self.first_epoch()?)?;
        let last = mjd_to_date(self.last_epoch()?)?;
        Some((first, last))
    }
}

/// Convert a Modified Julian Date to its calendar day.
pub fn mjd_to_date(mjd: f64) -> Option<NaiveDate> {
    if !mjd.is_finite() || mjd < 0.0 {
        return None;
    }
    let origin = NaiveDate::from_ymd_opt(1858, 11, 17)?;
    origin.checked_add_days(Days::new(mjd.floor() as u64))
}

/// Decimal year for an MJD epoch (365.25-day years from J2000).
pub fn decimal_year(mjd: f64) -> f64 {
    (mjd - MJD_J2000) / 365.25 + 2000.0
}

/// One external-engine stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DetectOffsets,
    RemoveOutliers,
    EstimateTrend,
    EstimateSpectrum,
    ModelSpectrum,
    Plot,
}

impl Stage {
    /// Stage label, also the stem of its control file and JSON output.
    pub fn label(self) -> &'static str {
        match self {
            Stage::DetectOffsets => "findoffset",
            Stage::RemoveOutliers => "removeoutliers",
            Stage::EstimateTrend => "estimatetrend",
            Stage::EstimateSpectrum => "estimatespectrum",
            Stage::ModelSpectrum => "modelspectrum",
            Stage::Plot => "plot",
        }
    }

    pub fn control_file_name(self) -> String {
        format!("{}.ctl", self.label())
    }

    pub fn json_file_name(self) -> String {
        format!("{}.json", self.label())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scalar value in a control file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    /// Rendered as `yes` / `no`.
    Flag(bool),
    Int(i64),
    /// Rendered in plain notation, always with a decimal point.
    Float(f64),
    /// Rendered in scientific notation (`6.9e-6`).
    Scientific(f64),
}

impl ConfigValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Int(v) => Some(*v as f64),
            ConfigValue::Float(v) | ConfigValue::Scientific(v) => Some(*v),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            ConfigValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => f.write_str(s),
            ConfigValue::Flag(true) => f.write_str("yes"),
            ConfigValue::Flag(false) => f.write_str("no"),
            ConfigValue::Int(v) => write!(f, "{v}"),
            ConfigValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.1}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::Scientific(v) => write!(f, "{v:e}"),
        }
    }
}

/// Configuration payload for one engine invocation.
///
/// Entries keep insertion order so generated control files are deterministic.
/// `answers` are lines piped to the engine's standard input (only the
/// spectrum-modelling engine asks questions).
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub stage: Stage,
    entries: Vec<(String, ConfigValue)>,
    answers: Vec<String>,
}

impl StageConfig {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            entries: Vec::new(),
            answers: Vec::new(),
        }
    }

    /// Set a key, replacing an earlier value for the same key in place.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn text(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, ConfigValue::Text(value.into()));
    }

    pub fn flag(&mut self, key: &str, value: bool) {
        self.set(key, ConfigValue::Flag(value));
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> &[(String, ConfigValue)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn push_answer(&mut self, line: impl Into<String>) {
        self.answers.push(line.into());
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }
}

/// Whether a spectral parameter is estimated or pinned to a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterPolicy {
    Free,
    Fixed(f64),
}

impl ParameterPolicy {
    pub fn is_free(self) -> bool {
        matches!(self, ParameterPolicy::Free)
    }

    pub fn fixed_value(self) -> Option<f64> {
        match self {
            ParameterPolicy::Free => None,
            ParameterPolicy::Fixed(v) => Some(v),
        }
    }
}

/// Parameters the trend stage pinned, threaded into the spectrum-model stage.
///
/// A parameter fixed during trend estimation must be passed on as fixed and
/// must not be re-estimated (or re-answered) by the spectrum model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPolicies {
    /// GGM complement of the pole (`GGM_1mphi`).
    pub one_minus_phi: ParameterPolicy,
    /// GGM/Matérn shape exponent (`kappa_fixed`).
    pub kappa: ParameterPolicy,
    /// Matérn decay (`lambda_fixed`).
    pub lambda: ParameterPolicy,
}

impl Default for ParameterPolicies {
    fn default() -> Self {
        Self {
            one_minus_phi: ParameterPolicy::Free,
            kappa: ParameterPolicy::Free,
            lambda: ParameterPolicy::Free,
        }
    }
}

/// How far a run takes each station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPlan {
    /// Gap check plus offset detection or pass-through copy, nothing else.
    Curate,
    /// Outlier removal and trend estimation.
    Analyse,
    /// The whole chain through plotting, with aggregated reports.
    Full,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub plan: RunPlan,
    /// Noise models for trend estimation (absent for pure curation runs).
    pub noise_models: Option<NoiseModelSet>,
    /// Noise models used by the offset finder.
    pub detection_models: NoiseModelSet,
    /// Restrict the run to one station (or one marker when curating in 3D).
    pub station: Option<String>,
    /// Curate raw files (gap check + offsets) before analysis.
    pub from_raw: bool,
    pub penalty: f64,
    pub use_3d: bool,
    /// Worker threads for the station loop (1 = sequential).
    pub jobs: usize,
    pub engine: EngineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_with_component_suffix() {
        let s = Station::from_stem("ALIC_2");
        assert_eq!(s.marker(), "ALIC");
        assert_eq!(s.component(), Some(Component::Up));
        assert_eq!(s.file_name(), "ALIC_2.mom");
    }

    #[test]
    fn station_without_component_is_undifferentiated() {
        for stem in ["YAR2", "YAR2_7", "_1", "MAS1_x"] {
            let s = Station::from_stem(stem);
            assert_eq!(s.marker(), stem);
            assert_eq!(s.component(), None);
        }
    }

    #[test]
    fn mjd_origin_and_j2000() {
        assert_eq!(mjd_to_date(0.0), NaiveDate::from_ymd_opt(1858, 11, 17));
        assert_eq!(mjd_to_date(51544.5), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert!((decimal_year(MJD_J2000) - 2000.0).abs() < 1e-12);
    }

    #[test]
    fn config_value_rendering() {
        assert_eq!(ConfigValue::Flag(true).to_string(), "yes");
        assert_eq!(ConfigValue::Float(-1.0).to_string(), "-1.0");
        assert_eq!(ConfigValue::Float(0.9999).to_string(), "0.9999");
        assert_eq!(ConfigValue::Scientific(6.9e-6).to_string(), "6.9e-6");
        assert_eq!(ConfigValue::Int(3).to_string(), "3");
    }

    #[test]
    fn stage_config_set_replaces_in_place() {
        let mut cfg = StageConfig::new(Stage::EstimateTrend);
        cfg.set("GGM_1mphi", ConfigValue::Scientific(6.9e-6));
        cfg.flag("JSON", true);
        cfg.set("GGM_1mphi", ConfigValue::Float(0.02));
        let keys: Vec<&str> = cfg.keys().collect();
        assert_eq!(keys, ["GGM_1mphi", "JSON"]);
        assert_eq!(cfg.get("GGM_1mphi").and_then(ConfigValue::as_f64), Some(0.02));
    }
}
