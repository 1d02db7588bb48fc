//! Control-file builders, one per engine stage.
//!
//! Builders are pure: they turn a station, its noise-model set and earlier
//! stage results into a `StageConfig`. Writing the file is done by
//! `io::write_control`.

use std::path::Path;

use crate::domain::{
    ConfigValue, ParameterPolicies, ParameterPolicy, Stage, StageConfig, Station,
};
use crate::error::PipelineError;
use crate::io::RunLayout;
use crate::models::{NoiseModel, NoiseModelSet};
use crate::report::StageResult;
use crate::stages::SpectrumBounds;

/// `GGM_1mphi` pinned for the flicker, random-walk and power-law families.
pub const DEFAULT_ONE_MINUS_PHI: f64 = 6.9e-6;
/// `GGM_1mphi` for the flicker-compatible GGM.
pub const FGGM_ONE_MINUS_PHI: f64 = 0.02;
/// `kappa_fixed` for the flicker-compatible GGM.
pub const FGGM_KAPPA: f64 = -1.0;
/// `phi_varying_fixed` for the varying-seasonal models.
pub const VARYING_PHI: f64 = 0.9999;
/// Number of segments for Welch spectrum estimation.
pub const SPECTRUM_SEGMENTS: u32 = 4;

const PHYSICAL_UNIT: &str = "mm";
const SCALE_FACTOR: f64 = 1.0;
const WINDOW_FUNCTION: &str = "Hann";

/// Estimate-Trend configuration plus the parameters it pinned.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub config: StageConfig,
    pub policies: ParameterPolicies,
}

/// Builds control files for stations of one run.
#[derive(Debug, Clone, Copy)]
pub struct ControlFileBuilder<'a> {
    layout: &'a RunLayout,
}

impl<'a> ControlFileBuilder<'a> {
    pub fn new(layout: &'a RunLayout) -> Self {
        Self { layout }
    }

    pub fn remove_outliers(&self, station: &Station) -> StageConfig {
        let mut cfg = StageConfig::new(Stage::RemoveOutliers);
        cfg.text("DataFile", station.file_name());
        cfg.text("DataDirectory", dir_text(&self.layout.obs_dir()));
        cfg.flag("interpolate", false);
        cfg.text("OutputFile", dir_text(&self.layout.pre_dir().join(station.file_name())));
        signal_options(&mut cfg);
        cfg.set("ScaleFactor", ConfigValue::Float(SCALE_FACTOR));
        cfg.text("PhysicalUnit", PHYSICAL_UNIT);
        cfg.set("IQ_factor", ConfigValue::Int(3));
        cfg.flag("JSON", true);
        cfg
    }

    pub fn estimate_trend(&self, station: &Station, models: &NoiseModelSet) -> TrendConfig {
        let mut cfg = StageConfig::new(Stage::EstimateTrend);
        cfg.text("DataFile", station.file_name());
        cfg.text("DataDirectory", dir_text(&self.layout.pre_dir()));
        cfg.text("OutputFile", dir_text(&self.layout.fitted_dir().join(station.file_name())));
        cfg.flag("interpolate", false);
        cfg.text("PhysicalUnit", PHYSICAL_UNIT);
        cfg.set("ScaleFactor", ConfigValue::Float(SCALE_FACTOR));
        cfg.flag("JSON", true);

        let policies = model_options(&mut cfg, models);
        signal_options(&mut cfg);
        TrendConfig { config: cfg, policies }
    }

    pub fn estimate_spectrum(&self, station: &Station) -> StageConfig {
        let mut cfg = StageConfig::new(Stage::EstimateSpectrum);
        cfg.text("DataFile", station.file_name());
        cfg.text("DataDirectory", dir_text(&self.layout.fitted_dir()));
        cfg.flag("interpolate", false);
        cfg.set("ScaleFactor", ConfigValue::Float(SCALE_FACTOR));
        cfg.text("PhysicalUnit", PHYSICAL_UNIT);
        cfg.text("WindowFunction", WINDOW_FUNCTION);
        cfg
    }

    /// Spectrum-model configuration plus its standard-input answers.
    ///
    /// Parameters pinned by the trend stage are passed on as fixed keys and
    /// never answered; free ones are answered from the trend result.
    pub fn model_spectrum(
        &self,
        station: &Station,
        trend: &StageResult,
        policies: &ParameterPolicies,
        bounds: &SpectrumBounds,
        sampling_period: f64,
        number_of_points: i64,
    ) -> Result<StageConfig, PipelineError> {
        let mut cfg = StageConfig::new(Stage::ModelSpectrum);
        cfg.text("DataFile", station.file_name());
        cfg.text("DataDirectory", dir_text(&self.layout.fitted_dir()));
        cfg.set("ScaleFactor", ConfigValue::Float(SCALE_FACTOR));
        cfg.text("PhysicalUnit", PHYSICAL_UNIT);
        fixed_parameters(&mut cfg, policies);
        cfg.text("NoiseModels", trend.model_names().collect::<Vec<_>>().join(" "));
        cfg.set("AR_p", ConfigValue::Int(1));
        cfg.set("MA_q", ConfigValue::Int(0));
        cfg.set("TimeNoiseStart", ConfigValue::Int(1000));
        cfg.flag("MonteCarloConfidence", true);
        cfg.set("NumberOfSimulations", ConfigValue::Int(5000));
        cfg.set("SamplingPeriod", ConfigValue::Float(sampling_period));
        cfg.set("NumberOfPoints", ConfigValue::Int(number_of_points));
        cfg.set("NumberOfSegments", ConfigValue::Int(i64::from(SPECTRUM_SEGMENTS)));
        cfg.text("WindowFunction", WINDOW_FUNCTION);

        cfg.push_answer(answer(trend.driving_noise));
        cfg.push_answer(answer(24.0 * sampling_period));
        for model in &trend.models {
            cfg.push_answer(answer(model.fraction));
        }

        for model in &trend.models {
            let need = |value: Option<f64>, key: &str| {
                value.ok_or_else(|| PipelineError::MalformedResult {
                    message: format!("model '{}' has no '{key}'", model.name),
                })
            };
            match model.name.as_str() {
                "GGM" => {
                    if policies.kappa.is_free() {
                        cfg.push_answer(answer(need(model.d, "d")?));
                    }
                    if policies.one_minus_phi.is_free() {
                        cfg.push_answer(answer(need(model.one_minus_phi, "1-phi")?));
                    }
                }
                "Powerlaw" | "PowerlawApprox" => cfg.push_answer(answer(need(model.d, "d")?)),
                "VaryingAnnual" | "VaryingSemiAnnual" => {
                    cfg.push_answer(answer(need(model.phi, "phi")?))
                }
                "Matern" => {
                    if policies.kappa.is_free() {
                        cfg.push_answer(answer(need(model.d, "d")?));
                    }
                    if policies.lambda.is_free() {
                        cfg.push_answer(answer(need(model.lambda, "lambda")?));
                    }
                }
                "ARMA" => cfg.push_answer(answer(need(model.ar1, "AR")?)),
                _ => {}
            }
        }

        cfg.push_answer("2");
        cfg.push_answer(format!("{:e} {:e}", bounds.low, bounds.high));
        Ok(cfg)
    }

    /// Offset-finder configuration for one curation target.
    ///
    /// `stations` are the target's series: one file, or the three components
    /// of a marker when `use_3d` is set.
    pub fn detect_offsets(
        &self,
        stations: &[Station],
        models: &NoiseModelSet,
        penalty: f64,
        use_3d: bool,
        workspace: &Path,
    ) -> StageConfig {
        let mut cfg = StageConfig::new(Stage::DetectOffsets);
        let files: Vec<String> = stations.iter().map(Station::file_name).collect();
        cfg.text("DataFile", files.join(" "));
        cfg.text("DataDirectory", dir_text(&self.layout.raw_dir()));
        cfg.text("OutputFile", dir_text(workspace));
        cfg.flag("interpolate", false);
        cfg.flag("seasonalsignal", true);
        cfg.flag("halfseasonalsignal", true);
        model_options(&mut cfg, models);
        cfg.set("ExtraPenalty", ConfigValue::Float(penalty));
        cfg.flag("Use3D", use_3d);
        cfg
    }
}

/// Noise-model keys shared by the trend and offset stages.
fn model_options(cfg: &mut StageConfig, models: &NoiseModelSet) -> ParameterPolicies {
    let names: Vec<&str> = models.iter().map(|m| m.engine_name()).collect();
    cfg.text("NoiseModels", names.join(" "));

    let mut policies = ParameterPolicies::default();

    if models.contains(NoiseModel::Ar1) {
        cfg.set("AR_p", ConfigValue::Int(1));
        cfg.set("MA_q", ConfigValue::Int(0));
    }
    if models.iter().any(|m| m.needs_fixed_one_minus_phi()) {
        policies.one_minus_phi = ParameterPolicy::Fixed(DEFAULT_ONE_MINUS_PHI);
    }
    if models.contains(NoiseModel::FlickerCompatibleGgm) {
        policies.one_minus_phi = ParameterPolicy::Fixed(FGGM_ONE_MINUS_PHI);
        policies.kappa = ParameterPolicy::Fixed(FGGM_KAPPA);
    }
    fixed_parameters(cfg, &policies);
    if models.iter().any(|m| m.is_varying_seasonal()) {
        cfg.set("phi_varying_fixed", ConfigValue::Float(VARYING_PHI));
    }
    policies
}

fn fixed_parameters(cfg: &mut StageConfig, policies: &ParameterPolicies) {
    if let ParameterPolicy::Fixed(v) = policies.one_minus_phi {
        cfg.set("GGM_1mphi", ConfigValue::Scientific(v));
    }
    if let ParameterPolicy::Fixed(v) = policies.kappa {
        cfg.set("kappa_fixed", ConfigValue::Float(v));
    }
    if let ParameterPolicy::Fixed(v) = policies.lambda {
        cfg.set("lambda_fixed", ConfigValue::Scientific(v));
    }
}

fn signal_options(cfg: &mut StageConfig) {
    for key in [
        "seasonalsignal",
        "halfseasonalsignal",
        "estimateoffsets",
        "estimatepostseismic",
        "estimateslowslipevent",
    ] {
        cfg.flag(key, true);
    }
}

fn dir_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One numeric answer line. Small magnitudes keep their precision.
fn answer(value: f64) -> String {
    if value != 0.0 && value.abs() < 1e-3 {
        format!("{value:e}")
    } else {
        format!("{value:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{parse_control, render_control};
    use crate::report::read_result;
    use serde_json::json;

    fn layout() -> RunLayout {
        RunLayout::new(Path::new("/runs/demo")).unwrap()
    }

    fn models(abbr: &str) -> NoiseModelSet {
        abbr.parse().unwrap()
    }

    fn round_trip(cfg: &StageConfig) -> Vec<(String, String)> {
        parse_control(&render_control(cfg))
    }

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn bounds() -> SpectrumBounds {
        SpectrumBounds {
            low: 1.5e-8,
            high: 5.787e-6,
        }
    }

    fn keys(cfg: &StageConfig) -> Vec<String> {
        round_trip(cfg).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn every_stage_writes_exactly_its_own_keys() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let station = Station::from_stem("ALIC_0");
        let trend = builder.estimate_trend(&station, &models("PLWN"));
        let result = read_result(json!({
            "driving_noise": 1.0,
            "NoiseModel": { "GGM": { "fraction": 1.0, "d": 0.4, "1-phi": 6.9e-6 } }
        }))
        .unwrap();
        let model = builder
            .model_spectrum(&station, &result, &trend.policies, &bounds(), 1.0, 99)
            .unwrap();
        let offsets = builder.detect_offsets(
            std::slice::from_ref(&station),
            &models("PLWN"),
            8.0,
            false,
            Path::new("/runs/demo/work/ALIC_0"),
        );

        let cases: [(&str, StageConfig, &[&str]); 5] = [
            (
                "removeoutliers",
                builder.remove_outliers(&station),
                &[
                    "DataFile", "DataDirectory", "interpolate", "OutputFile", "seasonalsignal",
                    "halfseasonalsignal", "estimateoffsets", "estimatepostseismic",
                    "estimateslowslipevent", "ScaleFactor", "PhysicalUnit", "IQ_factor", "JSON",
                ],
            ),
            (
                "estimatetrend",
                trend.config.clone(),
                &[
                    "DataFile", "DataDirectory", "OutputFile", "interpolate", "PhysicalUnit",
                    "ScaleFactor", "JSON", "NoiseModels", "GGM_1mphi", "seasonalsignal",
                    "halfseasonalsignal", "estimateoffsets", "estimatepostseismic",
                    "estimateslowslipevent",
                ],
            ),
            (
                "estimatespectrum",
                builder.estimate_spectrum(&station),
                &["DataFile", "DataDirectory", "interpolate", "ScaleFactor", "PhysicalUnit", "WindowFunction"],
            ),
            (
                "modelspectrum",
                model,
                &[
                    "DataFile", "DataDirectory", "ScaleFactor", "PhysicalUnit", "GGM_1mphi",
                    "NoiseModels", "AR_p", "MA_q", "TimeNoiseStart", "MonteCarloConfidence",
                    "NumberOfSimulations", "SamplingPeriod", "NumberOfPoints", "NumberOfSegments",
                    "WindowFunction",
                ],
            ),
            (
                "findoffset",
                offsets,
                &[
                    "DataFile", "DataDirectory", "OutputFile", "interpolate", "seasonalsignal",
                    "halfseasonalsignal", "NoiseModels", "GGM_1mphi", "ExtraPenalty", "Use3D",
                ],
            ),
        ];

        for (name, cfg, expected) in cases {
            assert_eq!(keys(&cfg), expected, "{name}");
        }
    }

    #[test]
    fn shared_values_are_rendered_alike() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let station = Station::from_stem("ALIC_0");
        for cfg in [
            builder.remove_outliers(&station),
            builder.estimate_trend(&station, &models("PLWN")).config,
            builder.estimate_spectrum(&station),
        ] {
            let pairs = round_trip(&cfg);
            assert_eq!(value(&pairs, "interpolate"), Some("no"), "{}", cfg.stage);
            assert_eq!(value(&pairs, "ScaleFactor"), Some("1.0"), "{}", cfg.stage);
            assert_eq!(value(&pairs, "PhysicalUnit"), Some("mm"), "{}", cfg.stage);
        }
        let trend = round_trip(&builder.estimate_trend(&station, &models("PLWN")).config);
        for key in ["seasonalsignal", "halfseasonalsignal", "estimateoffsets", "estimatepostseismic"] {
            assert_eq!(value(&trend, key), Some("yes"), "{key}");
        }
    }

    #[test]
    fn remove_outliers_keys() {
        let layout = layout();
        let cfg = ControlFileBuilder::new(&layout).remove_outliers(&Station::from_stem("ALIC_0"));
        let pairs = round_trip(&cfg);
        assert_eq!(value(&pairs, "DataFile"), Some("ALIC_0.mom"));
        assert_eq!(value(&pairs, "DataDirectory"), Some("/runs/demo/obs_files"));
        assert_eq!(value(&pairs, "OutputFile"), Some("/runs/demo/pre_files/ALIC_0.mom"));
        assert_eq!(value(&pairs, "IQ_factor"), Some("3"));
        assert_eq!(value(&pairs, "JSON"), Some("yes"));
        assert_eq!(value(&pairs, "estimateslowslipevent"), Some("yes"));
        assert!(value(&pairs, "NoiseModels").is_none());
    }

    #[test]
    fn power_law_with_white_noise_pins_one_minus_phi() {
        let layout = layout();
        let trend = ControlFileBuilder::new(&layout)
            .estimate_trend(&Station::from_stem("ALIC_0"), &models("PLWN"));
        let pairs = round_trip(&trend.config);
        assert_eq!(value(&pairs, "NoiseModels"), Some("GGM White"));
        assert_eq!(value(&pairs, "GGM_1mphi"), Some("6.9e-6"));
        assert_eq!(value(&pairs, "DataDirectory"), Some("/runs/demo/pre_files"));
        assert!(value(&pairs, "kappa_fixed").is_none());
        assert!(value(&pairs, "AR_p").is_none());
        assert!(value(&pairs, "phi_varying_fixed").is_none());
        assert_eq!(trend.policies.one_minus_phi, ParameterPolicy::Fixed(6.9e-6));
        assert!(trend.policies.kappa.is_free());
    }

    #[test]
    fn flicker_compatible_ggm_overrides_default() {
        let layout = layout();
        let trend = ControlFileBuilder::new(&layout)
            .estimate_trend(&Station::from_stem("ALIC_0"), &models("fGGMFN"));
        let pairs = round_trip(&trend.config);
        assert_eq!(value(&pairs, "NoiseModels"), Some("GGM FlickerGGM"));
        assert_eq!(value(&pairs, "GGM_1mphi"), Some("2e-2"));
        assert_eq!(value(&pairs, "kappa_fixed"), Some("-1.0"));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "GGM_1mphi").count(), 1);
        assert_eq!(trend.policies.kappa, ParameterPolicy::Fixed(-1.0));
    }

    #[test]
    fn ar1_and_varying_seasonal_keys() {
        let layout = layout();
        let trend = ControlFileBuilder::new(&layout)
            .estimate_trend(&Station::from_stem("ALIC_0"), &models("WNAR1VA"));
        let pairs = round_trip(&trend.config);
        assert_eq!(value(&pairs, "NoiseModels"), Some("White ARMA VaryingAnnual"));
        assert_eq!(value(&pairs, "AR_p"), Some("1"));
        assert_eq!(value(&pairs, "MA_q"), Some("0"));
        assert_eq!(value(&pairs, "phi_varying_fixed"), Some("0.9999"));
        assert!(value(&pairs, "GGM_1mphi").is_none());
        assert_eq!(trend.policies, ParameterPolicies::default());
    }

    #[test]
    fn estimate_spectrum_has_no_model_content() {
        let layout = layout();
        let cfg = ControlFileBuilder::new(&layout).estimate_spectrum(&Station::from_stem("ALIC_0"));
        let pairs = round_trip(&cfg);
        assert_eq!(value(&pairs, "WindowFunction"), Some("Hann"));
        assert_eq!(value(&pairs, "DataDirectory"), Some("/runs/demo/mom_files"));
        assert!(value(&pairs, "NoiseModels").is_none());
        assert!(cfg.answers().is_empty());
    }

    #[test]
    fn model_spectrum_answers_follow_the_policies() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let station = Station::from_stem("ALIC_0");
        let trend = builder.estimate_trend(&station, &models("PLWN"));
        let result = read_result(json!({
            "driving_noise": 1.25,
            "NoiseModel": {
                "GGM": { "fraction": 0.7, "d": 0.41, "1-phi": 6.9e-6 },
                "White": { "fraction": 0.3 }
            }
        }))
        .unwrap();

        let cfg = builder
            .model_spectrum(&station, &result, &trend.policies, &bounds(), 1.0, 99)
            .unwrap();
        let pairs = round_trip(&cfg);
        assert_eq!(value(&pairs, "NoiseModels"), Some("GGM White"));
        assert_eq!(value(&pairs, "GGM_1mphi"), Some("6.9e-6"));
        assert_eq!(value(&pairs, "NumberOfPoints"), Some("99"));
        assert_eq!(value(&pairs, "SamplingPeriod"), Some("1.0"));
        assert_eq!(value(&pairs, "NumberOfSimulations"), Some("5000"));
        assert_eq!(
            cfg.answers(),
            ["1.250000", "24.000000", "0.700000", "0.300000", "0.410000", "2", "1.5e-8 5.787e-6"]
        );
    }

    #[test]
    fn free_ggm_answers_d_and_one_minus_phi() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let result = read_result(json!({
            "driving_noise": 2.0,
            "NoiseModel": { "GGM": { "fraction": 1.0, "d": 0.5, "1-phi": 0.01 } }
        }))
        .unwrap();
        let cfg = builder
            .model_spectrum(
                &Station::from_stem("ALIC_0"),
                &result,
                &ParameterPolicies::default(),
                &bounds(),
                1.0,
                10,
            )
            .unwrap();
        assert_eq!(&cfg.answers()[3..5], ["0.500000", "0.010000"]);
        assert!(!cfg.contains("GGM_1mphi"));
    }

    #[test]
    fn flicker_compatible_ggm_answers_nothing_for_ggm() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let station = Station::from_stem("ALIC_0");
        let trend = builder.estimate_trend(&station, &models("fGGMWN"));
        let result = read_result(json!({
            "driving_noise": 2.0,
            "NoiseModel": {
                "GGM": { "fraction": 0.6, "d": 0.5, "1-phi": 0.02 },
                "White": { "fraction": 0.4 }
            }
        }))
        .unwrap();
        let cfg = builder
            .model_spectrum(&station, &result, &trend.policies, &bounds(), 1.0, 10)
            .unwrap();
        assert_eq!(
            cfg.answers(),
            ["2.000000", "24.000000", "0.600000", "0.400000", "2", "1.5e-8 5.787e-6"]
        );
        assert_eq!(cfg.get("kappa_fixed"), Some(&ConfigValue::Float(-1.0)));
    }

    #[test]
    fn seasonal_arma_and_matern_answers_in_document_order() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let result = read_result(json!({
            "driving_noise": 1.5,
            "NoiseModel": {
                "White": { "fraction": 0.4 },
                "VaryingAnnual": { "fraction": 0.2, "phi": 0.95 },
                "ARMA": { "fraction": 0.1, "AR": [0.35] },
                "Matern": { "fraction": 0.3, "d": 0.6, "lambda": 5e-4 }
            }
        }))
        .unwrap();
        let cfg = builder
            .model_spectrum(
                &Station::from_stem("ALIC_0"),
                &result,
                &ParameterPolicies::default(),
                &bounds(),
                1.0,
                10,
            )
            .unwrap();
        assert_eq!(
            cfg.answers(),
            [
                "1.500000", "24.000000", "0.400000", "0.200000", "0.100000", "0.300000", "0.950000",
                "0.350000", "0.600000", "5e-4", "2", "1.5e-8 5.787e-6"
            ]
        );
        assert_eq!(
            round_trip(&cfg).iter().find(|(k, _)| k == "NoiseModels").map(|(_, v)| v.as_str()),
            Some("White VaryingAnnual ARMA Matern")
        );
    }

    #[test]
    fn pinned_matern_lambda_is_not_answered() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let result = read_result(json!({
            "driving_noise": 1.0,
            "NoiseModel": { "Matern": { "fraction": 1.0, "d": 0.6, "lambda": 0.01 } }
        }))
        .unwrap();
        let policies = ParameterPolicies {
            lambda: ParameterPolicy::Fixed(0.01),
            ..ParameterPolicies::default()
        };
        let cfg = builder
            .model_spectrum(&Station::from_stem("ALIC_0"), &result, &policies, &bounds(), 1.0, 10)
            .unwrap();
        assert_eq!(
            cfg.answers(),
            ["1.000000", "24.000000", "1.000000", "0.600000", "2", "1.5e-8 5.787e-6"]
        );
        assert_eq!(cfg.get("lambda_fixed"), Some(&ConfigValue::Scientific(0.01)));
        assert!(!cfg.contains("kappa_fixed"));
    }

    #[test]
    fn missing_parameter_in_trend_result_is_malformed() {
        let layout = layout();
        let builder = ControlFileBuilder::new(&layout);
        let result = read_result(json!({
            "driving_noise": 2.0,
            "NoiseModel": { "Matern": { "fraction": 1.0, "d": 0.5 } }
        }))
        .unwrap();
        let err = builder
            .model_spectrum(
                &Station::from_stem("ALIC_0"),
                &result,
                &ParameterPolicies::default(),
                &bounds(),
                1.0,
                10,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResult { .. }));
    }

    #[test]
    fn detect_offsets_in_three_dimensions() {
        let layout = layout();
        let stations: Vec<Station> = crate::domain::Component::ALL
            .iter()
            .map(|&c| Station::for_component("ALIC", c))
            .collect();
        let cfg = ControlFileBuilder::new(&layout).detect_offsets(
            &stations,
            &models("PLWN"),
            8.0,
            true,
            Path::new("/runs/demo/work/ALIC"),
        );
        let pairs = round_trip(&cfg);
        assert_eq!(value(&pairs, "DataFile"), Some("ALIC_0.mom ALIC_1.mom ALIC_2.mom"));
        assert_eq!(value(&pairs, "DataDirectory"), Some("/runs/demo/raw_files"));
        assert_eq!(value(&pairs, "NoiseModels"), Some("GGM White"));
        assert_eq!(value(&pairs, "GGM_1mphi"), Some("6.9e-6"));
        assert_eq!(value(&pairs, "ExtraPenalty"), Some("8.0"));
        assert_eq!(value(&pairs, "Use3D"), Some("yes"));
    }
}
