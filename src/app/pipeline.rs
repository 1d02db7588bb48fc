//! Station pipeline shared by every front-end command.
//!
//! Per station the run moves through a fixed sequence of engine stages:
//!
//! curate (gap check, offsets or pass-through) -> remove outliers ->
//! estimate trend -> estimate spectrum -> model spectrum -> plot
//!
//! Stations are independent. They run on a bounded worker pool, each in its
//! own workspace, and a failing station never stops the others. Reports are
//! assembled afterwards on the calling thread, in station order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::data::{GapAssessment, GapDecision, assess_series};
use crate::domain::{Component, PipelineConfig, RunPlan, Stage, StageConfig, Station};
use crate::error::PipelineError;
use crate::io::{
    HeaderPolicy, RunLayout, copy_file, create_dir, discover_stations, load_series, render_answers,
    write_control,
};
use crate::models::NoiseModelSet;
use crate::plot::{data_script, psd_script};
use crate::report::{ResultAggregator, StageResult, read_document_file, read_result_file};
use crate::stages::control::SPECTRUM_SEGMENTS;
use crate::stages::{ControlFileBuilder, EngineOutput, EngineRunner, Invocation, parse_spectrum_bounds};

/// Epoch list left by the offset finder in its workspace.
pub const OFFSET_EPOCHS_FILE: &str = "findoffset_BIC_c.dat";

/// Where a station is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    Start,
    GapTooLarge,
    PassThroughCopied,
    OffsetsDetected,
    OutliersRemoved,
    TrendEstimated,
    SpectrumEstimated,
    SpectrumModeled,
    Plotted,
    Done,
}

impl StationState {
    pub fn label(self) -> &'static str {
        match self {
            StationState::Start => "start",
            StationState::GapTooLarge => "gap too large",
            StationState::PassThroughCopied => "passed through",
            StationState::OffsetsDetected => "offsets detected",
            StationState::OutliersRemoved => "outliers removed",
            StationState::TrendEstimated => "trend estimated",
            StationState::SpectrumEstimated => "spectrum estimated",
            StationState::SpectrumModeled => "spectrum modelled",
            StationState::Plotted => "plotted",
            StationState::Done => "done",
        }
    }
}

/// Everything one station produced, including how far it got.
#[derive(Debug)]
pub struct StationOutcome {
    pub station: Station,
    /// States in the order they were reached, starting with `Start`.
    pub trace: Vec<StationState>,
    pub assessment: Option<GapAssessment>,
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    pub outliers: Option<Value>,
    pub trend: Option<StageResult>,
    pub error: Option<PipelineError>,
}

impl StationOutcome {
    fn new(station: Station) -> Self {
        Self {
            station,
            trace: vec![StationState::Start],
            assessment: None,
            date_span: None,
            outliers: None,
            trend: None,
            error: None,
        }
    }

    fn advance(&mut self, state: StationState) {
        self.trace.push(state);
    }

    /// Last state reached.
    pub fn state(&self) -> StationState {
        self.trace.last().copied().unwrap_or(StationState::Start)
    }

    pub fn is_done(&self) -> bool {
        self.error.is_none() && self.state() == StationState::Done
    }
}

/// Result of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    pub plan: RunPlan,
    pub outcomes: Vec<StationOutcome>,
    /// Lines written to the run's offset log.
    pub offsets_logged: usize,
    /// Aggregated reports written at the end of the run.
    pub reports: Vec<PathBuf>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &StationOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_done()).count()
    }
}

/// One raw series, or the three components of a marker in 3D mode.
#[derive(Debug, Clone)]
struct CurationTarget {
    name: String,
    stations: Vec<Station>,
}

/// Offset epochs found for one curation target.
#[derive(Debug, Clone)]
struct CurationRecord {
    target: String,
    epochs: Vec<String>,
}

enum Curated {
    PassedThrough,
    OffsetsDetected(CurationRecord),
}

/// A curation error and the index of the component it belongs to.
/// Target-wide failures belong to the first component.
struct CurationFailure {
    component: usize,
    error: PipelineError,
}

impl From<PipelineError> for CurationFailure {
    fn from(error: PipelineError) -> Self {
        Self { component: 0, error }
    }
}

/// Drives stations through the engine stages.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    layout: RunLayout,
    runner: &'a dyn EngineRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, runner: &'a dyn EngineRunner) -> Result<Self, PipelineError> {
        if config.plan != RunPlan::Curate && config.noise_models.is_none() {
            return Err(PipelineError::InvalidAbbreviation {
                substring: String::new(),
            });
        }
        Ok(Self {
            config,
            layout: RunLayout::new(&config.root)?,
            runner,
        })
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let curating = self.config.plan == RunPlan::Curate || self.config.from_raw;
        if self.config.plan != RunPlan::Curate {
            self.layout.prepare_analysis()?;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.max(1))
            .build()
            .map_err(|e| PipelineError::io("failed to start station workers", std::io::Error::other(e)))?;

        let results: Vec<(Vec<StationOutcome>, Option<CurationRecord>)> = if curating {
            let targets = self.curation_targets()?;
            create_dir(&self.layout.obs_dir())?;
            info!(targets = targets.len(), jobs = self.config.jobs, "curating raw series");
            pool.install(|| targets.par_iter().map(|t| self.process_target(t)).collect())
        } else {
            let stations = self.analysis_stations()?;
            info!(stations = stations.len(), jobs = self.config.jobs, "analysing stations");
            pool.install(|| {
                stations
                    .par_iter()
                    .map(|s| (vec![self.process_station(StationOutcome::new(s.clone()))], None))
                    .collect()
            })
        };

        let mut outcomes = Vec::new();
        let mut records = Vec::new();
        for (station_outcomes, record) in results {
            outcomes.extend(station_outcomes);
            records.extend(record);
        }

        let offsets_logged = if curating {
            self.write_offsets_log(&records)?
        } else {
            0
        };
        let reports = if self.config.plan == RunPlan::Full {
            self.write_reports(&outcomes)?
        } else {
            Vec::new()
        };

        Ok(RunSummary {
            plan: self.config.plan,
            outcomes,
            offsets_logged,
            reports,
        })
    }

    fn curation_targets(&self) -> Result<Vec<CurationTarget>, PipelineError> {
        let raw = self.layout.raw_dir();
        let wanted = self.config.station.as_deref();

        let targets: Vec<CurationTarget> = if self.config.use_3d {
            discover_stations(&raw, "_0.mom")?
                .into_iter()
                .filter(|m| wanted.is_none_or(|w| w == m.id()))
                .map(|m| CurationTarget {
                    name: m.id().to_string(),
                    stations: Component::ALL
                        .iter()
                        .map(|&c| Station::for_component(m.id(), c))
                        .collect(),
                })
                .collect()
        } else {
            discover_stations(&raw, ".mom")?
                .into_iter()
                .filter(|s| wanted.is_none_or(|w| w == s.id()))
                .map(|s| CurationTarget {
                    name: s.id().to_string(),
                    stations: vec![s],
                })
                .collect()
        };

        if targets.is_empty() {
            let path = match wanted {
                Some(name) if self.config.use_3d => raw.join(format!("{name}_0.mom")),
                Some(name) => raw.join(format!("{name}.mom")),
                None => raw.join("*.mom"),
            };
            return Err(PipelineError::MissingInput { path });
        }
        Ok(targets)
    }

    fn analysis_stations(&self) -> Result<Vec<Station>, PipelineError> {
        if let Some(id) = &self.config.station {
            return Ok(vec![Station::from_stem(id)]);
        }
        let obs = self.layout.obs_dir();
        let stations = discover_stations(&obs, ".mom")?;
        if stations.is_empty() {
            return Err(PipelineError::MissingInput {
                path: obs.join("*.mom"),
            });
        }
        Ok(stations)
    }

    fn process_target(&self, target: &CurationTarget) -> (Vec<StationOutcome>, Option<CurationRecord>) {
        let mut outcomes: Vec<StationOutcome> = target.stations.iter().cloned().map(StationOutcome::new).collect();

        match self.curate(target, &mut outcomes) {
            Ok(Curated::PassedThrough) => (outcomes, None),
            Ok(Curated::OffsetsDetected(record)) => {
                let outcomes = if self.config.plan == RunPlan::Curate {
                    outcomes
                        .into_iter()
                        .map(|mut o| {
                            o.advance(StationState::Done);
                            o
                        })
                        .collect()
                } else {
                    outcomes.into_iter().map(|o| self.process_station(o)).collect()
                };
                (outcomes, Some(record))
            }
            Err(CurationFailure { component, error: err }) => {
                error!(series = %target.name, "curation failed: {err}");
                for (i, outcome) in outcomes.iter_mut().enumerate() {
                    if i == component || outcome.is_done() {
                        continue;
                    }
                    outcome.error = Some(PipelineError::StageFailed {
                        stage: Stage::DetectOffsets,
                        station: outcome.station.id().to_string(),
                        message: format!("curation of {} failed: {err}", target.name),
                    });
                }
                if let Some(failed) = outcomes.get_mut(component) {
                    failed.error = Some(err);
                }
                (outcomes, None)
            }
        }
    }

    fn curate(&self, target: &CurationTarget, outcomes: &mut [StationOutcome]) -> Result<Curated, CurationFailure> {
        let raw = self.layout.raw_dir();
        let obs = self.layout.obs_dir();

        let first = target.stations.first().ok_or_else(|| PipelineError::MissingInput {
            path: raw.join(format!("{}.mom", target.name)),
        })?;
        let ingested = load_series(&raw.join(first.file_name()), first, HeaderPolicy::DefaultDaily)?;
        if !ingested.header_found {
            warn!(series = %target.name, "no sampling period header, assuming daily observations");
        }

        let assessment = assess_series(&ingested.series);
        match assessment.missing_percentage() {
            Some(pct) => info!(series = %target.name, "{pct:6.2}% missing"),
            None => warn!(series = %target.name, "series too short to measure gaps"),
        }
        let date_span = ingested.series.date_span();
        for outcome in outcomes.iter_mut() {
            outcome.assessment = Some(assessment);
            outcome.date_span = date_span;
        }

        match assessment.decision() {
            GapDecision::PassThrough => {
                for (component, outcome) in outcomes.iter_mut().enumerate() {
                    outcome.advance(StationState::GapTooLarge);
                    let name = outcome.station.file_name();
                    copy_file(&raw.join(&name), &obs.join(&name))
                        .map_err(|error| CurationFailure { component, error })?;
                    outcome.advance(StationState::PassThroughCopied);
                    outcome.advance(StationState::Done);
                }
                Ok(Curated::PassedThrough)
            }
            GapDecision::DetectOffsets => {
                let workspace = self.layout.station_workspace(&target.name)?;
                let cfg = ControlFileBuilder::new(&self.layout).detect_offsets(
                    &target.stations,
                    &self.config.detection_models,
                    self.config.penalty,
                    self.config.use_3d,
                    &workspace,
                );
                self.run_stage(&target.name, &workspace, &cfg, Vec::new())?;

                let epochs = read_offset_epochs(&workspace.join(OFFSET_EPOCHS_FILE))
                    .map_err(|e| e.into_stage_failure(Stage::DetectOffsets, &target.name))?;
                info!(series = %target.name, offsets = epochs.len(), "offsets detected");

                for (component, outcome) in outcomes.iter_mut().enumerate() {
                    outcome.advance(StationState::OffsetsDetected);
                    let name = outcome.station.file_name();
                    let produced = workspace.join(&name);
                    if !produced.is_file() {
                        return Err(CurationFailure {
                            component,
                            error: PipelineError::StageFailed {
                                stage: Stage::DetectOffsets,
                                station: outcome.station.id().to_string(),
                                message: format!("engine did not write {}", produced.display()),
                            },
                        });
                    }
                    copy_file(&produced, &obs.join(&name)).map_err(|error| CurationFailure { component, error })?;
                }

                Ok(Curated::OffsetsDetected(CurationRecord {
                    target: target.name.clone(),
                    epochs,
                }))
            }
        }
    }

    fn process_station(&self, mut outcome: StationOutcome) -> StationOutcome {
        let station = outcome.station.clone();
        if let Err(err) = self.analyse(&station, &mut outcome) {
            error!(station = %station, state = outcome.state().label(), "{err}");
            outcome.error = Some(err);
        }
        outcome
    }

    fn analyse(&self, station: &Station, outcome: &mut StationOutcome) -> Result<(), PipelineError> {
        let models: &NoiseModelSet =
            self.config
                .noise_models
                .as_ref()
                .ok_or_else(|| PipelineError::InvalidAbbreviation {
                    substring: String::new(),
                })?;

        let path = self.layout.obs_dir().join(station.file_name());
        let ingested = load_series(&path, station, HeaderPolicy::Required)?;
        for row in &ingested.row_errors {
            warn!(station = %station, line = row.line, "skipped row: {}", row.message);
        }
        let series = ingested.series;
        let assessment = assess_series(&series);
        outcome.assessment.get_or_insert(assessment);
        outcome.date_span = series.date_span();
        let Some(number_of_points) = assessment.span_count() else {
            return Err(PipelineError::InsufficientData { path });
        };

        let workspace = self.layout.station_workspace(station.id())?;
        let builder = ControlFileBuilder::new(&self.layout);

        let cfg = builder.remove_outliers(station);
        self.run_stage(station.id(), &workspace, &cfg, Vec::new())?;
        let outliers = read_document_file(&workspace.join(Stage::RemoveOutliers.json_file_name()))
            .map_err(|e| e.into_stage_failure(Stage::RemoveOutliers, station.id()))?;
        outcome.outliers = Some(outliers);
        outcome.advance(StationState::OutliersRemoved);

        let trend_cfg = builder.estimate_trend(station, models);
        self.run_stage(station.id(), &workspace, &trend_cfg.config, Vec::new())?;
        let trend = read_result_file(&workspace.join(Stage::EstimateTrend.json_file_name()))
            .map_err(|e| e.into_stage_failure(Stage::EstimateTrend, station.id()))?;
        info!(
            station = %station,
            driving_noise = trend.driving_noise,
            models = ?trend.model_names().collect::<Vec<_>>(),
            "trend estimated"
        );
        outcome.trend = Some(trend.clone());
        outcome.advance(StationState::TrendEstimated);

        if self.config.plan == RunPlan::Analyse {
            outcome.advance(StationState::Done);
            return Ok(());
        }

        let cfg = builder.estimate_spectrum(station);
        let output = self.run_stage(station.id(), &workspace, &cfg, vec![SPECTRUM_SEGMENTS.to_string()])?;
        let bounds = parse_spectrum_bounds(&output.stdout)
            .map_err(|e| e.into_stage_failure(Stage::EstimateSpectrum, station.id()))?;
        outcome.advance(StationState::SpectrumEstimated);

        let cfg = builder
            .model_spectrum(
                station,
                &trend,
                &trend_cfg.policies,
                &bounds,
                series.sampling_period,
                number_of_points,
            )
            .map_err(|e| e.into_stage_failure(Stage::ModelSpectrum, station.id()))?;
        self.run_stage(station.id(), &workspace, &cfg, Vec::new())?;
        outcome.advance(StationState::SpectrumModeled);

        self.plot(station, &workspace)?;
        outcome.advance(StationState::Plotted);
        outcome.advance(StationState::Done);
        Ok(())
    }

    /// Write the stage's control file into the workspace and run its engine there.
    fn run_stage(
        &self,
        name: &str,
        workspace: &Path,
        cfg: &StageConfig,
        args: Vec<String>,
    ) -> Result<EngineOutput, PipelineError> {
        write_control(workspace, cfg)?;
        let program = self
            .config
            .engine
            .program_for(cfg.stage)
            .unwrap_or_else(|| cfg.stage.label());
        let stdin = (!cfg.answers().is_empty()).then(|| render_answers(cfg));
        self.runner.invoke(&Invocation {
            stage: cfg.stage,
            station: name,
            workdir: workspace,
            program,
            args,
            stdin,
        })
    }

    fn plot(&self, station: &Station, workspace: &Path) -> Result<(), PipelineError> {
        let engine = &self.config.engine;
        for script in [psd_script(station, &self.layout), data_script(station, &self.layout)] {
            let path = workspace.join(script.file_name);
            fs::write(&path, &script.text)
                .map_err(|e| PipelineError::io(format!("failed to write {}", path.display()), e))?;
            self.run_tool(station, workspace, &engine.renderer, vec![script.file_name.to_string()])?;
            if engine.convert_images {
                self.run_tool(station, workspace, &engine.psconvert, script.psconvert_args())?;
                self.run_tool(station, workspace, &engine.image_convert, script.image_convert_args())?;
            }
        }
        Ok(())
    }

    fn run_tool(&self, station: &Station, workspace: &Path, program: &str, args: Vec<String>) -> Result<(), PipelineError> {
        self.runner
            .invoke(&Invocation {
                stage: Stage::Plot,
                station: station.id(),
                workdir: workspace,
                program,
                args,
                stdin: None,
            })
            .map(|_| ())
    }

    /// Rewrite the run's offset log: `<target> <epoch line>` per detected offset.
    fn write_offsets_log(&self, records: &[CurationRecord]) -> Result<usize, PipelineError> {
        let mut text = String::new();
        let mut count = 0;
        for record in records {
            for line in &record.epochs {
                text.push_str(&format!("{:<12}  {line}\n", record.target));
                count += 1;
            }
        }
        let path = self.layout.offsets_log_path();
        fs::write(&path, text).map_err(|e| PipelineError::io(format!("failed to write {}", path.display()), e))?;
        Ok(count)
    }

    fn write_reports(&self, outcomes: &[StationOutcome]) -> Result<Vec<PathBuf>, PipelineError> {
        let mut trends = ResultAggregator::begin();
        let mut outliers = ResultAggregator::begin();

        for outcome in outcomes.iter().filter(|o| o.is_done()) {
            let (Some(trend), Some(removed)) = (&outcome.trend, &outcome.outliers) else {
                continue;
            };
            for appended in [
                trends.append(&outcome.station, trend),
                outliers.append(&outcome.station, removed),
            ] {
                if let Err(err) = appended {
                    match err {
                        PipelineError::DuplicateStation { .. } => warn!("{err}"),
                        other => return Err(other),
                    }
                }
            }
        }

        let trend_path = self.layout.trend_report_path();
        let outliers_path = self.layout.outliers_report_path();
        trends.finish()?.write_json(&trend_path)?;
        outliers.finish()?.write_json(&outliers_path)?;
        info!(path = %trend_path.display(), "wrote trend report");
        Ok(vec![trend_path, outliers_path])
    }
}

fn read_offset_epochs(path: &Path) -> Result<Vec<String>, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::MalformedResult {
            message: format!("engine did not write {}", path.display()),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(format!("failed to read {}", path.display()), e))?;
    Ok(text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}
