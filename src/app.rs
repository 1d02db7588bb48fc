//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging
//! - parses CLI arguments
//! - builds the pipeline configuration
//! - runs the station pipeline and prints the summary

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyseArgs, Cli, Command, OffsetsArgs, RunArgs};
use crate::domain::{PipelineConfig, RunPlan};
use crate::error::{AppError, EXIT_INPUT, EXIT_RUNTIME};
use crate::io::{RunLayout, tenv3};
use crate::models::NoiseModelSet;
use crate::stages::{EngineConfig, EngineRunner, ProcessRunner};

pub mod pipeline;

use pipeline::{Pipeline, RunSummary};

/// Entry point for the `geonoise` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();
    let jobs = usize::from(cli.jobs);

    match cli.command {
        Command::Analyse(args) => handle_analyse(cli.root, jobs, args),
        Command::Run(args) => handle_run(cli.root, jobs, args),
        Command::Offsets(args) => handle_offsets(cli.root, jobs, args),
        Command::Convert => handle_convert(cli.root),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_analyse(root: PathBuf, jobs: usize, args: AnalyseArgs) -> Result<(), AppError> {
    let config = PipelineConfig {
        root,
        plan: RunPlan::Analyse,
        noise_models: Some(args.models),
        detection_models: default_detection_models()?,
        station: Some(args.station),
        from_raw: false,
        penalty: crate::cli::DEFAULT_PENALTY,
        use_3d: false,
        jobs,
        engine: EngineConfig::from_env(),
    };
    let summary = execute(&config, &ProcessRunner)?;
    for outcome in &summary.outcomes {
        if let Some(trend) = &outcome.trend {
            println!("{}", outcome.station);
            println!("{}", crate::report::format_trend(trend));
        }
    }
    finish(summary, true)
}

fn handle_run(root: PathBuf, jobs: usize, args: RunArgs) -> Result<(), AppError> {
    let single = args.station.is_some() && !(args.from_raw && args.three_d);
    let config = PipelineConfig {
        root,
        plan: RunPlan::Full,
        noise_models: Some(args.models),
        detection_models: args.detection_models,
        station: args.station,
        from_raw: args.from_raw,
        penalty: args.penalty,
        use_3d: args.three_d,
        jobs,
        engine: EngineConfig::from_env(),
    };
    let summary = execute(&config, &ProcessRunner)?;
    finish(summary, single)
}

fn handle_offsets(root: PathBuf, jobs: usize, args: OffsetsArgs) -> Result<(), AppError> {
    let (penalty, use_3d) = args.resolve().map_err(|msg| AppError::new(EXIT_INPUT, msg))?;
    let config = PipelineConfig {
        root,
        plan: RunPlan::Curate,
        noise_models: None,
        detection_models: args.detection_models,
        station: None,
        from_raw: true,
        penalty,
        use_3d,
        jobs,
        engine: EngineConfig::from_env(),
    };
    let summary = execute(&config, &ProcessRunner)?;
    finish(summary, false)
}

fn handle_convert(root: PathBuf) -> Result<(), AppError> {
    let layout = RunLayout::new(&root)?;
    let written = tenv3::convert_directory(&layout.ori_dir(), &layout.raw_dir())?;
    println!("Wrote {} observation files to {}", written.len(), layout.raw_dir().display());
    Ok(())
}

/// Run the pipeline for a configuration.
pub fn execute(config: &PipelineConfig, runner: &dyn EngineRunner) -> Result<RunSummary, AppError> {
    let pipeline = Pipeline::new(config, runner)?;
    info!(root = %pipeline.layout().root().display(), plan = ?config.plan, "starting run");
    Ok(pipeline.run()?)
}

/// Print the summary and turn station failures into an exit status.
///
/// A single-station run fails with that station's error. A batch with
/// failures exits non-zero only when stdin is not a terminal.
fn finish(summary: RunSummary, single_station: bool) -> Result<(), AppError> {
    println!("{}", crate::report::format_run_summary(&summary));

    let failed = summary.failures().count();
    let total = summary.outcomes.len();
    if failed == 0 {
        return Ok(());
    }
    if single_station {
        if let Some(err) = summary.outcomes.into_iter().find_map(|o| o.error) {
            return Err(err.into());
        }
    }
    if !std::io::stdin().is_terminal() {
        return Err(AppError::new(
            EXIT_RUNTIME,
            format!("{failed} of {total} stations failed"),
        ));
    }
    Ok(())
}

fn default_detection_models() -> Result<NoiseModelSet, AppError> {
    Ok(NoiseModelSet::parse("PLWN")?)
}
