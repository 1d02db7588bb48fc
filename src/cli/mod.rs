//! Command-line parsing for the noise-analysis pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! orchestration code. Noise-model abbreviations are validated here, so a
//! bad abbreviation is a usage error before any engine runs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::NoiseModelSet;

/// Offset-finder penalty used when none is given.
pub const DEFAULT_PENALTY: f64 = 8.0;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "geonoise", version, about = "GNSS time-series noise analysis pipeline")]
pub struct Cli {
    /// Run root holding ori_files/, raw_files/, obs_files/ and the outputs.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Stations processed in parallel (1 = sequential).
    #[arg(short = 'j', long, global = true, default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remove outliers and estimate the trend of one station.
    Analyse(AnalyseArgs),
    /// Run the full chain (through the figures) and write aggregated reports.
    Run(RunArgs),
    /// Curate raw series: gap check, then offset detection or pass-through copy.
    Offsets(OffsetsArgs),
    /// Convert ori_files/*.tenv3 into per-component observation files.
    Convert,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyseArgs {
    /// Station id, the observation file stem (e.g. ALIC_0).
    pub station: String,

    /// Noise models as one abbreviation string (e.g. PLWN, fGGMWN, GGMAR1).
    pub models: NoiseModelSet,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Noise models as one abbreviation string (e.g. PLWN).
    pub models: NoiseModelSet,

    /// Only this station (or marker, with --from-raw --3d).
    pub station: Option<String>,

    /// Curate raw_files/ first instead of starting from obs_files/.
    #[arg(long)]
    pub from_raw: bool,

    /// Extra penalty for the offset finder.
    #[arg(long, default_value_t = DEFAULT_PENALTY)]
    pub penalty: f64,

    /// Detect offsets on all three components of a marker at once.
    #[arg(long = "3d")]
    pub three_d: bool,

    /// Noise models used by the offset finder.
    #[arg(long, default_value = "PLWN")]
    pub detection_models: NoiseModelSet,
}

#[derive(Debug, Args, Clone)]
pub struct OffsetsArgs {
    /// `[PENALTY] [3D]`: an optional penalty and/or the literal `3D`.
    #[arg(num_args = 0..=2, allow_negative_numbers = true)]
    pub positionals: Vec<String>,

    /// Noise models used by the offset finder.
    #[arg(long, default_value = "PLWN")]
    pub detection_models: NoiseModelSet,
}

impl OffsetsArgs {
    /// Resolve the positionals into `(penalty, use_3d)`.
    pub fn resolve(&self) -> Result<(f64, bool), String> {
        let penalty = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| format!("invalid penalty '{s}'; usage: geonoise offsets [PENALTY] [3D]"))
        };
        match self.positionals.as_slice() {
            [] => Ok((DEFAULT_PENALTY, false)),
            [only] if only == "3D" => Ok((DEFAULT_PENALTY, true)),
            [only] => Ok((penalty(only)?, false)),
            [first, second] if second == "3D" => Ok((penalty(first)?, true)),
            [_, second] => Err(format!(
                "second argument must be '3D', got '{second}'; usage: geonoise offsets [PENALTY] [3D]"
            )),
            _ => Err("usage: geonoise offsets [PENALTY] [3D]".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(args: &[&str]) -> Result<(f64, bool), String> {
        let mut argv = vec!["geonoise", "offsets"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).map_err(|e| e.to_string())?.command {
            Command::Offsets(args) => args.resolve(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn offsets_positionals() {
        assert_eq!(offsets(&[]), Ok((8.0, false)));
        assert_eq!(offsets(&["3D"]), Ok((8.0, true)));
        assert_eq!(offsets(&["12.5"]), Ok((12.5, false)));
        assert_eq!(offsets(&["12.5", "3D"]), Ok((12.5, true)));
        assert!(offsets(&["12.5", "2D"]).is_err());
        assert!(offsets(&["high"]).is_err());
    }

    #[test]
    fn bad_abbreviation_is_a_usage_error() {
        let err = Cli::try_parse_from(["geonoise", "analyse", "ALIC_0", "PLXX"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn run_with_global_options() {
        let cli = Cli::try_parse_from(["geonoise", "run", "PLWN", "--from-raw", "--3d", "--root", "/data", "-j", "4"])
            .unwrap();
        assert_eq!(cli.jobs, 4);
        assert_eq!(cli.root, PathBuf::from("/data"));
        match cli.command {
            Command::Run(args) => {
                assert!(args.from_raw && args.three_d);
                assert_eq!(args.models.to_string(), "PLWN");
                assert_eq!(args.station, None);
                assert_eq!(args.penalty, 8.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(Cli::try_parse_from(["geonoise", "-j", "0", "convert"]).is_err());
    }
}
