//! External engine invocation.
//!
//! The numerical work is done by external programs. Each call is blocking,
//! runs inside the station's workspace and succeeds only on exit status 0.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::domain::Stage;
use crate::error::PipelineError;

/// Program names for every external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub find_offset: String,
    pub remove_outliers: String,
    pub estimate_trend: String,
    pub estimate_spectrum: String,
    pub model_spectrum: String,
    /// Plot renderer, called with a script file name.
    pub renderer: String,
    /// PostScript → EPS converter (`gmt psconvert`).
    pub psconvert: String,
    /// EPS → PNG converter (ImageMagick `convert`).
    pub image_convert: String,
    pub convert_images: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            find_offset: "findoffset".to_string(),
            remove_outliers: "removeoutliers".to_string(),
            estimate_trend: "estimatetrend".to_string(),
            estimate_spectrum: "estimatespectrum".to_string(),
            model_spectrum: "modelspectrum".to_string(),
            renderer: "gnuplot".to_string(),
            psconvert: "gmt".to_string(),
            image_convert: "convert".to_string(),
            convert_images: true,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `GEONOISE_*` variables (a `.env` file is honoured).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let overrides: [(&str, &mut String); 8] = [
            ("GEONOISE_FINDOFFSET", &mut config.find_offset),
            ("GEONOISE_REMOVEOUTLIERS", &mut config.remove_outliers),
            ("GEONOISE_ESTIMATETREND", &mut config.estimate_trend),
            ("GEONOISE_ESTIMATESPECTRUM", &mut config.estimate_spectrum),
            ("GEONOISE_MODELSPECTRUM", &mut config.model_spectrum),
            ("GEONOISE_RENDERER", &mut config.renderer),
            ("GEONOISE_PSCONVERT", &mut config.psconvert),
            ("GEONOISE_IMAGE_CONVERT", &mut config.image_convert),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
        if let Some(value) = lookup("GEONOISE_CONVERT_IMAGES") {
            config.convert_images = !matches!(value.trim(), "0" | "no" | "false" | "off");
        }
        config
    }

    /// Program that runs an engine stage (`None` for the plot stage, which
    /// runs several tools).
    pub fn program_for(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::DetectOffsets => Some(&self.find_offset),
            Stage::RemoveOutliers => Some(&self.remove_outliers),
            Stage::EstimateTrend => Some(&self.estimate_trend),
            Stage::EstimateSpectrum => Some(&self.estimate_spectrum),
            Stage::ModelSpectrum => Some(&self.model_spectrum),
            Stage::Plot => None,
        }
    }
}

/// One external call.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub stage: Stage,
    pub station: &'a str,
    pub workdir: &'a Path,
    pub program: &'a str,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

/// Captured output of a successful call.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub stdout: String,
}

/// Runs external collaborators. Implementations must be usable from
/// several station workers at once.
pub trait EngineRunner: Send + Sync {
    fn invoke(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, PipelineError>;
}

/// Runs collaborators as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl EngineRunner for ProcessRunner {
    fn invoke(&self, inv: &Invocation<'_>) -> Result<EngineOutput, PipelineError> {
        let failed = |message: String| PipelineError::StageFailed {
            stage: inv.stage,
            station: inv.station.to_string(),
            message,
        };

        debug!(
            station = inv.station,
            stage = %inv.stage,
            program = inv.program,
            args = ?inv.args,
            "invoking engine"
        );

        let mut child = Command::new(inv.program)
            .args(&inv.args)
            .current_dir(inv.workdir)
            .stdin(if inv.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("cannot start '{}': {e}", inv.program)))?;

        let writer = match (child.stdin.take(), inv.stdin.clone()) {
            (Some(mut pipe), Some(text)) => Some(std::thread::spawn(move || pipe.write_all(text.as_bytes()))),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| failed(format!("'{}' did not finish: {e}", inv.program)))?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(station = inv.station, stage = %inv.stage, "failed to feed engine input: {e}"),
                Err(_) => warn!(station = inv.station, stage = %inv.stage, "engine input writer panicked"),
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        // `<label>.out` belongs to the engines themselves (spectrum data).
        let log_path = inv.workdir.join(format!("{}.stdout", inv.stage.label()));
        if let Err(e) = std::fs::write(&log_path, &stdout) {
            warn!(path = %log_path.display(), "failed to keep engine output: {e}");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("").trim().to_string();
            return Err(failed(format!("'{}' exited with {}{}{}", inv.program, output.status,
                if detail.is_empty() { "" } else { ": " }, detail)));
        }

        Ok(EngineOutput { stdout })
    }
}
