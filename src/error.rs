//! Error types.
//!
//! - `PipelineError` is the typed taxonomy raised by the library (tokenizer,
//!   ingest, stage execution, aggregation).
//! - `AppError` is what the binary reports: a message plus a process exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Stage;

/// Exit code for usage/input problems (bad abbreviation, missing file, bad header).
pub const EXIT_INPUT: u8 = 2;
/// Exit code for runtime failures (engine failures, I/O, broken invariants).
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown noise model abbreviation: '{substring}'")]
    InvalidAbbreviation { substring: String },

    #[error("noise model {token} repeated")]
    DuplicateModel { token: String },

    #[error("cannot combine GGM with {other}: both constrain the spectral index")]
    ConflictingModels { other: String },

    #[error("cannot find input file {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("{}: malformed header: {message}", path.display())]
    MalformedHeader { path: PathBuf, message: String },

    #[error("{}: too few observations to span a sampling interval", path.display())]
    InsufficientData { path: PathBuf },

    #[error("station {station}: {stage} failed: {message}")]
    StageFailed {
        stage: Stage,
        station: String,
        message: String,
    },

    #[error("malformed engine result: {message}")]
    MalformedResult { message: String },

    #[error("cannot {operation}: aggregation already finished")]
    AggregationClosed { operation: String },

    #[error("station {station} already present in the aggregated report")]
    DuplicateStation { station: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Re-label a malformed engine result as a failure of the stage that produced it.
    pub fn into_stage_failure(self, stage: Stage, station: &str) -> Self {
        match self {
            Self::MalformedResult { message } => Self::StageFailed {
                stage,
                station: station.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Whether the error is a problem with user input rather than with the run.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAbbreviation { .. }
                | Self::DuplicateModel { .. }
                | Self::ConflictingModels { .. }
                | Self::MissingInput { .. }
                | Self::MalformedHeader { .. }
                | Self::InsufficientData { .. }
        )
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let code = if err.is_input_error() {
            EXIT_INPUT
        } else {
            EXIT_RUNTIME
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
