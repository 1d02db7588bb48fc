//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - stations and observation series (`Station`, `ObservationSeries`)
//! - pipeline stages and their control payloads (`Stage`, `StageConfig`)
//! - the fixed-vs-free parameter hand-off between stages (`ParameterPolicies`)
//! - the run configuration (`PipelineConfig`)

pub mod types;

pub use types::*;
