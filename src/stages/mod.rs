//! Engine stages: control-file builders, process invocation and the
//! spectrum summary parser.

pub mod control;
pub mod engine;
pub mod summary;

pub use control::{ControlFileBuilder, TrendConfig};
pub use engine::{EngineConfig, EngineOutput, EngineRunner, Invocation, ProcessRunner};
pub use summary::{SpectrumBounds, parse_spectrum_bounds};
