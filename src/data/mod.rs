//! Data-quality checks run before any engine stage.

pub mod gaps;

pub use gaps::{GapAssessment, GapDecision, MAX_MISSING_PERCENTAGE, assess, assess_series};
