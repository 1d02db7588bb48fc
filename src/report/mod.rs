//! Reporting: engine result parsing, aggregated JSON reports and terminal output.

pub mod aggregate;
pub mod format;
pub mod result;

pub use aggregate::{AggregatedReport, ResultAggregator};
pub use format::{format_run_summary, format_trend};
pub use result::{
    ModelEstimate, StageResult, read_document_file, read_result, read_result_file, read_result_str,
};
