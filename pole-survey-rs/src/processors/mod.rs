//! Batch processing stages.

pub mod batch;
pub mod measurement;
pub mod reporting;

// Re-export key types for convenience
pub use batch::{
    AnnotateReport, BatchAggregator, BatchError, FileOutcome, MeasureReport, ResultTable, RunStats,
};
pub use measurement::{extract, extract_named};
pub use reporting::{
    format_progress, format_summary, ConsoleReporter, JobKind, ProgressBarReporter, RunReporter,
};
