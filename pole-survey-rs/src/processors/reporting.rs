//! Progress and timing output for batch runs.
//!
//! Reporters are pure output sinks: they never influence control flow and
//! have no error conditions. The formatting functions are kept separate
//! so they can be tested without capturing stdout.

use indicatif::{ProgressBar, ProgressStyle};

use super::batch::RunStats;
use crate::core::transforms::round_to;

/// Which batch job a summary describes; selects the summary labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Annotated images are written per input.
    Annotate,
    /// Endpoint measurements are collected into a table.
    Points,
}

/// Observer of a batch run.
pub trait RunReporter: Sync {
    /// Called once before the first file with the number of inputs.
    fn on_start(&self, _total_files: usize) {}

    /// Called after each file, in processing order.
    fn on_progress(&self, processed_count: usize, total_files: usize);

    /// Called once after the last file.
    fn on_summary(&self, kind: JobKind, stats: &RunStats);
}

/// Percentage of files processed, rounded to 2 decimal places.
pub fn percent_complete(processed_count: usize, total_files: usize) -> f64 {
    if total_files == 0 {
        return 0.0;
    }
    round_to(processed_count as f64 / total_files as f64 * 100.0, 2)
}

/// Progress line emitted after each file, e.g. ` 33.33% complete`.
pub fn format_progress(processed_count: usize, total_files: usize) -> String {
    format!(
        " {:.2}% complete",
        percent_complete(processed_count, total_files)
    )
}

/// Summary lines emitted at the end of a run.
///
/// The per-file average is only included when at least one file was
/// enumerated.
pub fn format_summary(kind: JobKind, stats: &RunStats) -> Vec<String> {
    let elapsed = stats.elapsed_secs();
    let mut lines = Vec::with_capacity(4);

    if kind == JobKind::Annotate {
        lines.push(format!("Number of files processed: {}", stats.processed_count));
    }
    lines.push(format!("Runtime in seconds: {}", round_to(elapsed, 4)));

    if let Some(per_file) = stats.secs_per_file() {
        let label = match kind {
            JobKind::Annotate => "Time in seconds per file",
            JobKind::Points => "Avg. time in seconds per file",
        };
        lines.push(format!("{}: {}", label, round_to(per_file, 4)));
    }

    if stats.failed_count > 0 {
        lines.push(format!("Files failed: {}", stats.failed_count));
    }

    lines
}

/// Plain line-per-file console output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl RunReporter for ConsoleReporter {
    fn on_start(&self, total_files: usize) {
        println!("Number of files: {}", total_files);
        println!();
    }

    fn on_progress(&self, processed_count: usize, total_files: usize) {
        println!("{}", format_progress(processed_count, total_files));
    }

    fn on_summary(&self, kind: JobKind, stats: &RunStats) {
        println!();
        for line in format_summary(kind, stats) {
            println!("{}", line);
        }
    }
}

/// Progress bar output for interactive terminals.
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReporter for ProgressBarReporter {
    fn on_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.set_position(0);
    }

    fn on_progress(&self, processed_count: usize, total_files: usize) {
        self.bar.set_position(processed_count as u64);
        self.bar.set_message(format!(
            "{:.2}%",
            percent_complete(processed_count, total_files)
        ));
    }

    fn on_summary(&self, kind: JobKind, stats: &RunStats) {
        self.bar.finish_and_clear();
        for line in format_summary(kind, stats) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(total: usize, processed: usize, failed: usize, secs: f64) -> RunStats {
        RunStats::with_elapsed(total, processed, failed, Duration::from_secs_f64(secs))
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(1, 3), 33.33);
        assert_eq!(percent_complete(2, 3), 66.67);
        assert_eq!(percent_complete(3, 3), 100.0);
        assert_eq!(percent_complete(0, 0), 0.0);
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(1, 3), " 33.33% complete");
        assert_eq!(format_progress(4, 4), " 100.00% complete");
        // 3.125 is an exact tie and goes to the even digit
        assert_eq!(format_progress(1, 32), " 3.12% complete");
        assert_eq!(format_progress(1, 8), " 12.50% complete");
    }

    #[test]
    fn test_format_summary_points() {
        let lines = format_summary(JobKind::Points, &stats(4, 4, 0, 2.5));
        assert_eq!(
            lines,
            vec![
                "Runtime in seconds: 2.5".to_string(),
                "Avg. time in seconds per file: 0.625".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_summary_annotate() {
        let lines = format_summary(JobKind::Annotate, &stats(3, 3, 1, 1.0));
        assert_eq!(lines[0], "Number of files processed: 3");
        assert_eq!(lines[1], "Runtime in seconds: 1");
        assert_eq!(lines[2], "Time in seconds per file: 0.3333");
        assert_eq!(lines[3], "Files failed: 1");
    }

    #[test]
    fn test_format_summary_empty_run_has_no_average() {
        let lines = format_summary(JobKind::Points, &stats(0, 0, 0, 0.01));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Runtime in seconds"));
    }
}
