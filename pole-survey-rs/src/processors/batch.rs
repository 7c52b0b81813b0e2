//! Batch driver for the annotate and points jobs.
//!
//! Each input file is loaded, passed to the detector, and released before
//! its result is recorded. A file that cannot be decoded becomes a failed
//! outcome; the run continues unless `fail_fast` is set. Results always
//! come back in enumeration order, including when `jobs > 1` spreads the
//! work over a rayon thread pool.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::measurement::extract_named;
use super::reporting::{JobKind, RunReporter};
use crate::config::SurveyConfig;
use crate::core::loaders::{list_images, load_image, LoaderError};
use crate::core::transforms::{annotated_output_path, relative_name};
use crate::core::types::MeasurementRecord;
use crate::core::writers::{
    failures_path, remove_stale, save_image, write_failures_csv, write_results_csv, WriteError,
};
use crate::detection::PoleDetector;

/// Fatal errors that stop a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to enumerate input images: {0}")]
    Enumerate(#[source] LoaderError),

    #[error("batch aborted: {0}")]
    Load(#[source] LoaderError),

    #[error("batch aborted: {0}")]
    Write(#[from] WriteError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Outcome of processing a single file.
#[derive(Debug)]
pub enum FileOutcome<T> {
    Done(T),
    Failed(LoaderError),
}

impl<T> FileOutcome<T> {
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed(_))
    }
}

/// Counters and timestamps for one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub total_files: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub start_time: Instant,
    pub end_time: Option<Instant>,
}

impl RunStats {
    /// Starts the clock for a run over `total_files` inputs.
    pub fn start(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: 0,
            failed_count: 0,
            start_time: Instant::now(),
            end_time: None,
        }
    }

    /// Stops the clock.
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Wall-clock duration of the run so far, or in total once finished.
    pub fn elapsed(&self) -> Duration {
        self.end_time
            .unwrap_or_else(Instant::now)
            .duration_since(self.start_time)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Average seconds per file; `None` for an empty run.
    pub fn secs_per_file(&self) -> Option<f64> {
        (self.total_files > 0).then(|| self.elapsed_secs() / self.total_files as f64)
    }

    #[cfg(test)]
    pub(crate) fn with_elapsed(
        total_files: usize,
        processed_count: usize,
        failed_count: usize,
        elapsed: Duration,
    ) -> Self {
        let start_time = Instant::now();
        Self {
            total_files,
            processed_count,
            failed_count,
            start_time,
            end_time: Some(start_time + elapsed),
        }
    }
}

/// Ordered measurement rows, one per input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<MeasurementRecord>,
}

impl ResultTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: MeasurementRecord) {
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[MeasurementRecord] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for files that could not be processed.
    pub fn failed(&self) -> impl Iterator<Item = &MeasurementRecord> {
        self.rows.iter().filter(|r| r.is_failed())
    }
}

/// Output of the points job.
#[derive(Debug)]
pub struct MeasureReport {
    pub table: ResultTable,
    pub output_path: PathBuf,
    /// Companion list of failed inputs, written when the table has no
    /// `error` column and at least one file failed.
    pub failures_path: Option<PathBuf>,
    pub stats: RunStats,
}

/// Output of the annotate job.
#[derive(Debug)]
pub struct AnnotateReport {
    /// Annotated images written, in enumeration order.
    pub saved: Vec<PathBuf>,
    /// Inputs that could not be decoded, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    pub stats: RunStats,
}

/// Drives files through the detector and collects the results.
pub struct BatchAggregator<'a> {
    config: &'a SurveyConfig,
    detector: &'a dyn PoleDetector,
    reporter: &'a dyn RunReporter,
}

impl<'a> BatchAggregator<'a> {
    pub fn new(
        config: &'a SurveyConfig,
        detector: &'a dyn PoleDetector,
        reporter: &'a dyn RunReporter,
    ) -> Self {
        Self {
            config,
            detector,
            reporter,
        }
    }

    /// Lists the input images configured for this run.
    pub fn enumerate(&self) -> Result<Vec<PathBuf>> {
        list_images(&self.config.paths.data_path, &self.config.batch.extensions)
            .map_err(BatchError::Enumerate)
    }

    /// Measures every file and writes the results table.
    ///
    /// The table has one row per input, in the order given. The CSV is
    /// written once, after the last file, even when `files` is empty.
    pub fn measure(&self, files: &[PathBuf]) -> Result<MeasureReport> {
        let data_dir = &self.config.paths.data_path;

        let (outcomes, stats) = self.drive(files, |path| {
            let filename = relative_name(path, data_dir);
            let image = match load_image(path) {
                Ok(image) => image,
                Err(e) => return Ok(FileOutcome::Failed(e)),
            };
            let detection = self.detector.detect_points(&image);
            drop(image);

            debug!("{}: {:?}", filename, detection);
            Ok(FileOutcome::Done(extract_named(filename, &detection)))
        })?;

        let mut table = ResultTable::with_capacity(files.len());
        for (path, outcome) in files.iter().zip(outcomes) {
            let record = match outcome {
                FileOutcome::Done(record) => record,
                FileOutcome::Failed(e) => {
                    MeasurementRecord::failed(relative_name(path, data_dir), e.to_string())
                }
            };
            table.push(record);
        }

        let output_path = self.config.points.results_path();
        write_results_csv(&output_path, table.rows(), self.config.batch.error_column)?;
        info!(
            "Saved {} rows to {}",
            table.len(),
            output_path.display()
        );

        let failures_path = if self.config.batch.error_column {
            None
        } else {
            let path = failures_path(&output_path);
            if table.failed().next().is_some() {
                write_failures_csv(&path, table.rows())?;
                info!("Listed failed files in {}", path.display());
                Some(path)
            } else {
                remove_stale(&path)?;
                None
            }
        };

        self.reporter.on_summary(JobKind::Points, &stats);

        Ok(MeasureReport {
            table,
            output_path,
            failures_path,
            stats,
        })
    }

    /// Writes an annotated copy of every file.
    pub fn annotate(&self, files: &[PathBuf]) -> Result<AnnotateReport> {
        let data_dir = &self.config.paths.data_path;
        let out = &self.config.annotate;

        let (outcomes, stats) = self.drive(files, |path| {
            let image = match load_image(path) {
                Ok(image) => image,
                Err(e) => return Ok(FileOutcome::Failed(e)),
            };
            let annotated = self.detector.detect_annotated(&image);
            drop(image);

            let dest = annotated_output_path(
                path,
                data_dir,
                &out.save_path,
                &out.save_prefix,
                &out.image_extension,
            );
            save_image(&dest, &annotated)?;
            debug!("{} -> {}", path.display(), dest.display());
            Ok(FileOutcome::Done(dest))
        })?;

        let mut saved = Vec::with_capacity(files.len());
        let mut failures = Vec::new();
        for (path, outcome) in files.iter().zip(outcomes) {
            match outcome {
                FileOutcome::Done(dest) => saved.push(dest),
                FileOutcome::Failed(e) => failures.push((path.clone(), e.to_string())),
            }
        }

        self.reporter.on_summary(JobKind::Annotate, &stats);

        Ok(AnnotateReport {
            saved,
            failures,
            stats,
        })
    }

    /// Runs `work` over every file, reporting progress after each one.
    ///
    /// Decode failures are kept as [`FileOutcome::Failed`] unless
    /// `fail_fast` is set, in which case the first one aborts the run.
    fn drive<T, F>(&self, files: &[PathBuf], work: F) -> Result<(Vec<FileOutcome<T>>, RunStats)>
    where
        T: Send,
        F: Fn(&Path) -> Result<FileOutcome<T>> + Sync,
    {
        let total = files.len();
        let fail_fast = self.config.batch.fail_fast;
        let jobs = self.config.batch.jobs.max(1);

        self.reporter.on_start(total);
        let mut stats = RunStats::start(total);

        // Held across the emit so progress lines come out in count order
        let processed = Mutex::new(0usize);
        let step = |path: &PathBuf| -> Result<FileOutcome<T>> {
            let outcome = match work(path.as_path())? {
                FileOutcome::Failed(e) if fail_fast => return Err(BatchError::Load(e)),
                FileOutcome::Failed(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    FileOutcome::Failed(e)
                }
                done => done,
            };
            let mut count = processed.lock().unwrap_or_else(|e| e.into_inner());
            *count += 1;
            self.reporter.on_progress(*count, total);
            drop(count);
            Ok(outcome)
        };

        let outcomes: Vec<FileOutcome<T>> = if jobs == 1 {
            files.iter().map(step).collect::<Result<_>>()?
        } else {
            info!("Processing {} files on {} threads", total, jobs);
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| files.par_iter().map(step).collect::<Result<_>>())?
        };

        stats.finish();
        stats.processed_count = outcomes.len();
        stats.failed_count = outcomes.iter().filter(|o| o.is_failed()).count();

        Ok((outcomes, stats))
    }
}
