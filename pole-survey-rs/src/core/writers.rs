//! Data writers for the results table and annotated images.
//!
//! This module provides functions for persisting batch output:
//! - CSV with one measurement row per input file
//! - Annotated photographs in the configured image format

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

use super::types::MeasurementRecord;

/// Column header of the results table.
pub const RESULTS_HEADER: [&str; 6] = [
    "filename",
    "top_x",
    "top_y",
    "bottom_x",
    "bottom_y",
    "pole_length",
];

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Image encoding error.
    #[error("failed to save image '{path}': {source}")]
    SaveImage {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Format a table value; absent values become an empty cell.
///
/// Whole numbers keep one decimal (`10.0`), everything else uses the
/// shortest representation that round-trips.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Write the results table to CSV.
///
/// Writes the header `filename,top_x,top_y,bottom_x,bottom_y,pole_length`
/// followed by one row per record in the order given. Existing files are
/// overwritten. An empty slice produces a header-only file.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `records` - Rows in enumeration order
/// * `error_column` - Append an `error` column holding failure messages
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use pole_survey::core::types::MeasurementRecord;
/// use pole_survey::core::writers::write_results_csv;
/// use std::path::Path;
///
/// let rows = vec![MeasurementRecord::default()];
/// write_results_csv(Path::new("results.csv"), &rows, false).unwrap();
/// ```
pub fn write_results_csv(
    path: &Path,
    records: &[MeasurementRecord],
    error_column: bool,
) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let buf_writer = BufWriter::new(file);
    let mut csv_writer = csv::Writer::from_writer(buf_writer);

    let path_str = path.display().to_string();

    let mut header: Vec<&str> = RESULTS_HEADER.to_vec();
    if error_column {
        header.push("error");
    }
    csv_writer
        .write_record(&header)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for record in records {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.filename.clone());
        row.extend(record.values().into_iter().map(format_value));
        if error_column {
            row.push(record.error.clone().unwrap_or_default());
        }

        csv_writer
            .write_record(&row)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Companion file listing failed inputs next to the results table.
///
/// `out/results.csv` maps to `out/results.failures.csv`.
pub fn failures_path(results_path: &Path) -> PathBuf {
    results_path.with_extension("failures.csv")
}

/// Write `filename,error` for every failed record.
///
/// Existing files are overwritten. Records without an error are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_failures_csv(path: &Path, records: &[MeasurementRecord]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path_str.clone(),
        source: e,
    })?;
    let mut csv_writer = csv::Writer::from_writer(BufWriter::new(file));

    let csv_err = |e| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    };
    csv_writer.write_record(["filename", "error"]).map_err(csv_err)?;
    for record in records {
        if let Some(error) = &record.error {
            csv_writer
                .write_record([record.filename.as_str(), error.as_str()])
                .map_err(csv_err)?;
        }
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })
}

/// Delete a file left behind by an earlier run; a missing file is fine.
pub fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(WriteError::WriteFile {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// Save an RGB image; the format follows the path's extension.
///
/// # Errors
///
/// Returns an error if parent directories cannot be created or encoding fails.
pub fn save_image(path: &Path, image: &RgbImage) -> Result<()> {
    ensure_parent_dirs(path)?;
    image.save(path).map_err(|e| WriteError::SaveImage {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_records() -> Vec<MeasurementRecord> {
        vec![
            MeasurementRecord {
                filename: "b.jpg".to_string(),
                top_x: Some(50.3),
                top_y: Some(10.0),
                bottom_x: Some(50.0),
                bottom_y: Some(200.6),
                pole_length: Some(190.6003),
                error: None,
            },
            MeasurementRecord {
                filename: "a.jpg".to_string(),
                bottom_x: Some(50.0),
                bottom_y: Some(60.0),
                ..MeasurementRecord::default()
            },
        ]
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None), "");
        assert_eq!(format_value(Some(10.0)), "10.0");
        assert_eq!(format_value(Some(50.3)), "50.3");
        assert_eq!(format_value(Some(190.6003)), "190.6003");
    }

    #[test]
    fn test_write_results_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_results_csv(&path, &create_test_records(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "filename,top_x,top_y,bottom_x,bottom_y,pole_length");
        assert_eq!(lines[1], "b.jpg,50.3,10.0,50.0,200.6,190.6003");
        assert_eq!(lines[2], "a.jpg,,,50.0,60.0,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_results_csv_empty_is_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_results_csv(&path, &[], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_write_results_csv_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_results_csv(&path, &create_test_records(), false).unwrap();
        write_results_csv(&path, &[], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_write_results_csv_error_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("results.csv");
        let records = vec![MeasurementRecord::failed("bad.jpg", "decode failed")];

        write_results_csv(&path, &records, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "filename,top_x,top_y,bottom_x,bottom_y,pole_length,error"
        );
        assert_eq!(lines[1], "bad.jpg,,,,,,decode failed");
    }

    #[test]
    fn test_write_results_csv_unwritable_path() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a file
        let result = write_results_csv(dir.path(), &[], false);
        assert!(matches!(result, Err(WriteError::CreateFile { .. })));
    }

    #[test]
    fn test_write_failures_csv() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("get_points_results.csv");
        let path = failures_path(&results);
        assert_eq!(path, dir.path().join("get_points_results.failures.csv"));

        let mut records = create_test_records();
        records.push(MeasurementRecord::failed("bad.jpg".to_string(), "oops, no".to_string()));
        write_failures_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec!["filename,error", "bad.jpg,\"oops, no\""]
        );

        remove_stale(&path).unwrap();
        assert!(!path.exists());
        remove_stale(&path).unwrap();
    }

    #[test]
    fn test_save_image_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("marked.png");
        let img = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));

        save_image(&path, &img).unwrap();

        assert!(path.exists());
    }
}
