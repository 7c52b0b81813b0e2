//! Numeric and naming helpers shared by the batch jobs.
//!
//! This module provides decimal rounding used for table values and
//! timing output, the Euclidean distance behind pole length, and the
//! mapping from input paths to table identifiers and output file names.

use std::path::{Path, PathBuf};

/// Round `value` to `places` decimal places.
///
/// Rounding is done on the exact binary value, with exact ties going to
/// the even digit, so `2.25` becomes `2.2` and `1.15` (stored just below
/// the tie) becomes `1.1`.
///
/// # Example
///
/// ```
/// use pole_survey::core::transforms::round_to;
///
/// assert_eq!(round_to(50.34, 1), 50.3);
/// assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
/// ```
#[inline]
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Euclidean distance between two points.
#[inline]
pub fn euclidean_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Identifier of `path` relative to the data directory.
///
/// The data directory prefix is removed and the extension kept. Paths
/// outside `data_dir` fall back to their full display form.
pub fn relative_name(path: &Path, data_dir: &Path) -> String {
    path.strip_prefix(data_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Relative identifier with the file extension removed.
///
/// Only a real extension is stripped, so `a.jpeg` becomes `a` and a name
/// without an extension is left untouched.
pub fn output_stem(path: &Path, data_dir: &Path) -> String {
    let relative = path.strip_prefix(data_dir).unwrap_or(path);
    relative.with_extension("").to_string_lossy().into_owned()
}

/// Destination of an annotated image.
///
/// Builds `save_dir/<prefix><stem>.<extension>`.
pub fn annotated_output_path(
    input: &Path,
    data_dir: &Path,
    save_dir: &Path,
    prefix: &str,
    extension: &str,
) -> PathBuf {
    let stem = output_stem(input, data_dir);
    save_dir.join(format!("{}{}.{}", prefix, stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(50.34, 1), 50.3);
        assert_eq!(round_to(10.0, 1), 10.0);
        assert_eq!(round_to(0.5, 5), 0.5);
        assert_eq!(round_to(1.0 / 3.0 * 100.0, 2), 33.33);
        assert_eq!(round_to(-2.25, 0), -2.0);
    }

    #[test]
    fn test_round_to_ties_and_near_ties() {
        assert_eq!(round_to(2.25, 1), 2.2);
        assert_eq!(round_to(2.35, 1), 2.4);
        assert_eq!(round_to(1.15, 1), 1.1);
        assert_eq!(round_to(12.35, 1), 12.3);
        assert_eq!(round_to(3.125, 2), 3.12);
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(euclidean_distance((5.0, 5.0), (5.0, 5.5)), 0.5);
        assert_eq!(euclidean_distance((7.0, 7.0), (7.0, 7.0)), 0.0);
    }

    #[test]
    fn test_relative_name_keeps_extension() {
        let name = relative_name(
            Path::new("data/samples/IMG_0001.JPG"),
            Path::new("data/samples/"),
        );
        assert_eq!(name, "IMG_0001.JPG");
    }

    #[test]
    fn test_relative_name_outside_data_dir() {
        let name = relative_name(Path::new("other/pole.jpg"), Path::new("data/samples"));
        assert_eq!(name, "other/pole.jpg");
    }

    #[test]
    fn test_output_stem_strips_real_extension() {
        let data = Path::new("data/samples");
        assert_eq!(output_stem(Path::new("data/samples/a.jpg"), data), "a");
        assert_eq!(output_stem(Path::new("data/samples/b.jpeg"), data), "b");
        assert_eq!(output_stem(Path::new("data/samples/noext"), data), "noext");
        assert_eq!(output_stem(Path::new("data/samples/pole.v2.JPG"), data), "pole.v2");
    }

    #[test]
    fn test_annotated_output_path() {
        let path = annotated_output_path(
            Path::new("data/samples/pole1.jpeg"),
            Path::new("data/samples/"),
            Path::new("output/images"),
            "marked_",
            "png",
        );
        assert_eq!(path, PathBuf::from("output/images/marked_pole1.png"));
    }
}
