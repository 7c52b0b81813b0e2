//! Measurement extraction from raw detections.

use crate::core::transforms::{euclidean_distance, round_to};
use crate::core::types::{DetectionResult, MeasurementRecord};

/// Decimal places kept for endpoint coordinates.
pub const COORDINATE_PLACES: usize = 1;

/// Decimal places kept for pole length.
pub const LENGTH_PLACES: usize = 5;

/// Lengths at or below this many pixels are treated as noise.
pub const MIN_POLE_LENGTH: f64 = 1.0;

/// Turn a raw detection into a table row.
///
/// Each coordinate is kept (rounded to 1 decimal) only if it passes the
/// validity gate. Pole length is computed at full precision from the raw
/// coordinates, rounded to 5 decimals, and kept only when all four
/// coordinates are valid and the rounded length exceeds [`MIN_POLE_LENGTH`].
///
/// The returned record has an empty `filename`; the caller fills it in.
///
/// # Example
///
/// ```
/// use pole_survey::core::types::{DetectionResult, Point};
/// use pole_survey::processors::measurement::extract;
///
/// let record = extract(&DetectionResult::new(Point::new(0.0, 0.0), Point::new(50.0, 60.0)));
/// assert_eq!(record.top_x, None);
/// assert_eq!(record.bottom_y, Some(60.0));
/// assert_eq!(record.pole_length, None);
/// ```
pub fn extract(result: &DetectionResult) -> MeasurementRecord {
    let top = result.top.gated();
    let bottom = result.bottom.gated();
    let round_coord = |v: f64| round_to(v, COORDINATE_PLACES);

    let length = match (top.both(), bottom.both()) {
        (Some(t), Some(b)) => round_to(euclidean_distance(t, b), LENGTH_PLACES),
        _ => 0.0,
    };

    MeasurementRecord {
        filename: String::new(),
        top_x: top.x.map(round_coord),
        top_y: top.y.map(round_coord),
        bottom_x: bottom.x.map(round_coord),
        bottom_y: bottom.y.map(round_coord),
        pole_length: (length > MIN_POLE_LENGTH).then_some(length),
        error: None,
    }
}

/// [`extract`] with the filename already set.
pub fn extract_named(filename: impl Into<String>, result: &DetectionResult) -> MeasurementRecord {
    MeasurementRecord {
        filename: filename.into(),
        ..extract(result)
    }
}
