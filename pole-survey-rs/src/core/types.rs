//! Raw detection types exchanged between the detector and the measurement stage.
//!
//! Detectors report coordinates in image pixel space and signal "not found"
//! with values at or below [`MIN_VALID_COORDINATE`] (usually `0`). The gate is
//! applied once, in [`gate_coordinate`], and everything downstream works with
//! `Option<f64>`.

/// Coordinates must be strictly greater than this to count as detected.
pub const MIN_VALID_COORDINATE: f64 = 1.0;

/// Returns the coordinate if it passes the validity gate.
#[inline]
pub fn gate_coordinate(value: f64) -> Option<f64> {
    (value > MIN_VALID_COORDINATE).then_some(value)
}

/// A 2D coordinate in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The all-zero point detectors return when nothing was found.
    #[inline]
    pub const fn undetected() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Both components gated independently.
    #[inline]
    pub fn gated(&self) -> GatedPoint {
        GatedPoint {
            x: gate_coordinate(self.x),
            y: gate_coordinate(self.y),
        }
    }
}

/// A point whose components are present only when they passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GatedPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl GatedPoint {
    /// Both components, if both are valid.
    #[inline]
    pub fn both(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
}

/// Top and bottom endpoints reported for one image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectionResult {
    pub top: Point,
    pub bottom: Point,
}

impl DetectionResult {
    pub const fn new(top: Point, bottom: Point) -> Self {
        Self { top, bottom }
    }

    /// Result reported when no pole was found.
    pub const fn undetected() -> Self {
        Self {
            top: Point::undetected(),
            bottom: Point::undetected(),
        }
    }
}

/// Table-ready measurements for one input file.
///
/// Coordinates are rounded to 1 decimal place and `pole_length` to 5. A
/// field is `None` when the detector did not produce a valid value for it.
/// `pole_length` is only ever set when all four coordinates are set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementRecord {
    pub filename: String,
    pub top_x: Option<f64>,
    pub top_y: Option<f64>,
    pub bottom_x: Option<f64>,
    pub bottom_y: Option<f64>,
    pub pole_length: Option<f64>,
    /// Set when the file could not be processed.
    pub error: Option<String>,
}

impl MeasurementRecord {
    /// Row for a file that failed before detection; all measurements are absent.
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Measurement columns in table order.
    pub fn values(&self) -> [Option<f64>; 5] {
        [
            self.top_x,
            self.top_y,
            self.bottom_x,
            self.bottom_y,
            self.pole_length,
        ]
    }
}
