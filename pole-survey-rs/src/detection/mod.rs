//! Pole detection on decoded photographs.

pub mod annotate;
pub mod frame;
pub mod pole;

use image::RgbImage;

use crate::core::types::DetectionResult;

pub use pole::{PoleTrace, RedPoleDetector};

/// Locates a pole in a decoded image.
///
/// Implementations must not fail: an image without a pole yields
/// [`DetectionResult::undetected`] from `detect_points` and an unmarked
/// copy from `detect_annotated`.
pub trait PoleDetector: Sync {
    /// Raw top and bottom endpoints.
    fn detect_points(&self, image: &RgbImage) -> DetectionResult;

    /// A copy of `image` with the detected features drawn on it.
    fn detect_annotated(&self, image: &RgbImage) -> RgbImage;
}
