//! Red pole detection by sweeping for a red, pole-shaped column.
//!
//! The image is swept on a coarse grid. At each red pixel the detector
//! examines a candidate: it measures the red run's width on two rows one
//! width apart, derives the pole's lean from the two right edges, then
//! crawls along the pole axis in both directions until the colour or
//! contrast changes. Candidates that are too narrow, inconsistent, or
//! too short relative to their width are rejected and the sweep goes on.

use image::RgbImage;
use log::debug;

use super::annotate;
use super::frame::{Frame, Pixel};
use super::PoleDetector;
use crate::config::DetectionConfig;
use crate::core::types::{DetectionResult, Point};

/// Minimum ratio of pole length to pole width.
const MIN_LENGTH_TO_WIDTH: i32 = 8;

/// Key points found along a detected pole.
#[derive(Debug, Clone, PartialEq)]
pub struct PoleTrace {
    /// Centre of the pole on the row where it was found.
    pub origin: Pixel,
    pub origin_right: Pixel,
    pub origin_left: Pixel,
    /// Centre of the pole one width away from `origin`.
    pub second: Pixel,
    pub second_right: Pixel,
    pub second_left: Pixel,
    pub bottom: Pixel,
    /// Upper end of the red band.
    pub red_top: Pixel,
    pub top: Pixel,
    /// Horizontal shift per pixel of vertical travel along the axis.
    pub x_step: f32,
    pub width: i32,
}

impl PoleTrace {
    /// All key points, for annotation.
    pub fn points(&self) -> [Pixel; 9] {
        [
            self.origin,
            self.origin_right,
            self.origin_left,
            self.second,
            self.second_right,
            self.second_left,
            self.bottom,
            self.red_top,
            self.top,
        ]
    }
}

/// Horizontal shift per pixel of vertical travel between two points.
fn inverse_slope(a: Pixel, b: Pixel) -> Option<f32> {
    let dy = (a.y as i32 - b.y as i32) as f32;
    let dx = (a.x as i32 - b.x as i32) as f32;
    (dy != 0.0).then(|| dx / dy)
}

/// Detector for a red-painted pole.
#[derive(Debug, Clone, Default)]
pub struct RedPoleDetector {
    config: DetectionConfig,
}

impl RedPoleDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Locate the pole, if any.
    pub fn trace(&self, image: &RgbImage) -> Option<PoleTrace> {
        let frame = Frame::from_rgb(image);
        if frame.is_empty() {
            return None;
        }

        let step_x = self.config.sweep_step.max(1) as usize;
        let step_y = self.config.sweep_step_vertical.max(1) as usize;

        for y in (0..frame.height()).step_by(step_y) {
            for x in (0..frame.width()).step_by(step_x) {
                if !self.is_red(&frame, Pixel::new(x as f32, y as f32)) {
                    continue;
                }
                if let Some(trace) = self.examine(&frame, x, y) {
                    debug!(
                        "pole found from ({}, {}): top {:?}, bottom {:?}",
                        x, y, trace.top, trace.bottom
                    );
                    return Some(trace);
                }
            }
        }
        None
    }

    fn is_red_with(&self, frame: &Frame, p: Pixel, orange: f32) -> bool {
        let [hue, sat, _] = frame.hsv(p);
        let c = &self.config;
        (hue > c.hue_pink / 360.0 || hue < orange / 360.0)
            && sat > c.saturation_min
            && sat < c.saturation_max
    }

    #[inline]
    fn is_red(&self, frame: &Frame, p: Pixel) -> bool {
        self.is_red_with(frame, p, self.config.hue_orange)
    }

    /// True where the red run ends: colour change or a sharp neighbour contrast.
    fn is_edge(&self, frame: &Frame, p: Pixel, before: Pixel, after: Pixel) -> bool {
        !self.is_red(frame, p) || frame.contrast(before, after) > self.config.contrast
    }

    fn is_horizontal_edge(&self, frame: &Frame, x: i32, y: f32) -> bool {
        let xf = x as f32;
        self.is_edge(
            frame,
            Pixel::new(xf, y),
            Pixel::new(xf - 1.0, y),
            Pixel::new(xf + 1.0, y),
        )
    }

    /// Right end of the red run through `(x, y)`; the last column if it never ends.
    fn scan_right(&self, frame: &Frame, x: i32, y: f32) -> Pixel {
        let end = (x..frame.width())
            .find(|&i| self.is_horizontal_edge(frame, i, y))
            .unwrap_or(frame.width() - 1);
        Pixel::new(end as f32, y)
    }

    /// Left end of the red run through `(x, y)`; column 0 if it never ends.
    fn scan_left(&self, frame: &Frame, x: i32, y: f32) -> Pixel {
        let end = (0..=x)
            .rev()
            .find(|&i| self.is_horizontal_edge(frame, i, y))
            .unwrap_or(0);
        Pixel::new(end as f32, y)
    }

    /// True if the column at `x` stays red for `len` rows from `y` in `dir`.
    fn column_is_clear(&self, frame: &Frame, x: i32, y: i32, len: i32, dir: i32) -> bool {
        let xf = x as f32;
        (0..len).all(|k| {
            let j = (y + dir * k) as f32;
            !self.is_edge(
                frame,
                Pixel::new(xf, j),
                Pixel::new(xf, j - 1.0),
                Pixel::new(xf, j + 1.0),
            )
        })
    }

    fn widths_agree(&self, a: i32, b: i32) -> bool {
        ((a - b).abs() as f32) <= (a + b) as f32 * self.config.width_tolerance
    }

    fn examine(&self, frame: &Frame, x: i32, y: i32) -> Option<PoleTrace> {
        let yf = y as f32;
        let origin_right = self.scan_right(frame, x, yf);
        let origin_left = self.scan_left(frame, x, yf);
        let width = (origin_right.x - origin_left.x) as i32;
        if width < self.config.min_pole_width.max(1) {
            return None;
        }

        // Second row one width up, or failing that one width down
        let second_row = if self.column_is_clear(frame, x, y, width, -1) {
            y - width
        } else if self.column_is_clear(frame, x, y, width, 1) {
            y + width
        } else {
            return None;
        };
        let second_y = second_row as f32;

        let mut second_right = self.scan_right(frame, x, second_y);
        let mut second_left = self.scan_left(frame, x, second_y);
        let second_width = (second_right.x - second_left.x) as i32;
        if !self.widths_agree(width, second_width) {
            return None;
        }

        let origin = Pixel::center(origin_right, origin_left);
        let mut second = Pixel::center(second_right, second_left);
        let mut x_step = inverse_slope(origin_right, second_right)?;

        let bottom = self.crawl_down(
            frame,
            width,
            origin_right,
            &mut second,
            &mut second_right,
            &mut second_left,
            &mut x_step,
        );
        let bottom = self.extend_bottom(frame, bottom, width, x_step);

        let red_top = self.crawl_up(frame, origin, x_step);
        if (origin.y - red_top.y) < width as f32 {
            return None;
        }

        let top = if self.is_red_with(frame, red_top, self.config.hue_orange_top) {
            self.extend_top(frame, red_top, width, x_step)
        } else {
            red_top
        };

        let length = (bottom.y - top.y) as i32;
        if length < MIN_LENGTH_TO_WIDTH * width {
            return None;
        }

        Some(PoleTrace {
            origin,
            origin_right,
            origin_left,
            second,
            second_right,
            second_left,
            bottom,
            red_top,
            top,
            x_step,
            width,
        })
    }

    /// Follow the axis downward from `second` until the red run ends.
    ///
    /// Every `width` rows the pole is re-measured; when the width still
    /// agrees, the centre and lean are recalibrated from the new edges.
    #[allow(clippy::too_many_arguments)]
    fn crawl_down(
        &self,
        frame: &Frame,
        width: i32,
        origin_right: Pixel,
        second: &mut Pixel,
        second_right: &mut Pixel,
        second_left: &mut Pixel,
        x_step: &mut f32,
    ) -> Pixel {
        let (mut x0, mut y0) = (second.x, second.y);
        let mut last = *second;
        let mut t = 0;

        while frame.contains(Pixel::new(x0, y0)) {
            last = Pixel::new(x0, y0);
            y0 += 1.0;
            x0 += *x_step;

            let here = Pixel::new(x0, y0);
            let before = Pixel::new(x0 - *x_step, y0 - 1.0);
            let after = Pixel::new(x0 + *x_step, y0 + 1.0);
            if self.is_edge(frame, here, before, after) {
                return here;
            }

            if t != 0 && t % width == 0 {
                let right = self.scan_right(frame, x0 as i32, y0);
                let left = self.scan_left(frame, x0 as i32, y0);
                let check = (right.x - left.x) as i32;
                if self.widths_agree(width, check) {
                    *second = Pixel::center(right, left);
                    *second_right = right;
                    *second_left = left;
                    if let Some(step) = inverse_slope(origin_right, right) {
                        *x_step = step;
                    }
                    x0 = second.x;
                    y0 = second.y;
                }
            }
            t += 1;
        }
        last
    }

    /// Continue past a bottom end until the bottom-edge test fires.
    fn extend_bottom(&self, frame: &Frame, start: Pixel, width: i32, x_step: f32) -> Pixel {
        let (mut x0, mut y0) = (start.x, start.y);
        while frame.contains(Pixel::new(x0, y0)) {
            y0 += 1.0;
            x0 += x_step;
            if let Some(edge) = self.bottom_edge(frame, Pixel::new(x0, y0), width, x_step) {
                return edge;
            }
        }
        start
    }

    /// Follow the axis upward from `origin` until the red run ends.
    fn crawl_up(&self, frame: &Frame, origin: Pixel, x_step: f32) -> Pixel {
        let (mut x0, mut y0) = (origin.x, origin.y);
        let mut last = origin;
        while frame.contains(Pixel::new(x0, y0)) {
            last = Pixel::new(x0, y0);
            y0 -= 1.0;
            x0 -= x_step;

            let here = Pixel::new(x0, y0);
            let before = Pixel::new(x0 - x_step, y0 - 1.0);
            let after = Pixel::new(x0 + x_step, y0 + 1.0);
            if self.is_edge(frame, here, before, after) {
                return here;
            }
        }
        last
    }

    /// Climb past the red band to the physical top of the pole.
    fn extend_top(&self, frame: &Frame, start: Pixel, width: i32, x_step: f32) -> Pixel {
        let (mut x0, mut y0) = (start.x, start.y);
        while frame.contains(Pixel::new(x0, y0)) {
            y0 -= 1.0;
            x0 -= x_step;
            if let Some(edge) = self.top_edge(frame, Pixel::new(x0, y0), width, x_step) {
                return edge;
            }
        }
        start
    }

    /// The pole has ended at `p` if its sides no longer contrast with it.
    fn sides_blend(&self, frame: &Frame, p: Pixel, width: i32) -> bool {
        let w = width as f32;
        let right = Pixel::new(p.x + w, p.y);
        let left = Pixel::new(p.x - w, p.y);
        let side = self.config.side_contrast;
        frame.contrast(p, right) <= side || frame.contrast(p, left) <= side
    }

    fn bottom_edge(&self, frame: &Frame, p: Pixel, width: i32, x_step: f32) -> Option<Pixel> {
        if self.sides_blend(frame, p, width) {
            return Some(p);
        }
        let w = width as f32;
        let below = Pixel::new(p.x + w * x_step, p.y + w);
        (frame.contrast(p, below) > self.config.bottom_contrast).then_some(below)
    }

    fn top_edge(&self, frame: &Frame, p: Pixel, width: i32, x_step: f32) -> Option<Pixel> {
        if self.sides_blend(frame, p, width) {
            return Some(p);
        }
        let quarter = (width / 4) as f32;
        let above = Pixel::new(p.x - quarter * x_step, p.y - quarter);
        (frame.contrast(p, above) > self.config.top_contrast).then_some(above)
    }
}

impl PoleDetector for RedPoleDetector {
    fn detect_points(&self, image: &RgbImage) -> DetectionResult {
        match self.trace(image) {
            Some(trace) => DetectionResult::new(
                Point::new(trace.top.x as f64, trace.top.y as f64),
                Point::new(trace.bottom.x as f64, trace.bottom.y as f64),
            ),
            None => DetectionResult::undetected(),
        }
    }

    fn detect_annotated(&self, image: &RgbImage) -> RgbImage {
        let mut annotated = image.clone();
        if let Some(trace) = self.trace(image) {
            annotate::draw_trace(&mut annotated, &trace, &self.config);
        }
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GREEN: Rgb<u8> = Rgb([30, 160, 30]);
    const RED: Rgb<u8> = Rgb([200, 30, 30]);

    /// Green field with a vertical red bar over `x0..x1`, `y0..y1`.
    fn bar_image(w: u32, h: u32, x0: u32, x1: u32, y0: u32, y1: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                RED
            } else {
                GREEN
            }
        })
    }

    #[test]
    fn test_detects_vertical_bar() {
        let img = bar_image(200, 460, 80, 110, 10, 420);
        let detector = RedPoleDetector::default();

        let trace = detector.trace(&img).expect("bar should be detected");

        assert_eq!(trace.width, 29);
        assert_eq!(trace.x_step, 0.0);
        assert!((80.0..110.0).contains(&trace.top.x));
        assert!((80.0..110.0).contains(&trace.bottom.x));
        assert!(trace.top.y <= 10.0 && trace.top.y >= 5.0);
        assert!(trace.bottom.y >= 418.0 && trace.bottom.y <= 425.0);
    }

    #[test]
    fn test_detect_points_reports_endpoints() {
        let img = bar_image(200, 460, 80, 110, 10, 420);
        let result = RedPoleDetector::default().detect_points(&img);

        assert!(result.top.y < result.bottom.y);
        assert!(result.bottom.y - result.top.y > 400.0);
    }

    #[test]
    fn test_no_red_means_undetected() {
        let img = RgbImage::from_pixel(120, 120, GREEN);
        let result = RedPoleDetector::default().detect_points(&img);
        assert_eq!(result, DetectionResult::undetected());
    }

    #[test]
    fn test_narrow_bar_is_rejected() {
        let img = bar_image(200, 460, 80, 90, 10, 420);
        assert!(RedPoleDetector::default().trace(&img).is_none());
    }

    #[test]
    fn test_stubby_block_is_rejected() {
        // Wide enough, but far too short for its width
        let img = bar_image(200, 200, 50, 110, 40, 140);
        assert!(RedPoleDetector::default().trace(&img).is_none());
    }

    #[test]
    fn test_empty_image() {
        let img = RgbImage::new(0, 0);
        assert_eq!(
            RedPoleDetector::default().detect_points(&img),
            DetectionResult::undetected()
        );
    }

    #[test]
    fn test_annotated_marks_pole_and_keeps_size() {
        let img = bar_image(200, 460, 80, 110, 10, 420);
        let detector = RedPoleDetector::default();
        let trace = detector.trace(&img).unwrap();

        let annotated = detector.detect_annotated(&img);

        assert_eq!(annotated.dimensions(), img.dimensions());
        let origin = trace.origin;
        assert_eq!(
            annotated.get_pixel(origin.x as u32, origin.y as u32).0,
            [255, 255, 255]
        );
    }

    #[test]
    fn test_annotated_without_pole_is_unchanged() {
        let img = RgbImage::from_pixel(64, 64, GREEN);
        let annotated = RedPoleDetector::default().detect_annotated(&img);
        assert_eq!(annotated, img);
    }
}
