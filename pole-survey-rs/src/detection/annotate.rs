//! Drawing detected pole features onto a copy of the photograph.

use image::{Rgb, RgbImage};

use super::frame::Pixel;
use super::pole::PoleTrace;
use crate::config::DetectionConfig;

const MARK: Rgb<u8> = Rgb([255, 255, 255]);

/// Set a pixel, ignoring positions outside the image.
fn put(image: &mut RgbImage, x: i32, y: i32) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, MARK);
    }
}

/// Draw a thick cross centred on `p`.
pub fn mark_point(image: &mut RgbImage, p: Pixel, thickness: i32, size: i32) {
    let (xo, yo) = (p.x as i32, p.y as i32);
    let half_t = thickness / 2;
    let half_s = size / 2;
    for x in xo - half_t..xo + half_t.max(1) {
        for y in yo - half_t..yo + half_t.max(1) {
            for i in -half_s..half_s {
                put(image, x + i, y);
                put(image, x, y + i);
            }
        }
    }
}

/// Draw the pole axis through `origin` to both image borders.
pub fn draw_axis(image: &mut RgbImage, origin: Pixel, x_step: f32) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let inside = |x: f32, y: f32| {
        let (xi, yi) = (x as i32, y as i32);
        xi >= 0 && xi < w && yi >= 0 && yi < h
    };

    for dir in [1.0f32, -1.0] {
        let (mut x, mut y) = (origin.x, origin.y);
        while inside(x, y) {
            put(image, x as i32, y as i32);
            y += dir;
            x += dir * x_step;
        }
    }
}

/// Mark every key point of `trace` and its axis.
pub fn draw_trace(image: &mut RgbImage, trace: &PoleTrace, config: &DetectionConfig) {
    for p in trace.points() {
        mark_point(image, p, config.marker_thickness, config.marker_size);
    }
    draw_axis(image, trace.origin, trace.x_step);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_point_draws_cross() {
        let mut img = RgbImage::new(50, 50);
        mark_point(&mut img, Pixel::new(25.0, 25.0), 5, 10);

        assert_eq!(*img.get_pixel(25, 25), MARK);
        assert_eq!(*img.get_pixel(21, 25), MARK);
        assert_eq!(*img.get_pixel(25, 21), MARK);
        // Corners of the bounding box stay untouched
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 0]);
    }

    #[test]
    fn test_mark_point_near_border_is_clipped() {
        let mut img = RgbImage::new(10, 10);
        mark_point(&mut img, Pixel::new(0.0, 9.0), 5, 40);
        assert_eq!(*img.get_pixel(0, 9), MARK);
    }

    #[test]
    fn test_draw_axis_spans_image() {
        let mut img = RgbImage::new(20, 30);
        draw_axis(&mut img, Pixel::new(10.0, 15.0), 0.0);

        for y in 0..30 {
            assert_eq!(*img.get_pixel(10, y), MARK);
        }
        assert_eq!(img.get_pixel(11, 15).0, [0, 0, 0]);
    }
}
