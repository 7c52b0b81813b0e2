//! Float RGB/HSV view of a photograph with border-clamped sampling.

use image::RgbImage;

/// Convert normalised RGB to HSV.
///
/// Hue is returned in `[0, 1)`, saturation and value in `[0, 1]`.
pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let value = r.max(g).max(b);
    let chroma = value - r.min(g).min(b);
    let saturation = if value != 0.0 { chroma / value } else { 0.0 };

    let mut hue = 0.0;
    if chroma != 0.0 {
        hue = if r == value {
            ((g - b) / chroma % 6.0) / 6.0
        } else if g == value {
            ((b - r) / chroma + 2.0) / 6.0
        } else {
            ((r - g) / chroma + 4.0) / 6.0
        };
        if hue < 0.0 {
            hue += 1.0;
        }
    }

    [hue, saturation, value]
}

/// Sampling position in pixel space; components are truncated on lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: f32,
    pub y: f32,
}

impl Pixel {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint, truncated to whole pixels.
    pub fn center(a: Pixel, b: Pixel) -> Pixel {
        let half_w = ((a.x - b.x) as i32 / 2) as f32;
        let half_h = ((a.y - b.y) as i32 / 2) as f32;
        Pixel::new(b.x.trunc() + half_w, b.y.trunc() + half_h)
    }
}

/// Planar float copy of an image in both RGB and HSV.
pub struct Frame {
    width: i32,
    height: i32,
    rgb: Vec<[f32; 3]>,
    hsv: Vec<[f32; 3]>,
}

impl Frame {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let rgb: Vec<[f32; 3]> = image
            .pixels()
            .map(|p| p.0.map(|c| c as f32 / 255.0))
            .collect();
        let hsv = rgb.iter().copied().map(rgb_to_hsv).collect();

        Self {
            width: w as i32,
            height: h as i32,
            rgb,
            hsv,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True if the truncated position lies inside the image.
    #[inline]
    pub fn contains(&self, p: Pixel) -> bool {
        let (x, y) = (p.x as i32, p.y as i32);
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn index(&self, p: Pixel) -> usize {
        let x = (p.x as i32).clamp(0, self.width - 1);
        let y = (p.y as i32).clamp(0, self.height - 1);
        (y * self.width + x) as usize
    }

    /// RGB at `p`, clamped to the border.
    #[inline]
    pub fn rgb(&self, p: Pixel) -> [f32; 3] {
        self.rgb[self.index(p)]
    }

    /// HSV at `p`, clamped to the border.
    #[inline]
    pub fn hsv(&self, p: Pixel) -> [f32; 3] {
        self.hsv[self.index(p)]
    }

    /// Sum of absolute per-channel RGB differences between two pixels.
    pub fn contrast(&self, a: Pixel, b: Pixel) -> f32 {
        let (pa, pb) = (self.rgb(a), self.rgb(b));
        (pa[0] - pb[0]).abs() + (pa[1] - pb[1]).abs() + (pa[2] - pb[2]).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert!(approx(rgb_to_hsv([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]));
        assert!(approx(rgb_to_hsv([0.0, 1.0, 0.0]), [1.0 / 3.0, 1.0, 1.0]));
        assert!(approx(rgb_to_hsv([0.0, 0.0, 1.0]), [2.0 / 3.0, 1.0, 1.0]));
    }

    #[test]
    fn test_rgb_to_hsv_magenta_wraps() {
        let [h, _, _] = rgb_to_hsv([1.0, 0.0, 0.5]);
        assert!((h - 11.0 / 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_rgb_to_hsv_gray_and_black() {
        assert!(approx(rgb_to_hsv([0.5, 0.5, 0.5]), [0.0, 0.0, 0.5]));
        assert!(approx(rgb_to_hsv([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_frame_clamps_lookups() {
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(2, 1, Rgb([255, 255, 255]));
        let frame = Frame::from_rgb(&img);

        assert_eq!(frame.rgb(Pixel::new(50.0, 50.0)), [1.0, 1.0, 1.0]);
        assert_eq!(frame.rgb(Pixel::new(-4.0, -4.0)), [0.0, 0.0, 0.0]);
        assert!(frame.contains(Pixel::new(2.9, 1.5)));
        assert!(!frame.contains(Pixel::new(3.0, 0.0)));
        assert_eq!(frame.contrast(Pixel::new(0.0, 0.0), Pixel::new(2.0, 1.0)), 3.0);
    }

    #[test]
    fn test_center_truncates() {
        let c = Pixel::center(Pixel::new(109.0, 50.0), Pixel::new(80.0, 50.0));
        assert_eq!(c, Pixel::new(94.0, 50.0));
    }
}
