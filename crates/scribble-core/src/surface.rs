//! Raster drawing surface and stroke capture
//!
//! The surface IS the drawing: strokes are rasterized into the backing
//! buffer as they arrive and nothing else is retained. Coordinates come in
//! logical units and are scaled by the device pixel ratio, so a resize always
//! recomputes both the backing resolution and the transform.

use crate::error::CoreError;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// A pointer position in logical (unscaled) units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Largest backing buffer side, in device pixels
pub const MAX_BACKING_SIDE: u32 = 16_384;

/// Raster surface with a single active stroke at most
#[derive(Debug, Clone)]
pub struct Surface {
    /// Logical width
    width: f32,
    /// Logical height
    height: f32,
    device_pixel_ratio: f32,
    pixels: RgbaImage,
    /// Brush diameter in logical pixels
    brush_width: f32,
    color: Rgba<u8>,
    /// Last point of the active stroke (None when the pointer is up)
    cursor: Option<Point>,
    empty: bool,
}

impl Surface {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32, brush_width: f32) -> Self {
        let mut surface = Self {
            width: 0.0,
            height: 0.0,
            device_pixel_ratio: 1.0,
            pixels: RgbaImage::new(0, 0),
            brush_width: sanitize_positive(brush_width, 4.0),
            color: Rgba([255, 255, 255, 255]),
            cursor: None,
            empty: true,
        };
        surface.resize(width, height, device_pixel_ratio);
        surface
    }

    /// Recompute backing resolution and transform; wipes all content.
    ///
    /// An in-progress stroke is dropped as well: resize always wins.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.width = sanitize_non_negative(width);
        self.height = sanitize_non_negative(height);
        self.device_pixel_ratio = sanitize_positive(device_pixel_ratio, 1.0);

        let backing_w = backing_side(self.width, self.device_pixel_ratio);
        let backing_h = backing_side(self.height, self.device_pixel_ratio);
        self.pixels = RgbaImage::new(backing_w, backing_h);
        self.cursor = None;
        self.empty = true;

        tracing::debug!(
            width = self.width,
            height = self.height,
            dpr = self.device_pixel_ratio,
            backing_w,
            backing_h,
            "Surface resized"
        );
    }

    /// Start a stroke at `point` and mark the surface non-empty
    pub fn begin_stroke(&mut self, point: Point) {
        self.stamp_segment(point, point);
        self.cursor = Some(point);
        self.empty = false;
    }

    /// Draw a segment from the last point to `point`; ignored without an active stroke
    pub fn extend_stroke(&mut self, point: Point) {
        let Some(last) = self.cursor else {
            return;
        };
        self.stamp_segment(last, point);
        self.cursor = Some(point);
    }

    pub fn end_stroke(&mut self) {
        self.cursor = None;
    }

    /// Erase everything and reset the empty flag
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT;
        }
        self.cursor = None;
        self.empty = true;
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_stroke_active(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn set_color(&mut self, rgba: [u8; 4]) {
        self.color = Rgba(rgba);
    }

    pub fn color(&self) -> [u8; 4] {
        self.color.0
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Backing pixel at `(x, y)`, None when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// PNG-encode the backing buffer
    pub fn encode_png(&self) -> Result<Vec<u8>, CoreError> {
        if self.pixels.width() == 0 || self.pixels.height() == 0 {
            return Err(CoreError::ImageEncode {
                message: "surface has zero area".to_string(),
            });
        }

        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CoreError::ImageEncode {
                message: e.to_string(),
            })?;
        Ok(bytes)
    }

    /// `data:image/png;base64,...` form of the surface
    pub fn to_data_url(&self) -> Result<String, CoreError> {
        Ok(png_data_url(&self.encode_png()?))
    }

    /// Rasterize a round-capped segment. Pixels whose centers lie within the
    /// brush radius of the segment get the current color, which also yields
    /// round joins between consecutive segments.
    fn stamp_segment(&mut self, from: Point, to: Point) {
        let (w, h) = self.pixels.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let scale = self.device_pixel_ratio;
        let (ax, ay) = (from.x * scale, from.y * scale);
        let (bx, by) = (to.x * scale, to.y * scale);
        let radius = self.brush_width * scale / 2.0;

        let min_x = (ax.min(bx) - radius).floor().max(0.0);
        let min_y = (ay.min(by) - radius).floor().max(0.0);
        let max_x = (ax.max(bx) + radius).ceil().min(w as f32 - 1.0);
        let max_y = (ay.max(by) + radius).ceil().min(h as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx * dx + dy * dy;
        let radius_sq = radius * radius;

        for py in min_y as u32..=max_y as u32 {
            for px in min_x as u32..=max_x as u32 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                let t = if len_sq > 0.0 {
                    (((cx - ax) * dx + (cy - ay) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let nx = ax + t * dx - cx;
                let ny = ay + t * dy - cy;
                if nx * nx + ny * ny <= radius_sq {
                    self.pixels.put_pixel(px, py, self.color);
                }
            }
        }
    }
}

/// Wrap PNG bytes as a base64 data URL
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

fn sanitize_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn backing_side(logical: f32, device_pixel_ratio: f32) -> u32 {
    let scaled = (logical * device_pixel_ratio).floor();
    if scaled.is_finite() {
        (scaled as u32).min(MAX_BACKING_SIDE)
    } else {
        MAX_BACKING_SIDE
    }
}

fn sanitize_positive(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(surface: &Surface) -> usize {
        surface.image().pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_new_surface_is_empty() {
        let surface = Surface::new(100.0, 50.0, 1.0, 4.0);
        assert!(surface.is_empty());
        assert!(!surface.is_stroke_active());
        assert_eq!(surface.backing_size(), (100, 50));
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_begin_stroke_marks_non_empty_and_paints() {
        let mut surface = Surface::new(100.0, 100.0, 1.0, 4.0);
        surface.begin_stroke(Point::new(50.0, 50.0));

        assert!(!surface.is_empty());
        assert!(surface.is_stroke_active());
        assert_eq!(surface.pixel(50, 50), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_extend_without_active_stroke_is_noop() {
        let mut surface = Surface::new(100.0, 100.0, 1.0, 4.0);
        surface.extend_stroke(Point::new(10.0, 10.0));
        assert!(surface.is_empty());
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_extend_draws_segment_in_current_color() {
        let mut surface = Surface::new(100.0, 100.0, 1.0, 4.0);
        surface.set_color([255, 0, 0, 255]);
        surface.begin_stroke(Point::new(10.0, 50.0));
        surface.extend_stroke(Point::new(90.0, 50.0));
        surface.end_stroke();

        for x in [10, 30, 50, 70, 89] {
            assert_eq!(surface.pixel(x, 50), Some([255, 0, 0, 255]), "x = {}", x);
        }
        // Away from the line stays transparent
        assert_eq!(surface.pixel(50, 10), Some([0, 0, 0, 0]));
        assert!(!surface.is_stroke_active());
    }

    #[test]
    fn test_extend_after_end_is_ignored() {
        let mut surface = Surface::new(100.0, 100.0, 1.0, 4.0);
        surface.begin_stroke(Point::new(10.0, 10.0));
        surface.end_stroke();
        let before = painted(&surface);

        surface.extend_stroke(Point::new(90.0, 90.0));
        assert_eq!(painted(&surface), before);
    }

    #[test]
    fn test_clear_resets_flag_and_pixels() {
        let mut surface = Surface::new(64.0, 64.0, 1.0, 4.0);
        surface.begin_stroke(Point::new(32.0, 32.0));
        surface.extend_stroke(Point::new(40.0, 40.0));

        surface.clear();

        assert!(surface.is_empty());
        assert!(!surface.is_stroke_active());
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_resize_mid_stroke_clears_and_drops_stroke() {
        let mut surface = Surface::new(64.0, 64.0, 1.0, 4.0);
        surface.begin_stroke(Point::new(10.0, 10.0));
        surface.extend_stroke(Point::new(20.0, 20.0));

        surface.resize(80.0, 40.0, 1.0);

        assert!(surface.is_empty());
        assert!(!surface.is_stroke_active());
        assert_eq!(painted(&surface), 0);
        assert_eq!(surface.backing_size(), (80, 40));

        // Move events after the resize must not resume the old stroke
        surface.extend_stroke(Point::new(30.0, 30.0));
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_resize_clamps_unbounded_dimensions() {
        let mut surface = Surface::new(64.0, 64.0, 1.0, 4.0);

        surface.resize(f32::INFINITY, f32::NAN, 1.0);
        assert_eq!(surface.backing_size(), (0, 0));
        assert_eq!(surface.logical_size(), (0.0, 0.0));

        surface.resize(1.0e9, 2.0, 1.0);
        assert_eq!(surface.backing_size(), (MAX_BACKING_SIDE, 2));
    }

    #[test]
    fn test_device_pixel_ratio_scales_backing_not_content() {
        let mut surface = Surface::new(50.0, 25.0, 2.0, 4.0);
        assert_eq!(surface.backing_size(), (100, 50));

        // Logical (20, 10) lands at backing (40, 20)
        surface.begin_stroke(Point::new(20.0, 10.0));
        assert_eq!(surface.pixel(40, 20), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(20, 10), Some([0, 0, 0, 0]));

        surface.resize(50.0, 25.0, 3.0);
        assert_eq!(surface.backing_size(), (150, 75));
        assert_eq!(surface.device_pixel_ratio(), 3.0);
    }

    #[test]
    fn test_fractional_backing_size_is_floored() {
        let surface = Surface::new(10.5, 10.5, 1.5, 4.0);
        assert_eq!(surface.backing_size(), (15, 15));
    }

    #[test]
    fn test_invalid_dpr_falls_back_to_one() {
        let surface = Surface::new(10.0, 10.0, 0.0, 4.0);
        assert_eq!(surface.device_pixel_ratio(), 1.0);
        assert_eq!(surface.backing_size(), (10, 10));
    }

    #[test]
    fn test_points_outside_surface_are_clipped() {
        let mut surface = Surface::new(20.0, 20.0, 1.0, 4.0);
        surface.begin_stroke(Point::new(-50.0, -50.0));
        surface.extend_stroke(Point::new(-40.0, -40.0));
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_data_url_prefix() {
        let mut surface = Surface::new(8.0, 8.0, 1.0, 2.0);
        surface.begin_stroke(Point::new(4.0, 4.0));
        let url = surface.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let png = surface.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_zero_area_surface_cannot_encode() {
        let surface = Surface::new(0.0, 10.0, 1.0, 4.0);
        assert!(matches!(
            surface.encode_png(),
            Err(CoreError::ImageEncode { .. })
        ));
    }
}
