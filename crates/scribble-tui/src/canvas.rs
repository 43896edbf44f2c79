//! Half-block rendering of the drawing surface
//!
//! One terminal cell covers `CELL_WIDTH` x `CELL_HEIGHT` logical pixels and
//! shows two stacked samples (upper and lower half) through `▀`.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
};
use scribble_core::{Point, Surface};

/// Logical pixels per terminal column
pub const CELL_WIDTH: f32 = 8.0;
/// Logical pixels per terminal row
pub const CELL_HEIGHT: f32 = 16.0;

const BACKGROUND: Color = Color::Rgb(24, 24, 27);
const UPPER_HALF: &str = "▀";

/// Logical surface size that exactly fills `area`
pub fn logical_size(area: Rect) -> (f32, f32) {
    (
        f32::from(area.width) * CELL_WIDTH,
        f32::from(area.height) * CELL_HEIGHT,
    )
}

/// Map a terminal cell to the logical point at its center.
///
/// Returns `None` outside `area`.
pub fn cell_to_point(area: Rect, column: u16, row: u16) -> Option<Point> {
    if column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }
    Some(Point::new(
        (f32::from(column - area.x) + 0.5) * CELL_WIDTH,
        (f32::from(row - area.y) + 0.5) * CELL_HEIGHT,
    ))
}

pub struct CanvasWidget<'a> {
    surface: &'a Surface,
}

impl<'a> CanvasWidget<'a> {
    pub fn new(surface: &'a Surface) -> Self {
        Self { surface }
    }
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let half = CELL_HEIGHT / 2.0;
        for row in 0..area.height {
            for col in 0..area.width {
                let lx = f32::from(col) * CELL_WIDTH;
                let ly = f32::from(row) * CELL_HEIGHT;
                let upper = sample_block(self.surface, lx, ly, CELL_WIDTH, half);
                let lower = sample_block(self.surface, lx, ly + half, CELL_WIDTH, half);

                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(UPPER_HALF)
                        .set_fg(upper.map(to_color).unwrap_or(BACKGROUND))
                        .set_bg(lower.map(to_color).unwrap_or(BACKGROUND));
                }
            }
        }
    }
}

/// First painted backing pixel inside a logical rectangle
fn sample_block(surface: &Surface, x: f32, y: f32, width: f32, height: f32) -> Option<[u8; 4]> {
    let scale = surface.device_pixel_ratio();
    let (backing_w, backing_h) = surface.backing_size();

    let x0 = (x * scale).floor() as u32;
    let y0 = (y * scale).floor() as u32;
    let x1 = (((x + width) * scale).ceil() as u32).min(backing_w);
    let y1 = (((y + height) * scale).ceil() as u32).min(backing_h);

    (y0..y1)
        .flat_map(|py| (x0..x1).map(move |px| (px, py)))
        .filter_map(|(px, py)| surface.pixel(px, py))
        .find(|rgba| rgba[3] > 0)
}

fn to_color(rgba: [u8; 4]) -> Color {
    Color::Rgb(rgba[0], rgba[1], rgba[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_point_centers() {
        let area = Rect::new(2, 3, 10, 5);
        assert_eq!(cell_to_point(area, 2, 3), Some(Point::new(4.0, 8.0)));
        assert_eq!(cell_to_point(area, 11, 7), Some(Point::new(76.0, 72.0)));
    }

    #[test]
    fn test_cell_to_point_outside_area() {
        let area = Rect::new(2, 3, 10, 5);
        assert_eq!(cell_to_point(area, 1, 3), None);
        assert_eq!(cell_to_point(area, 12, 3), None);
        assert_eq!(cell_to_point(area, 2, 8), None);
    }

    #[test]
    fn test_logical_size_follows_area() {
        assert_eq!(logical_size(Rect::new(0, 0, 40, 10)), (320.0, 160.0));
    }

    #[test]
    fn test_render_shows_painted_half() {
        let area = Rect::new(0, 0, 2, 1);
        let mut surface = Surface::new(16.0, 16.0, 1.0, 4.0);
        surface.set_color([255, 0, 0, 255]);
        // Dot in the upper half of the first cell
        surface.begin_stroke(Point::new(4.0, 4.0));
        surface.end_stroke();

        let mut buf = Buffer::empty(area);
        CanvasWidget::new(&surface).render(area, &mut buf);

        let first = &buf[(0, 0)];
        assert_eq!(first.fg, Color::Rgb(255, 0, 0));
        assert_eq!(first.bg, BACKGROUND);

        let second = &buf[(1, 0)];
        assert_eq!(second.fg, BACKGROUND);
        assert_eq!(second.bg, BACKGROUND);
    }
}
