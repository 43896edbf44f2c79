//! Spinner shown while the judge is working

use ratatui::{
    style::{Color, Style},
    text::Span,
};
use std::time::{Duration, Instant};

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug)]
pub struct Spinner {
    current_frame: usize,
    last_update: Instant,
    frame_duration: Duration,
    color: Color,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            current_frame: 0,
            last_update: Instant::now(),
            frame_duration: Duration::from_millis(80),
            color: Color::Yellow,
        }
    }

    /// Advance at most one frame per `frame_duration` (call on each render)
    pub fn tick(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_update) >= self.frame_duration {
            self.current_frame = (self.current_frame + 1) % FRAMES.len();
            self.last_update = now;
        }
    }

    pub fn render(&self) -> Span<'static> {
        Span::styled(FRAMES[self.current_frame], Style::default().fg(self.color))
    }
}
