//! Toast notifications for submit results and purchases

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
    Info,
}

impl ToastKind {
    pub fn color(&self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
            Self::Info => Color::Cyan,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
            Self::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        // Errors stay up twice as long
        let duration = match kind {
            ToastKind::Error => Duration::from_secs(6),
            _ => Duration::from_secs(3),
        };
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
            duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Info)
    }
}

/// Stack of live toasts, newest at the bottom
#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    const MAX_VISIBLE: usize = 4;
    const HEIGHT: u16 = 3;

    pub fn new() -> Self {
        Self { toasts: Vec::new() }
    }

    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn clear_expired(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.clear_expired();
        if self.toasts.is_empty() {
            return;
        }

        let skip = self.toasts.len().saturating_sub(Self::MAX_VISIBLE);
        let visible = &self.toasts[skip..];

        let mut y = area
            .height
            .saturating_sub(visible.len() as u16 * Self::HEIGHT + 2);

        for toast in visible {
            let width = (toast.message.chars().count() + 6).min(area.width as usize) as u16;
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(width) / 2,
                y: area.y + y,
                width,
                height: Self::HEIGHT.min(area.height),
            };
            render_single_toast(frame, toast_area, toast);
            y += Self::HEIGHT;
        }
    }
}

fn render_single_toast(frame: &mut Frame, area: Rect, toast: &Toast) {
    let color = toast.kind.color();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let content = Line::from(vec![
        Span::styled(
            format!("{} ", toast.kind.icon()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(toast.message.as_str(), Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
}
