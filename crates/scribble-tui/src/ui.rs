//! TUI rendering logic

use crate::app::App;
use crate::canvas::CanvasWidget;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use scribble_core::economy::shop_item;
use scribble_core::{ColorId, ScoringGateway, SessionState};

const SHOP_WIDTH: u16 = 28;

pub fn render<G>(frame: &mut Frame, app: &mut App<G>)
where
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());
    let screen = frame.area();

    render_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SHOP_WIDTH)])
        .split(chunks[1]);

    let canvas_block = Block::default()
        .borders(Borders::ALL)
        .title(" Canvas ")
        .border_style(Style::default().fg(Color::DarkGray));
    let canvas_area = canvas_block.inner(body[0]);
    frame.render_widget(canvas_block, body[0]);

    app.set_canvas_area(canvas_area);
    frame.render_widget(CanvasWidget::new(app.session.surface()), canvas_area);

    render_shop(frame, body[1], app);
    render_help(frame, chunks[2]);

    app.toasts.render(frame, screen);
}

fn render_header<G>(frame: &mut Frame, area: Rect, app: &App<G>)
where
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    let status = match app.session.state() {
        SessionState::Submitting => Span::styled(
            format!("{} judging...", app.spinner.render().content),
            Style::default().fg(Color::Yellow),
        ),
        SessionState::Drawing => Span::styled("drawing", Style::default().fg(Color::Cyan)),
        SessionState::Idle if app.session.can_submit() => {
            Span::styled("ready (s to submit)", Style::default().fg(Color::Green))
        }
        SessionState::Idle => Span::styled("idle", Style::default().fg(Color::DarkGray)),
    };

    let line = Line::from(vec![
        Span::raw(" Draw: "),
        Span::styled(
            app.session.prompt().to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Score: "),
        Span::styled(
            app.session.score().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        status,
    ]);

    let block = Block::default().borders(Borders::ALL).title(" scribble ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_shop<G>(frame: &mut Frame, area: Rect, app: &App<G>)
where
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    let wallet = app.session.wallet();
    let active = app.session.active_color();

    let items: Vec<ListItem> = ColorId::all()
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            let [r, g, b, _] = color.rgba();
            let price = if wallet.is_unlocked(color) {
                Span::styled("owned", Style::default().fg(Color::DarkGray))
            } else {
                let cost = shop_item(color).map(|item| item.cost).unwrap_or_default();
                let style = if wallet.can_afford(color) {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                };
                Span::styled(format!("{} pts", cost), style)
            };

            let marker = if color == active { "▶" } else { " " };
            let mut line = Line::from(vec![
                Span::raw(format!("{}{} ", marker, i + 1)),
                Span::styled("██", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(format!(" {:<7} ", color.name())),
                price,
            ]);
            if color == active {
                line = line.style(Style::default().add_modifier(Modifier::BOLD));
            }
            ListItem::new(line)
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Colors ");
    frame.render_widget(List::new(items).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let keys = [
        ("s", "submit"),
        ("c", "clear"),
        ("n", "new prompt"),
        ("r", "reset"),
        ("p", "save png"),
        ("1-9", "color"),
        ("q", "quit"),
    ];
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(format!(" {} ", key), Style::default().fg(Color::Cyan)),
                Span::styled(format!("{}  ", label), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
