//! TUI application state: session, pending judge call, toasts

use crate::components::{Spinner, Toast, ToastManager};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use scribble_core::{
    ColorId, GameEvent, GameSession, GatewayError, ScoreResponse, ScoringGateway,
    SessionState, SubmitBlocked, SubmitOutcome, SubmitTicket,
};
use std::path::PathBuf;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use crate::canvas;

type JudgeResult = Result<ScoreResponse, GatewayError>;

/// A judge call running on the runtime, applied once its answer arrives
struct PendingSubmit {
    ticket: SubmitTicket,
    rx: oneshot::Receiver<JudgeResult>,
}

pub struct App<G> {
    pub session: GameSession,
    gateway: G,
    export_dir: PathBuf,
    event_rx: broadcast::Receiver<GameEvent>,
    pending: Option<PendingSubmit>,
    pub toasts: ToastManager,
    pub spinner: Spinner,
    /// Screen area the canvas occupied on the last render
    canvas_area: Rect,
    pub should_quit: bool,
}

impl<G> App<G>
where
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    pub fn new(session: GameSession, gateway: G, export_dir: PathBuf) -> Self {
        let event_rx = session.events().subscribe();
        Self {
            session,
            gateway,
            export_dir,
            event_rx,
            pending: None,
            toasts: ToastManager::new(),
            spinner: Spinner::new(),
            canvas_area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.session.state() == SessionState::Submitting
    }

    pub fn canvas_area(&self) -> Rect {
        self.canvas_area
    }

    /// Track the canvas rectangle; a size change resizes (and clears) the surface
    pub fn set_canvas_area(&mut self, area: Rect) {
        if area == self.canvas_area {
            return;
        }
        let size_changed =
            area.width != self.canvas_area.width || area.height != self.canvas_area.height;
        self.canvas_area = area;

        if size_changed {
            let (width, height) = canvas::logical_size(area);
            let dpr = self.session.surface().device_pixel_ratio();
            self.session.resize(width, height, dpr);
            debug!(width, height, "Canvas resized");
        }
    }

    /// Handle a key press. Returns true if the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('s') | KeyCode::Enter => self.start_submit(),
            KeyCode::Char('c') => self.session.clear(),
            KeyCode::Char('r') => {
                self.session.reset();
                self.toasts.push(Toast::info("New round"));
            }
            KeyCode::Char('n') => {
                self.session.new_prompt();
            }
            KeyCode::Char('p') => self.save_image(),
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                if let Some(&color) = ColorId::all().get(index) {
                    self.buy_or_select(color);
                }
            }
            _ => return false,
        }
        true
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = canvas::cell_to_point(self.canvas_area, mouse.column, mouse.row);
        match (mouse.kind, point) {
            (MouseEventKind::Down(MouseButton::Left), Some(point)) => {
                self.session.pointer_down(point);
            }
            (MouseEventKind::Drag(MouseButton::Left), Some(point)) => {
                self.session.pointer_move(point);
            }
            (MouseEventKind::Drag(MouseButton::Left), None) => self.session.pointer_leave(),
            (MouseEventKind::Up(MouseButton::Left), _) => self.session.pointer_up(),
            _ => {}
        }
    }

    /// Selects `color` if owned, otherwise tries to buy it first
    fn buy_or_select(&mut self, color: ColorId) {
        if !self.session.wallet().is_unlocked(color) {
            if let Err(e) = self.session.purchase(color) {
                self.toasts.push(Toast::warning(e.to_string()));
                return;
            }
        }
        self.session.set_active_color(color);
    }

    fn save_image(&mut self) {
        match self.session.save_image(&self.export_dir) {
            Ok(path) => self
                .toasts
                .push(Toast::success(format!("Saved {}", path.display()))),
            Err(e) => {
                warn!(error = %e, "Failed to save drawing");
                self.toasts.push(Toast::error(format!("Save failed: {}", e)));
            }
        }
    }

    /// Capture the drawing and spawn the judge call
    pub fn start_submit(&mut self) {
        let ticket = match self.session.begin_submit() {
            Ok(ticket) => ticket,
            Err(SubmitBlocked::EmptySurface) => {
                self.toasts.push(Toast::info("Draw something first"));
                return;
            }
            Err(SubmitBlocked::InFlight) => return,
            Err(SubmitBlocked::Encode(message)) => {
                self.toasts
                    .push(Toast::error(format!("Could not encode drawing: {}", message)));
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        let gateway = self.gateway.clone();
        let prompt = ticket.prompt().to_string();
        let image_data_url = ticket.image_data_url().to_string();
        tokio::spawn(async move {
            let result = gateway.score(&prompt, &image_data_url).await;
            let _ = tx.send(result);
        });

        self.pending = Some(PendingSubmit { ticket, rx });
    }

    /// Apply the judge's answer if it has arrived
    pub fn poll_submit(&mut self) -> Option<SubmitOutcome> {
        let mut pending = self.pending.take()?;

        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => {
                self.pending = Some(pending);
                return None;
            }
            Err(oneshot::error::TryRecvError::Closed) => Err(GatewayError::Transport {
                message: "judge task ended without an answer".to_string(),
            }),
        };

        let outcome = self.session.finish_submit(pending.ticket, result);
        if outcome == SubmitOutcome::Discarded {
            debug!("Ignored judge answer from the previous round");
        }
        Some(outcome)
    }

    /// Drain session events into toasts
    pub fn poll_events(&mut self) {
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => self.on_event(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Session events lagged");
                }
                Err(_) => break,
            }
        }
    }

    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::SubmitSucceeded { judged, awarded } => {
                self.toasts.push(Toast::success(format!(
                    "Judged {}/100, +{} points",
                    judged, awarded
                )));
            }
            GameEvent::SubmitFailed(message) => {
                self.toasts
                    .push(Toast::error(format!("Submit failed: {}", message)));
            }
            GameEvent::ColorUnlocked(color) => {
                self.toasts
                    .push(Toast::success(format!("Unlocked {}", color.name())));
            }
            _ => {}
        }
    }

    /// One iteration of background work between frames
    pub fn tick(&mut self) {
        self.poll_submit();
        self.poll_events();
        if self.is_submitting() {
            self.spinner.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_core::{parse_score, GameConfig, Point, PromptSource};
    use std::time::Duration;

    #[derive(Clone)]
    struct FixedJudge(&'static str);

    impl ScoringGateway for FixedJudge {
        async fn score(&self, _prompt: &str, _image: &str) -> Result<ScoreResponse, GatewayError> {
            Ok(ScoreResponse {
                output: parse_score(self.0),
                raw: self.0.to_string(),
            })
        }
    }

    fn app(answer: &'static str) -> App<FixedJudge> {
        let session = GameSession::new(
            &GameConfig::default(),
            PromptSource::with_seed(3).with_prompts(["Tree", "Boat"]),
        );
        let mut app = App::new(session, FixedJudge(answer), std::env::temp_dir());
        app.set_canvas_area(Rect::new(0, 1, 20, 10));
        app
    }

    fn press(app: &mut App<FixedJudge>, c: char) {
        app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_canvas_area_resizes_surface() {
        let app = app("50");
        assert_eq!(app.session.surface().logical_size(), (160.0, 160.0));
    }

    #[test]
    fn test_mouse_drag_draws() {
        let mut app = app("50");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        assert_eq!(app.session.state(), SessionState::Drawing);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6, 4));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6, 4));

        assert_eq!(app.session.state(), SessionState::Idle);
        assert!(!app.session.is_surface_empty());
    }

    #[test]
    fn test_drag_outside_canvas_ends_stroke() {
        let mut app = app("50");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 50, 0));
        assert_eq!(app.session.state(), SessionState::Idle);
    }

    #[test]
    fn test_click_outside_canvas_ignored() {
        let mut app = app("50");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 30, 0));
        assert!(app.session.is_surface_empty());
    }

    #[test]
    fn test_locked_color_without_score_warns() {
        let mut app = app("50");
        press(&mut app, '2');
        app.poll_events();

        assert_eq!(app.session.active_color(), ColorId::White);
        assert_eq!(app.toasts.toasts().len(), 1);
    }

    #[test]
    fn test_submit_on_empty_surface_shows_hint() {
        let mut app = app("50");
        press(&mut app, 's');
        assert!(!app.is_submitting());
        assert_eq!(app.toasts.toasts()[0].message, "Draw something first");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app("50");
        app.handle_key(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.should_quit);

        let mut app = self::app("50");
        press(&mut app, 'q');
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_submit_round_trip_rewards_and_unlocks() {
        let mut app = app("60");
        app.session.pointer_down(Point::new(20.0, 20.0));
        app.session.pointer_up();

        press(&mut app, 's');
        assert!(app.is_submitting());

        let mut outcome = None;
        for _ in 0..100 {
            if let Some(o) = app.poll_submit() {
                outcome = Some(o);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(matches!(outcome, Some(SubmitOutcome::Scored { judged: 60, .. })));
        assert_eq!(app.session.score(), 60);
        assert!(app.session.is_surface_empty());

        // Red costs 50
        press(&mut app, '2');
        assert_eq!(app.session.active_color(), ColorId::Red);
        assert_eq!(app.session.score(), 10);

        app.poll_events();
        assert!(app
            .toasts
            .toasts()
            .iter()
            .any(|t| t.message == "Unlocked Red"));
    }
}
