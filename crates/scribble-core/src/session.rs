//! Drawing session controller
//!
//! Single mutator: every entry point takes `&mut self` and the judge call is
//! the only suspension point. Frontends that must keep capturing strokes
//! while the judge works split a submission in three: [`GameSession::begin_submit`]
//! hands out a [`SubmitTicket`], the caller awaits the gateway however it
//! likes, then [`GameSession::finish_submit`] applies the result.
//!
//! ```text
//!   Idle ──pointer_down──▶ Drawing ──pointer_up/leave──▶ Idle
//!   Idle ──begin_submit (surface non-empty)──▶ Submitting
//!   Submitting ──finish_submit(ok)──▶ Idle   reward, next prompt, clear
//!   Submitting ──finish_submit(err)──▶ Idle  drawing, prompt, score untouched
//!   any ──reset──▶ Idle                      score 0, clear, next prompt
//! ```

use crate::config::GameConfig;
use crate::economy::{ColorId, PurchaseError, Wallet};
use crate::error::CoreError;
use crate::event::{EventBus, GameEvent};
use crate::export::export_png;
use crate::gateway::{GatewayError, ScoreResponse, ScoringGateway};
use crate::prompts::PromptSource;
use crate::surface::{Point, Surface};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No active stroke, no judge call in flight
    Idle,
    /// Pointer held down
    Drawing,
    /// Judge call in flight (drawing is still accepted)
    Submitting,
}

/// Why a submission did not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// Nothing drawn yet
    EmptySurface,
    /// A judge call for this session is still running
    InFlight,
    /// The surface could not be encoded
    Encode(String),
}

/// A drawing handed to the judge. Consumed by [`GameSession::finish_submit`].
#[derive(Debug)]
pub struct SubmitTicket {
    prompt: String,
    image_data_url: String,
    epoch: u64,
}

impl SubmitTicket {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image_data_url(&self) -> &str {
        &self.image_data_url
    }
}

/// Result of a submission as seen by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Reward applied, prompt advanced, surface cleared
    Scored {
        judged: u32,
        awarded: u64,
        next_prompt: String,
    },
    /// Judge answered without a usable number; nothing changed
    Unscored { raw: String },
    /// Judge call failed; nothing changed
    Failed { status: u16, message: String },
    /// Submission never started
    Blocked(SubmitBlocked),
    /// Result arrived after a reset and was dropped
    Discarded,
}

/// One player's game: surface, wallet, prompt and submission state
pub struct GameSession {
    surface: Surface,
    wallet: Wallet,
    prompts: PromptSource,
    prompt: String,
    reward_multiplier: u64,
    in_flight: bool,
    /// Bumped on reset; tickets from an older epoch are stale
    epoch: u64,
    events: EventBus,
}

impl GameSession {
    pub fn new(config: &GameConfig, prompts: PromptSource) -> Self {
        let canvas = config.canvas;
        Self {
            surface: Surface::new(
                canvas.width,
                canvas.height,
                canvas.device_pixel_ratio,
                config.brush_width,
            ),
            wallet: Wallet::new(),
            prompts,
            prompt: config.default_prompt.clone(),
            reward_multiplier: config.reward_multiplier.max(1),
            in_flight: false,
            epoch: 0,
            events: EventBus::default_capacity(),
        }
    }

    // ===================
    // Accessors
    // ===================

    pub fn state(&self) -> SessionState {
        if self.in_flight {
            SessionState::Submitting
        } else if self.surface.is_stroke_active() {
            SessionState::Drawing
        } else {
            SessionState::Idle
        }
    }

    pub fn score(&self) -> u64 {
        self.wallet.score()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_surface_empty(&self) -> bool {
        self.surface.is_empty()
    }

    /// Submit is enabled exactly when something is drawn and no call is running
    pub fn can_submit(&self) -> bool {
        !self.surface.is_empty() && !self.in_flight
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn active_color(&self) -> ColorId {
        self.wallet.active_color()
    }

    pub fn reward_multiplier(&self) -> u64 {
        self.reward_multiplier
    }

    pub fn prompts(&self) -> &PromptSource {
        &self.prompts
    }

    /// For reloading the prompt list at runtime
    pub fn prompts_mut(&mut self) -> &mut PromptSource {
        &mut self.prompts
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ===================
    // Stroke input
    // ===================

    pub fn pointer_down(&mut self, point: Point) {
        self.surface.begin_stroke(point);
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.surface.extend_stroke(point);
    }

    pub fn pointer_up(&mut self) {
        self.surface.end_stroke();
    }

    pub fn pointer_leave(&mut self) {
        self.surface.end_stroke();
    }

    /// Resize the surface; always clears, even mid-stroke
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        let had_content = !self.surface.is_empty();
        self.surface.resize(width, height, device_pixel_ratio);
        if had_content {
            debug!("Resize discarded the current drawing");
        }
        self.events.publish(GameEvent::SurfaceCleared);
    }

    /// User-triggered clear: surface only, score and prompt untouched
    pub fn clear(&mut self) {
        self.surface.clear();
        self.events.publish(GameEvent::SurfaceCleared);
    }

    // ===================
    // Prompts
    // ===================

    /// Draw a new prompt; keeps the current one when no list has loaded
    pub fn new_prompt(&mut self) -> &str {
        if let Some(next) = self.prompts.next() {
            self.prompt = next;
            self.events.publish(GameEvent::PromptChanged(self.prompt.clone()));
        } else {
            debug!(prompt = %self.prompt, "No prompt list loaded, keeping current prompt");
        }
        &self.prompt
    }

    // ===================
    // Economy
    // ===================

    pub fn purchase(&mut self, color: ColorId) -> Result<u64, PurchaseError> {
        let remaining = self.wallet.purchase(color)?;
        info!(color = color.name(), remaining, "Unlocked color");
        self.events.publish(GameEvent::ColorUnlocked(color));
        self.events.publish(GameEvent::ScoreChanged(remaining));
        Ok(remaining)
    }

    /// Returns false (no change) when `color` is locked
    pub fn set_active_color(&mut self, color: ColorId) -> bool {
        if !self.wallet.set_active_color(color) {
            return false;
        }
        self.surface.set_color(color.rgba());
        self.events.publish(GameEvent::ActiveColorChanged(color));
        true
    }

    // ===================
    // Reset
    // ===================

    /// Back to a fresh round: score 0, surface cleared, new prompt.
    ///
    /// A judge call already in flight still runs to completion (so calls
    /// never overlap) but its result is discarded.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.wallet.reset_score();
        self.surface.clear();
        self.events.publish(GameEvent::ScoreChanged(0));
        self.events.publish(GameEvent::SurfaceCleared);
        self.new_prompt();
        info!(epoch = self.epoch, "Session reset");
    }

    // ===================
    // Submission
    // ===================

    /// Capture the surface for judging and enter `Submitting`
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitBlocked> {
        if self.in_flight {
            return Err(SubmitBlocked::InFlight);
        }
        if self.surface.is_empty() {
            return Err(SubmitBlocked::EmptySurface);
        }

        let image_data_url = self
            .surface
            .to_data_url()
            .map_err(|e: CoreError| SubmitBlocked::Encode(e.to_string()))?;

        self.in_flight = true;
        self.events.publish(GameEvent::SubmitStarted);
        debug!(prompt = %self.prompt, bytes = image_data_url.len(), "Submitting drawing");

        Ok(SubmitTicket {
            prompt: self.prompt.clone(),
            image_data_url,
            epoch: self.epoch,
        })
    }

    /// Apply the judge's answer for `ticket`. Never fails: errors become outcomes.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<ScoreResponse, GatewayError>,
    ) -> SubmitOutcome {
        self.in_flight = false;

        if ticket.epoch != self.epoch {
            debug!(
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "Dropping judge result from before reset"
            );
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(response) if response.is_scored() => {
                let judged = response.output;
                let awarded = u64::from(judged).saturating_mul(self.reward_multiplier);
                let score = self.wallet.reward(awarded);
                info!(judged, awarded, score, prompt = %ticket.prompt, "Drawing scored");

                self.events.publish(GameEvent::ScoreChanged(score));
                self.events
                    .publish(GameEvent::SubmitSucceeded { judged, awarded });
                self.new_prompt();
                self.clear();

                SubmitOutcome::Scored {
                    judged,
                    awarded,
                    next_prompt: self.prompt.clone(),
                }
            }
            Ok(response) => {
                warn!(raw = %response.raw, "Judge returned no score, keeping drawing");
                self.events
                    .publish(GameEvent::SubmitFailed("Judge returned no score".to_string()));
                SubmitOutcome::Unscored { raw: response.raw }
            }
            Err(e) => {
                if e.is_misconfiguration() {
                    error!(status = e.status(), error = %e, "Judge is misconfigured");
                } else {
                    warn!(status = e.status(), error = %e, "Submit failed, keeping drawing");
                }
                self.events.publish(GameEvent::SubmitFailed(e.to_string()));
                SubmitOutcome::Failed {
                    status: e.status(),
                    message: e.message().to_string(),
                }
            }
        }
    }

    /// Begin, await the gateway, and finish in one call
    pub async fn submit<G: ScoringGateway>(&mut self, gateway: &G) -> SubmitOutcome {
        let ticket = match self.begin_submit() {
            Ok(ticket) => ticket,
            Err(blocked) => {
                debug!(?blocked, "Submit ignored");
                return SubmitOutcome::Blocked(blocked);
            }
        };
        let result = gateway
            .score(ticket.prompt(), ticket.image_data_url())
            .await;
        self.finish_submit(ticket, result)
    }

    // ===================
    // Export
    // ===================

    /// Save the surface as `<dir>/<prompt>.png`; session state is untouched
    pub fn save_image(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        export_png(&self.surface, &self.prompt, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        let config = GameConfig {
            canvas: crate::config::CanvasConfig {
                width: 64.0,
                height: 64.0,
                device_pixel_ratio: 1.0,
            },
            ..GameConfig::default()
        };
        GameSession::new(&config, PromptSource::with_seed(1).with_prompts(["Cat", "Dog"]))
    }

    fn scored(output: u32) -> Result<ScoreResponse, GatewayError> {
        Ok(ScoreResponse {
            output,
            raw: output.to_string(),
        })
    }

    #[test]
    fn test_initial_state() {
        let s = session();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.score(), 0);
        assert_eq!(s.prompt(), "Circle");
        assert!(s.is_surface_empty());
        assert!(!s.can_submit());
        assert_eq!(s.active_color(), ColorId::White);
    }

    #[test]
    fn test_pointer_transitions() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(s.state(), SessionState::Drawing);
        assert!(s.can_submit());

        s.pointer_move(Point::new(20.0, 20.0));
        s.pointer_up();
        assert_eq!(s.state(), SessionState::Idle);

        s.pointer_down(Point::new(30.0, 30.0));
        s.pointer_leave();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_begin_submit_on_empty_surface_blocked() {
        let mut s = session();
        assert_eq!(s.begin_submit().unwrap_err(), SubmitBlocked::EmptySurface);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_only_one_submission_in_flight() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();

        let ticket = s.begin_submit().unwrap();
        assert_eq!(s.state(), SessionState::Submitting);
        assert!(!s.can_submit());
        assert_eq!(s.begin_submit().unwrap_err(), SubmitBlocked::InFlight);

        s.finish_submit(ticket, scored(10));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_drawing_allowed_while_submitting() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();

        s.pointer_down(Point::new(40.0, 40.0));
        assert_eq!(s.state(), SessionState::Submitting);
        s.pointer_up();

        assert!(matches!(
            s.finish_submit(ticket, scored(50)),
            SubmitOutcome::Scored { .. }
        ));
    }

    #[test]
    fn test_success_rewards_with_multiplier_and_advances() {
        let config = GameConfig {
            reward_multiplier: 2,
            ..GameConfig::default()
        };
        let mut s = GameSession::new(&config, PromptSource::with_seed(1).with_prompts(["Dog"]));
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();

        let ticket = s.begin_submit().unwrap();
        assert_eq!(ticket.prompt(), "Circle");
        assert!(ticket.image_data_url().starts_with("data:image/png;base64,"));

        let outcome = s.finish_submit(ticket, scored(40));

        assert_eq!(
            outcome,
            SubmitOutcome::Scored {
                judged: 40,
                awarded: 80,
                next_prompt: "Dog".to_string()
            }
        );
        assert_eq!(s.score(), 80);
        assert_eq!(s.prompt(), "Dog");
        assert!(s.is_surface_empty());
        assert!(!s.can_submit());
    }

    #[test]
    fn test_failure_keeps_everything() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();

        let outcome = s.finish_submit(
            ticket,
            Err(GatewayError::Upstream {
                status: 500,
                message: "Missing OPENAI_API_KEY on server".to_string(),
                detail: None,
            }),
        );

        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                status: 500,
                message: "Missing OPENAI_API_KEY on server".to_string()
            }
        );
        assert_eq!(s.score(), 0);
        assert_eq!(s.prompt(), "Circle");
        assert!(!s.is_surface_empty());
        assert!(s.can_submit());
    }

    #[test]
    fn test_sentinel_score_is_not_rewarded() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();

        let outcome = s.finish_submit(
            ticket,
            Ok(ScoreResponse {
                output: 0,
                raw: "cannot tell".to_string(),
            }),
        );

        assert_eq!(
            outcome,
            SubmitOutcome::Unscored {
                raw: "cannot tell".to_string()
            }
        );
        assert_eq!(s.score(), 0);
        assert!(!s.is_surface_empty());
        assert_eq!(s.prompt(), "Circle");
    }

    #[test]
    fn test_reset_while_in_flight_discards_result() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();

        s.reset();
        // Still submitting until the call finishes
        assert_eq!(s.state(), SessionState::Submitting);
        let prompt_after_reset = s.prompt().to_string();

        assert_eq!(s.finish_submit(ticket, scored(90)), SubmitOutcome::Discarded);
        assert_eq!(s.score(), 0);
        assert_eq!(s.prompt(), prompt_after_reset);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_reset_zeroes_score_and_draws_prompt() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();
        s.finish_submit(ticket, scored(70));
        s.pointer_down(Point::new(5.0, 5.0));

        s.reset();

        assert_eq!(s.score(), 0);
        assert!(s.is_surface_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(["Cat", "Dog"].contains(&s.prompt()));
    }

    #[test]
    fn test_new_prompt_without_list_keeps_default() {
        let mut s = GameSession::new(&GameConfig::default(), PromptSource::with_seed(1));
        assert_eq!(s.new_prompt(), "Circle");
    }

    #[test]
    fn test_clear_keeps_score_and_prompt() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();
        s.finish_submit(ticket, scored(60));
        let prompt = s.prompt().to_string();

        s.pointer_down(Point::new(10.0, 10.0));
        s.clear();

        assert!(s.is_surface_empty());
        assert_eq!(s.score(), 60);
        assert_eq!(s.prompt(), prompt);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_resize_during_drawing() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_move(Point::new(20.0, 10.0));

        s.resize(128.0, 96.0, 2.0);

        assert!(s.is_surface_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.surface().backing_size(), (256, 192));
        // A stray move after resize must not draw
        s.pointer_move(Point::new(30.0, 30.0));
        assert!(s.is_surface_empty());
    }

    #[test]
    fn test_active_color_follows_wallet() {
        let mut s = session();
        assert!(!s.set_active_color(ColorId::Red));
        assert_eq!(s.active_color(), ColorId::White);
        assert!(s.purchase(ColorId::Red).is_err());
    }

    #[test]
    fn test_purchase_and_draw_in_new_color() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();
        s.finish_submit(ticket, scored(60));

        assert_eq!(s.purchase(ColorId::Red), Ok(10));
        assert!(s.set_active_color(ColorId::Red));

        s.pointer_down(Point::new(32.0, 32.0));
        assert_eq!(s.surface().pixel(32, 32), Some(ColorId::Red.rgba()));
    }

    #[tokio::test]
    async fn test_events_published_on_success() {
        let mut s = session();
        let mut rx = s.events().subscribe();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_up();
        let ticket = s.begin_submit().unwrap();
        s.finish_submit(ticket, scored(25));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&GameEvent::SubmitStarted));
        assert!(events.contains(&GameEvent::ScoreChanged(25)));
        assert!(events.contains(&GameEvent::SubmitSucceeded {
            judged: 25,
            awarded: 25
        }));
        assert!(events.contains(&GameEvent::SurfaceCleared));
    }

    #[test]
    fn test_save_image_names_file_after_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));

        let path = s.save_image(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("Circle.png"));
        assert!(!s.is_surface_empty());
        assert_eq!(s.state(), SessionState::Drawing);
    }
}
