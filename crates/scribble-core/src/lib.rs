//! scribble-core - Core library for scribble
//!
//! Provides the drawing surface, prompt source, judge gateway, unlock
//! economy and the session controller that ties them together.

pub mod config;
pub mod economy;
pub mod error;
pub mod event;
pub mod export;
pub mod gateway;
pub mod prompts;
pub mod scoring;
pub mod session;
pub mod surface;

pub use config::{CanvasConfig, GameConfig};
pub use economy::{ColorId, PurchaseError, ShopItem, Wallet, CATALOG};
pub use error::CoreError;
pub use event::{EventBus, GameEvent};
pub use export::export_png;
pub use gateway::{GatewayError, JudgeClient, ScoreResponse, ScoringGateway};
pub use prompts::PromptSource;
pub use scoring::parse_score;
pub use session::{GameSession, SessionState, SubmitBlocked, SubmitOutcome, SubmitTicket};
pub use surface::{Point, Surface};
