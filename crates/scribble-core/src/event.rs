//! Event bus for scribble using tokio::broadcast
//!
//! The session publishes every state change here; frontends subscribe to
//! drive redraws and notifications.

use crate::economy::ColorId;
use tokio::sync::broadcast;

/// Events emitted by the game session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Score changed (reward, purchase or reset)
    ScoreChanged(u64),
    /// A new prompt became active
    PromptChanged(String),
    /// Surface was wiped (user clear, post-submit clear, resize or reset)
    SurfaceCleared,
    /// A drawing was handed to the judge
    SubmitStarted,
    /// The judge scored the drawing and the reward was applied
    SubmitSucceeded { judged: u32, awarded: u64 },
    /// The judge call failed or returned no score; nothing was changed
    SubmitFailed(String),
    /// A palette color was bought
    ColorUnlocked(ColorId),
    /// The drawing color changed
    ActiveColorChanged(ColorId),
}

/// Event bus for broadcasting game events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<GameEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: GameEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
