//! Core engine modules - events, undo history, playback
//!
//! These modules are independent of any view code.

pub mod edit_events;
pub mod event_bus;
pub mod player;
pub mod player_events;
pub mod undo;

// Re-exports for convenience
pub use event_bus::{EntityEmitter, EventBus, EventEmitter, SubscriptionId};
pub use player::Player;
pub use undo::{Command, MacroCommand, UndoStack};
