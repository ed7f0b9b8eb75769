//! MUSA - sprite animation authoring core
//!
//! Re-exports all modules for use by the binary target.

// Core engine (events, undo history, playback)
pub mod core;

// Data model and timeline
pub mod entities;
pub mod error;

// App modules
pub mod cli;
pub mod config;
pub mod main_events;
pub mod paths;
pub mod shell;

// Re-export commonly used types from core
pub use crate::core::event_bus::{BoxedEvent, EntityEmitter, EventBus, EventEmitter, downcast_event};
pub use crate::core::player::Player;
pub use crate::core::undo::{Command, MacroCommand, UndoStack};

// Re-export entities
pub use crate::entities::{Animation, AnimationCollection, Frame, KeyFrame, Sprite, TimelineModel, Track};
pub use crate::error::{CommandError, ModelError, SheetError, TreeError};
