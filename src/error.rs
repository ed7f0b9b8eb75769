//! Error types for the animation model, serialization and timeline.
//!
//! Lookups that miss are never errors: they return `Option`/`bool`.
//! These enums cover the cases a caller can actually get wrong.

use thiserror::Error;
use uuid::Uuid;

/// Entity model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Entity with this id already lives in the container
    #[error("duplicate id {0}")]
    DuplicateId(Uuid),

    /// Attribute payload has the wrong value type
    #[error("attribute '{key}' expects {expected}, got {got}")]
    InvalidAttr {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    /// Attribute key not known to the entity
    #[error("unknown attribute '{0}'")]
    UnknownAttr(String),

    /// Attribute exists but cannot be written
    #[error("attribute '{0}' is read-only")]
    ReadOnlyAttr(String),
}

/// Tree (de)serialization errors.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Node is not a key-value map
    #[error("{entity}: expected an object")]
    NotAnObject { entity: &'static str },

    /// Field present but of the wrong type
    #[error("{entity}: field '{field}' expects {expected}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// Identifier string failed to parse
    #[error("invalid id '{0}'")]
    InvalidId(String),

    /// Two entities in one container share an id
    #[error("duplicate id {0}")]
    DuplicateId(Uuid),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Undoable command errors (precondition violations at execution time).
#[derive(Debug, Error)]
pub enum CommandError {
    /// Track index does not exist
    #[error("track {0} not found")]
    TrackNotFound(usize),

    /// No keyframe with this (frame, value) in the track
    #[error("keyframe at frame {frame} not found in track {track}")]
    KeyFrameNotFound { track: usize, frame: i32 },

    /// Recorded slot no longer exists in the track
    #[error("keyframe slot {index} out of range in track {track}")]
    IndexOutOfRange { track: usize, index: usize },

    /// A child of a macro command failed
    #[error("'{title}' failed: {source}")]
    Macro {
        title: String,
        #[source]
        source: Box<CommandError>,
    },
}

/// Sprite-sheet slicing validation errors.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Cell size must be positive
    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    /// Image dimensions are not a whole number of cells
    #[error(
        "Image dimensions must be a multiple of frame size ({image_width}x{image_height} vs {frame_width}x{frame_height})"
    )]
    NotDivisible {
        image_width: u32,
        image_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    /// Offset points outside the image
    #[error("offset ({x}, {y}) outside {width}x{height} image")]
    OffsetOutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    /// Base name contains characters outside [a-zA-Z0-9_()]
    #[error("invalid base name '{0}'")]
    InvalidBaseName(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
