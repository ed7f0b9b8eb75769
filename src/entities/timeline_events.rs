//! Timeline events.

/// Coarse "reload everything" signal. Fired after an undo step and after
/// track-list changes that bypass the history (add_track, set_range).
/// Redo does not fire it.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineChanged;

/// Emitted when the playhead moves to a different frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentFrameChanged {
    pub old_frame: i32,
    pub new_frame: i32,
}
