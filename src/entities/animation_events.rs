//! Animation model events.
//!
//! Collection-level events carry the animation id; animation-level events
//! carry the owning animation id plus the frame id where one applies.
//!
//! Every frame-level event is followed by an [`AnimationModified`] for the
//! same animation, so views that refresh per animation only subscribe to that.
//! Bulk deserialization emits a single [`CollectionLoaded`] and nothing else.

use uuid::Uuid;

// === Collection level ===

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationAdded(pub Uuid);

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRemoved(pub Uuid);

/// Coarse "this animation changed" signal (rename, any frame change).
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationModified(pub Uuid);

/// Fired once after the whole collection was replaced from a tree.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionLoaded;

// === Animation level ===

#[derive(Clone, Debug, PartialEq)]
pub struct FrameAdded {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRemoved {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameModified {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
}
