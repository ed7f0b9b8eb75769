//! Editing requests raised by views (animation list, frame list, sprite
//! list, timeline, menus). Handled in `main_events::handle_app_event`.

use std::path::PathBuf;
use uuid::Uuid;

// === Animations ===

/// Create an animation with its first frame `"{name}_0"`
#[derive(Clone, Debug)]
pub struct AddAnimationRequest(pub String);

#[derive(Clone, Debug)]
pub struct RenameAnimationRequest {
    pub animation_id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct RemoveAnimationRequest(pub Uuid);

// === Frames ===

/// Append a frame named after the animation and its position
#[derive(Clone, Debug)]
pub struct AddFrameRequest {
    pub animation_id: Uuid,
    pub ticks: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct RemoveFrameRequest {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct SetFrameTicksRequest {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
    pub ticks: u32,
}

// === Sprites ===

/// Reorder sprites inside one frame (sprite list drag)
#[derive(Clone, Debug)]
pub struct MoveSpriteRequest {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Debug)]
pub struct SetSpriteVisibilityRequest {
    pub animation_id: Uuid,
    pub frame_id: Uuid,
    pub index: usize,
    pub visible: bool,
}

// === Import ===

/// Slice a sprite sheet into a new animation
#[derive(Clone, Debug)]
pub struct ImportSheetRequest {
    pub path: PathBuf,
    pub cell: (u32, u32),
    pub offset: (u32, u32),
    pub base_name: String,
}

// === History ===

#[derive(Clone, Debug)]
pub struct UndoRequest;

#[derive(Clone, Debug)]
pub struct RedoRequest;

// === Persistence ===

#[derive(Clone, Debug)]
pub struct SaveCollectionRequest(pub PathBuf);

#[derive(Clone, Debug)]
pub struct LoadCollectionRequest(pub PathBuf);
