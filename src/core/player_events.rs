//! Player and playback requests.

use uuid::Uuid;

// === Playback Control ===

#[derive(Clone, Debug)]
pub struct StopRequest;

#[derive(Clone, Debug)]
pub struct TogglePlayPauseRequest;

/// Jump to an absolute tick of the active animation
#[derive(Clone, Debug)]
pub struct SetTickRequest(pub u32);

#[derive(Clone, Debug)]
pub struct StepForwardRequest;

#[derive(Clone, Debug)]
pub struct StepBackwardRequest;

#[derive(Clone, Debug)]
pub struct JumpToStartRequest;

#[derive(Clone, Debug)]
pub struct JumpToEndRequest;

// === FPS Control ===

#[derive(Clone, Debug)]
pub struct SetFpsRequest(pub u32);

#[derive(Clone, Debug)]
pub struct IncreaseFpsRequest;

#[derive(Clone, Debug)]
pub struct DecreaseFpsRequest;

#[derive(Clone, Debug)]
pub struct SetLoopRequest(pub bool);

// === Selection ===

/// Make an animation the one the player shows
#[derive(Clone, Debug)]
pub struct SelectAnimationRequest(pub Uuid);
