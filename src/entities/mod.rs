//! Entities module - the animation data model and the timeline model
//!
//! Ownership is strictly hierarchical:
//! - [`AnimationCollection`] owns [`Animation`]s (keyed by id)
//! - [`Animation`] owns an ordered list of [`Frame`]s
//! - [`Frame`] owns an ordered list of [`Sprite`]s
//!
//! The timeline side ([`TimelineModel`] -> [`Track`] -> [`KeyFrame`]) is
//! independent of the animation tree.

pub mod animation;
pub mod animation_events;
pub mod attrs;
pub mod collection;
pub mod frame;
pub mod keyframe;
pub mod keys;
pub mod sprite;
pub mod sprite_sheet;
pub mod timeline;
pub mod timeline_commands;
pub mod timeline_events;
pub mod traits;

pub use animation::Animation;
pub use attrs::{AttrValue, Attrs};
pub use collection::AnimationCollection;
pub use frame::{Frame, FrameUpdate};
pub use keyframe::{KeyFrame, Track};
pub use sprite::{Piece, Sprite, SpriteUpdate};
pub use sprite_sheet::SpriteSheet;
pub use timeline::{KeySelection, TimelineModel};
pub use traits::{Identified, TreeNode};
