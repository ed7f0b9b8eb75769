//! Frame: one named, timed step of an animation holding an ordered list of sprites.
//!
//! # Dirty Flag
//!
//! A frame does not emit events itself. Any sprite add/remove/update/reorder
//! (or a name/ticks change made through the frame's own setters) raises
//! `is_modified()`. The owning [`Animation`](super::Animation) sweeps its
//! frames in `commit_frame_changes()`, turns each dirty frame into one
//! `FrameModified` notification and clears the flag via [`Frame::commit`].
//!
//! ## Sprite Order
//!
//! `sprites` keeps insertion order (list order shown in the sprite panel).
//! Paint order is [`Frame::draw_order`]: stable by `z_index`, list order
//! breaking ties.

use log::debug;
use serde_json::{Value, json};
use uuid::Uuid;

use super::keys::*;
use super::sprite::{Sprite, SpriteUpdate};
use super::traits::{Fields, Identified, TreeNode, position_by_id, relocate};
use crate::error::{ModelError, TreeError};

/// Default frame duration in ticks
pub const DEFAULT_TICKS: u32 = 1;

#[derive(Debug, Clone)]
pub struct Frame {
    id: Uuid,
    name: String,
    ticks: u32,
    sprites: Vec<Sprite>,
    /// Runtime-only, never serialized
    modified: bool,
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.ticks == other.ticks
            && self.sprites == other.sprites
    }
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_ticks(name, DEFAULT_TICKS)
    }

    /// Ticks below 1 are raised to 1.
    pub fn with_ticks(name: impl Into<String>, ticks: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            ticks: ticks.max(1),
            sprites: Vec::new(),
            modified: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.modified = true;
    }

    /// Ticks below 1 are raised to 1.
    pub fn set_ticks(&mut self, ticks: u32) {
        self.ticks = ticks.max(1);
        self.modified = true;
    }

    /// Apply a partial update without touching the dirty flag.
    /// The caller is responsible for announcing the change.
    pub(crate) fn apply_update(&mut self, update: &FrameUpdate) -> bool {
        let mut changed = false;
        if let Some(ref name) = update.name {
            changed |= self.name != *name;
            self.name = name.clone();
        }
        if let Some(ticks) = update.ticks {
            let ticks = ticks.max(1);
            changed |= self.ticks != ticks;
            self.ticks = ticks;
        }
        changed
    }

    // === Sprites ===

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.sprites.iter()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Create a sprite with fresh identity, append it, return the live handle.
    pub fn create_sprite(&mut self, name: impl Into<String>) -> &mut Sprite {
        let idx = self.sprites.len();
        self.sprites.push(Sprite::new(name));
        self.modified = true;
        &mut self.sprites[idx]
    }

    /// Adopt an existing sprite. Its id must not already be in this frame.
    pub fn add_sprite(&mut self, sprite: Sprite) -> Result<&mut Sprite, ModelError> {
        if self.sprite_index(sprite.id()).is_some() {
            return Err(ModelError::DuplicateId(sprite.id()));
        }
        let idx = self.sprites.len();
        self.sprites.push(sprite);
        self.modified = true;
        Ok(&mut self.sprites[idx])
    }

    pub fn remove_sprite(&mut self, id: Uuid) -> Option<Sprite> {
        let idx = self.sprite_index(id)?;
        self.modified = true;
        debug!("Frame '{}': removed sprite {}", self.name, id);
        Some(self.sprites.remove(idx))
    }

    pub fn get_sprite(&self, id: Uuid) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id() == id)
    }

    /// Mutable handle; handing one out counts as a modification.
    pub fn sprite_mut(&mut self, id: Uuid) -> Option<&mut Sprite> {
        let idx = self.sprite_index(id)?;
        self.modified = true;
        Some(&mut self.sprites[idx])
    }

    pub fn sprite_at(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn sprite_index(&self, id: Uuid) -> Option<usize> {
        position_by_id(&self.sprites, id)
    }

    /// Returns whether the sprite existed.
    pub fn update_sprite(&mut self, id: Uuid, update: &SpriteUpdate) -> bool {
        let Some(idx) = self.sprite_index(id) else {
            return false;
        };
        if self.sprites[idx].update(update) {
            self.modified = true;
        }
        true
    }

    pub fn set_sprite_visibility(&mut self, index: usize, visible: bool) -> bool {
        match self.sprites.get_mut(index) {
            Some(sprite) => {
                sprite.set_visible(visible);
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Relocate one sprite; others keep their relative order.
    pub fn move_sprite(&mut self, from: usize, to: usize) -> bool {
        if !relocate(&mut self.sprites, from, to) {
            return false;
        }
        if from != to {
            self.modified = true;
        }
        true
    }

    /// Sprites in paint order (z_index ascending, stable).
    pub fn draw_order(&self) -> Vec<&Sprite> {
        let mut order: Vec<&Sprite> = self.sprites.iter().collect();
        order.sort_by_key(|s| s.z_index());
        order
    }

    // === Dirty tracking ===

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn commit(&mut self) -> bool {
        std::mem::replace(&mut self.modified, false)
    }
}

impl Identified for Frame {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a Sprite;
    type IntoIter = std::slice::Iter<'a, Sprite>;

    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

impl TreeNode for Frame {
    fn to_tree(&self) -> Value {
        let sprites: Vec<Value> = self.sprites.iter().map(TreeNode::to_tree).collect();
        json!({
            A_ID: self.id.to_string(),
            A_NAME: self.name,
            A_TICKS: self.ticks,
            A_SPRITES: sprites,
        })
    }

    fn from_tree(tree: &Value) -> Result<Self, TreeError> {
        let f = Fields::new(tree, "frame")?;
        let mut frame = Self {
            id: f.id(A_ID)?,
            name: f.str_or(A_NAME, "")?,
            ticks: f.u32_or(A_TICKS, DEFAULT_TICKS)?.max(1),
            sprites: Vec::new(),
            modified: false,
        };
        for node in f.array(A_SPRITES)? {
            let sprite = Sprite::from_tree(node)?;
            if frame.sprite_index(sprite.id()).is_some() {
                return Err(TreeError::DuplicateId(sprite.id()));
            }
            frame.sprites.push(sprite);
        }
        Ok(frame)
    }
}

/// Partial frame update: `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUpdate {
    pub name: Option<String>,
    pub ticks: Option<u32>,
}

impl FrameUpdate {
    pub fn ticks(ticks: u32) -> Self {
        Self {
            ticks: Some(ticks),
            ..Default::default()
        }
    }
}
