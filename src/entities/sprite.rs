//! Sprite (a.k.a. piece): one positioned, flippable cell of a sprite sheet
//! placed inside a frame.
//!
//! Mutation never changes identity. Edits go through pointwise setters,
//! an atomic [`SpriteUpdate`], or the generic [`Attrs`] path used by the
//! inspector panel.

use serde_json::{Value, json};
use uuid::Uuid;

use super::attrs::{AttrValue, Attrs};
use super::keys::*;
use super::traits::{Fields, Identified, TreeNode};
use crate::error::{ModelError, TreeError};

/// Original naming for the same element.
pub type Piece = Sprite;

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    id: Uuid,
    name: String,
    x: i32,
    y: i32,
    h_flip: bool,
    v_flip: bool,
    sprite_index: u32,
    z_index: i32,
    opacity: f32,
    visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new("")
    }
}

fn clamp_opacity(value: f32) -> f32 {
    if value.is_nan() { 1.0 } else { value.clamp(0.0, 1.0) }
}

impl Sprite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            x: 0,
            y: 0,
            h_flip: false,
            v_flip: false,
            sprite_index: 0,
            z_index: 0,
            opacity: 1.0,
            visible: true,
        }
    }

    // === Builders (construction only) ===

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn flipped(mut self, h_flip: bool, v_flip: bool) -> Self {
        self.h_flip = h_flip;
        self.v_flip = v_flip;
        self
    }

    pub fn with_sprite_index(mut self, index: u32) -> Self {
        self.sprite_index = index;
        self
    }

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    /// Copy with a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    // === Accessors ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn h_flip(&self) -> bool {
        self.h_flip
    }

    pub fn v_flip(&self) -> bool {
        self.v_flip
    }

    pub fn sprite_index(&self) -> u32 {
        self.sprite_index
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    // === Pointwise setters ===

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_h_flip(&mut self, flip: bool) {
        self.h_flip = flip;
    }

    pub fn set_v_flip(&mut self, flip: bool) {
        self.v_flip = flip;
    }

    pub fn set_sprite_index(&mut self, index: u32) {
        self.sprite_index = index;
    }

    pub fn set_z_index(&mut self, z: i32) {
        self.z_index = z;
    }

    /// Clamped into 0.0..=1.0
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_opacity(opacity);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Apply every present field of `update` at once.
    /// Returns true if any value actually changed.
    pub fn update(&mut self, update: &SpriteUpdate) -> bool {
        let before = self.clone();
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(flip) = update.h_flip {
            self.h_flip = flip;
        }
        if let Some(flip) = update.v_flip {
            self.v_flip = flip;
        }
        if let Some(index) = update.sprite_index {
            self.sprite_index = index;
        }
        if let Some(z) = update.z_index {
            self.z_index = z;
        }
        if let Some(opacity) = update.opacity {
            self.opacity = clamp_opacity(opacity);
        }
        if let Some(visible) = update.visible {
            self.visible = visible;
        }
        *self != before
    }

    // === Generic attribute path (inspector) ===

    /// Snapshot of all fields as key/value pairs.
    pub fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.set(A_ID, AttrValue::Str(self.id.to_string()));
        attrs.set(A_NAME, AttrValue::Str(self.name.clone()));
        attrs.set(A_X, AttrValue::Int(self.x));
        attrs.set(A_Y, AttrValue::Int(self.y));
        attrs.set(A_H_FLIP, AttrValue::Bool(self.h_flip));
        attrs.set(A_V_FLIP, AttrValue::Bool(self.v_flip));
        attrs.set(A_SPRITE_INDEX, AttrValue::UInt(self.sprite_index));
        attrs.set(A_Z_INDEX, AttrValue::Int(self.z_index));
        attrs.set(A_OPACITY, AttrValue::Float(self.opacity));
        attrs.set(A_VISIBLE, AttrValue::Bool(self.visible));
        attrs
    }

    /// Set one field by key. The value type must match the field exactly.
    pub fn set_attr(&mut self, key: &str, value: AttrValue) -> Result<(), ModelError> {
        let mismatch = |expected: &'static str, value: &AttrValue| ModelError::InvalidAttr {
            key: key.to_string(),
            expected,
            got: value.kind(),
        };
        match (key, value) {
            (A_ID, _) => return Err(ModelError::ReadOnlyAttr(key.to_string())),
            (A_NAME, AttrValue::Str(s)) => self.name = s,
            (A_X, AttrValue::Int(v)) => self.x = v,
            (A_Y, AttrValue::Int(v)) => self.y = v,
            (A_H_FLIP, AttrValue::Bool(v)) => self.h_flip = v,
            (A_V_FLIP, AttrValue::Bool(v)) => self.v_flip = v,
            (A_SPRITE_INDEX, AttrValue::UInt(v)) => self.sprite_index = v,
            (A_Z_INDEX, AttrValue::Int(v)) => self.z_index = v,
            (A_OPACITY, AttrValue::Float(v)) => self.opacity = clamp_opacity(v),
            (A_VISIBLE, AttrValue::Bool(v)) => self.visible = v,
            (A_NAME, v) => return Err(mismatch("string", &v)),
            (A_X | A_Y | A_Z_INDEX, v) => return Err(mismatch("int", &v)),
            (A_H_FLIP | A_V_FLIP | A_VISIBLE, v) => return Err(mismatch("bool", &v)),
            (A_SPRITE_INDEX, v) => return Err(mismatch("uint", &v)),
            (A_OPACITY, v) => return Err(mismatch("float", &v)),
            _ => return Err(ModelError::UnknownAttr(key.to_string())),
        }
        Ok(())
    }
}

impl Identified for Sprite {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl TreeNode for Sprite {
    fn to_tree(&self) -> Value {
        json!({
            A_ID: self.id.to_string(),
            A_NAME: self.name,
            A_X: self.x,
            A_Y: self.y,
            A_H_FLIP: self.h_flip,
            A_V_FLIP: self.v_flip,
            A_SPRITE_INDEX: self.sprite_index,
            A_Z_INDEX: self.z_index,
            A_OPACITY: self.opacity,
            A_VISIBLE: self.visible,
        })
    }

    fn from_tree(tree: &Value) -> Result<Self, TreeError> {
        let f = Fields::new(tree, "sprite")?;
        Ok(Self {
            id: f.id(A_ID)?,
            name: f.str_or(A_NAME, "")?,
            x: f.i32_or(A_X, 0)?,
            y: f.i32_or(A_Y, 0)?,
            h_flip: f.bool_or(A_H_FLIP, false)?,
            v_flip: f.bool_or(A_V_FLIP, false)?,
            sprite_index: f.u32_or(A_SPRITE_INDEX, 0)?,
            z_index: f.i32_or(A_Z_INDEX, 0)?,
            opacity: clamp_opacity(f.f32_or(A_OPACITY, 1.0)?),
            visible: f.bool_or(A_VISIBLE, true)?,
        })
    }
}

/// Partial sprite update: `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteUpdate {
    pub name: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub h_flip: Option<bool>,
    pub v_flip: Option<bool>,
    pub sprite_index: Option<u32>,
    pub z_index: Option<i32>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,
}

impl SpriteUpdate {
    /// Update that only moves the sprite
    pub fn position(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }
}
