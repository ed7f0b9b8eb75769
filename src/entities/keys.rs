//! Field key constants for tree (de)serialization and attribute access.
//!
//! Avoid string typos, enable IDE autocomplete.
//! Usage: `fields.i32_or(A_X, 0)`

// === Identity ===
/// Entity UUID (canonical hyphenated string in trees)
pub const A_ID: &str = "id";
/// Human-readable name
pub const A_NAME: &str = "name";

// === Sprite placement ===
/// Horizontal position (i32, any sign)
pub const A_X: &str = "x";
/// Vertical position (i32, any sign)
pub const A_Y: &str = "y";
/// Horizontal flip
pub const A_H_FLIP: &str = "h_flip";
/// Vertical flip
pub const A_V_FLIP: &str = "v_flip";
/// Cell index into the sprite sheet
pub const A_SPRITE_INDEX: &str = "sprite_index";
/// Draw order within a frame (lower first)
pub const A_Z_INDEX: &str = "z_index";
/// Opacity (0.0-1.0)
pub const A_OPACITY: &str = "opacity";
/// Visibility flag
pub const A_VISIBLE: &str = "visible";

// === Frame ===
/// Duration in ticks (>= 1)
pub const A_TICKS: &str = "ticks";
/// Sprite list (array, order-significant)
pub const A_SPRITES: &str = "sprites";

// === Animation / collection ===
/// Frame list (array, order-significant)
pub const A_FRAMES: &str = "frames";
/// Animations keyed by id string
pub const A_ANIMATIONS: &str = "animations";
