//! Persistent application settings (`musa.json` in the config directory).
//!
//! Every field has a default, so old or partial files keep loading.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::player::{DEFAULT_FPS, MAX_FPS, MIN_FPS};
use crate::entities::frame::DEFAULT_TICKS;
use crate::entities::sprite_sheet::DEFAULT_CELL_SIZE;
use crate::entities::timeline::{DEFAULT_END_FRAME, DEFAULT_START_FRAME};

/// Application settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    // Editing
    pub default_ticks: u32, // Ticks for new frames (>= 1)
    pub undo_limit: usize,  // 0 = unlimited

    // Timeline
    pub timeline_start: i32,
    pub timeline_end: i32,

    // Playback
    pub fps: u32, // 1..=60
    pub loop_enabled: bool,

    // Sprite sheet import
    pub sheet_cell_width: u32,
    pub sheet_cell_height: u32,

    // Internal
    pub last_collection: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_ticks: DEFAULT_TICKS,
            undo_limit: 0,
            timeline_start: DEFAULT_START_FRAME,
            timeline_end: DEFAULT_END_FRAME,
            fps: DEFAULT_FPS,
            loop_enabled: true,
            sheet_cell_width: DEFAULT_CELL_SIZE.0,
            sheet_cell_height: DEFAULT_CELL_SIZE.1,
            last_collection: None,
        }
    }
}

impl Settings {
    /// Load from `path`. A missing file gives defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Settings: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Settings loaded from {}", path.display());
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Pull out-of-range values back into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.default_ticks = self.default_ticks.max(1);
        self.fps = self.fps.clamp(MIN_FPS, MAX_FPS);
        if self.timeline_start > self.timeline_end {
            std::mem::swap(&mut self.timeline_start, &mut self.timeline_end);
        }
        self
    }

    pub fn sheet_cell(&self) -> (u32, u32) {
        (self.sheet_cell_width, self.sheet_cell_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("musa_cfg_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_ticks, 1);
        assert_eq!((s.timeline_start, s.timeline_end), (0, 200));
        assert_eq!(s.fps, 16);
        assert!(s.loop_enabled);
        assert_eq!(s.sheet_cell(), (32, 32));
        assert_eq!(s.undo_limit, 0);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_file("absent.json");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_and_clamping() {
        let path = temp_file("musa.json");
        std::fs::write(&path, r#"{"fps": 500, "default_ticks": 0, "timeline_start": 50, "timeline_end": 10}"#).unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.fps, 60);
        assert_eq!(s.default_ticks, 1);
        assert_eq!((s.timeline_start, s.timeline_end), (10, 50));
        assert!(s.loop_enabled);
    }

    #[test]
    fn test_malformed_is_error() {
        let path = temp_file("musa.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_save_load() {
        let path = temp_file("musa.json");
        let s = Settings {
            fps: 24,
            last_collection: Some("walk.json".into()),
            ..Default::default()
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }
}
