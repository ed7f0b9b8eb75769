//! Tick-based animation playback.
//!
//! **Architecture**: Player does NOT own the animation. Methods that need the
//! frame list take `&Animation`, so the collection stays the single source
//! of truth and the player never holds stale frame handles.
//!
//! # Timing Model
//!
//! One tick lasts `1/fps` seconds. A frame with `ticks = n` stays on screen
//! for `n` ticks. [`Player::advance`] accumulates elapsed time and steps whole
//! ticks; [`Player::update`] feeds it wall-clock time from the app loop.
//!
//! At the end of the animation playback wraps to tick 0 when looping is on,
//! otherwise it stops on the last tick.

use std::time::Instant;

use log::{info, trace};

use crate::entities::{Animation, Frame};

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;
pub const DEFAULT_FPS: u32 = 16;

/// FPS presets for the faster/slower controls
const FPS_PRESETS: &[u32] = &[1, 2, 4, 8, 12, 16, 24, 30, 60];

#[derive(Clone, Debug)]
pub struct Player {
    fps: u32,
    is_playing: bool,
    loop_enabled: bool,
    /// Position in ticks from the animation start
    tick: u32,
    /// Seconds not yet converted into ticks
    pending: f64,
    /// Last update timestamp (runtime-only)
    last_update: Option<Instant>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            is_playing: false,
            loop_enabled: true,
            tick: 0,
            pending: 0.0,
            last_update: None,
        }
    }

    // === Settings ===

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Clamped into 1..=60.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
        trace!("Player fps = {}", self.fps);
    }

    /// Next preset above the current fps.
    pub fn increase_fps(&mut self) {
        if let Some(&fps) = FPS_PRESETS.iter().find(|&&f| f > self.fps) {
            self.set_fps(fps);
        }
    }

    /// Last preset below the current fps.
    pub fn decrease_fps(&mut self) {
        if let Some(&fps) = FPS_PRESETS.iter().rev().find(|&&f| f < self.fps) {
            self.set_fps(fps);
        }
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    // === Transport ===

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn play(&mut self) {
        if !self.is_playing {
            self.is_playing = true;
            self.pending = 0.0;
            self.last_update = None;
            trace!("Playback started");
        }
    }

    /// Stop playback (always stops, doesn't toggle)
    pub fn stop(&mut self) {
        if self.is_playing {
            self.is_playing = false;
            self.last_update = None;
            trace!("Playback stopped");
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing { self.stop() } else { self.play() }
    }

    // === Position ===

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Jump to `tick`, clamped to the last tick of `animation`.
    pub fn set_tick(&mut self, tick: u32, animation: &Animation) {
        self.tick = tick.min(animation.total_ticks().saturating_sub(1));
        self.pending = 0.0;
    }

    pub fn current_frame_index(&self, animation: &Animation) -> Option<usize> {
        animation.frame_index_at_tick(self.tick)
    }

    pub fn current_frame<'a>(&self, animation: &'a Animation) -> Option<&'a Frame> {
        animation.frame_at_tick(self.tick)
    }

    pub fn to_start(&mut self) {
        self.tick = 0;
        self.pending = 0.0;
    }

    pub fn to_end(&mut self, animation: &Animation) {
        self.set_tick(u32::MAX, animation);
    }

    /// Jump to the first tick of the next frame (wraps when looping).
    pub fn next_frame(&mut self, animation: &Animation) {
        let Some(idx) = self.current_frame_index(animation) else {
            self.to_start();
            return;
        };
        let target = if idx + 1 < animation.len() {
            idx + 1
        } else if self.loop_enabled {
            0
        } else {
            idx
        };
        self.tick = animation.frame_start_tick(target).unwrap_or(0);
        self.pending = 0.0;
    }

    /// Jump to the first tick of the previous frame (wraps when looping).
    pub fn prev_frame(&mut self, animation: &Animation) {
        let Some(idx) = self.current_frame_index(animation) else {
            self.to_start();
            return;
        };
        let target = if idx > 0 {
            idx - 1
        } else if self.loop_enabled {
            animation.len() - 1
        } else {
            0
        };
        self.tick = animation.frame_start_tick(target).unwrap_or(0);
        self.pending = 0.0;
    }

    // === Playback loop ===

    /// Advance by `dt` seconds of playback.
    /// Returns Some(frame index) if the shown frame changed.
    pub fn advance(&mut self, dt: f64, animation: &Animation) -> Option<usize> {
        let total = animation.total_ticks();
        if !self.is_playing || total == 0 || dt <= 0.0 {
            return None;
        }
        let before = self.current_frame_index(animation);

        self.pending += dt * self.fps as f64;
        let steps = self.pending.floor();
        self.pending -= steps;

        let target = self.tick as u64 + steps as u64;
        if target < total as u64 {
            self.tick = target as u32;
        } else if self.loop_enabled {
            self.tick = (target % total as u64) as u32;
        } else {
            self.tick = total - 1;
            self.stop();
            info!("Playback reached the end");
        }

        let after = self.current_frame_index(animation);
        if after != before { after } else { None }
    }

    /// Advance by wall-clock time since the previous call.
    pub fn update(&mut self, animation: &Animation) -> Option<usize> {
        if !self.is_playing {
            return None;
        }
        let now = Instant::now();
        let last = self.last_update.replace(now)?;
        self.advance(now.duration_since(last).as_secs_f64(), animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> Animation {
        let mut anim = Animation::new("WALK");
        for i in 1..=4 {
            anim.create_frame(format!("WALK_{}", i), 4);
        }
        anim
    }

    #[test]
    fn test_fps_clamped() {
        let mut p = Player::new();
        assert_eq!(p.fps(), 16);
        p.set_fps(0);
        assert_eq!(p.fps(), 1);
        p.set_fps(240);
        assert_eq!(p.fps(), 60);
        p.decrease_fps();
        assert_eq!(p.fps(), 30);
        p.increase_fps();
        assert_eq!(p.fps(), 60);
        p.increase_fps();
        assert_eq!(p.fps(), 60);
    }

    #[test]
    fn test_advance_whole_ticks() {
        let anim = walk();
        let mut p = Player::new();
        p.set_fps(4);
        // Not playing: nothing moves
        assert_eq!(p.advance(1.0, &anim), None);

        p.play();
        // 0.5 s at 4 fps = 2 ticks, still frame 0
        assert_eq!(p.advance(0.5, &anim), None);
        assert_eq!(p.tick(), 2);
        // 0.6 s = 2.4 ticks -> tick 4, frame 1
        assert_eq!(p.advance(0.6, &anim), Some(1));
        assert_eq!(p.tick(), 4);
        // Carried 0.4 tick + 0.2 s (0.8) -> one more tick
        p.advance(0.2, &anim);
        assert_eq!(p.tick(), 5);
    }

    #[test]
    fn test_loop_and_stop_at_end() {
        let anim = walk();
        let mut p = Player::new();
        p.set_fps(1);
        p.play();
        p.set_tick(15, &anim);
        assert_eq!(p.advance(1.0, &anim), Some(0));
        assert_eq!(p.tick(), 0);

        p.set_loop_enabled(false);
        p.set_tick(15, &anim);
        p.advance(3.0, &anim);
        assert_eq!(p.tick(), 15);
        assert!(!p.is_playing());
    }

    #[test]
    fn test_step_frames() {
        let anim = walk();
        let mut p = Player::new();
        p.next_frame(&anim);
        assert_eq!(p.current_frame(&anim).map(Frame::name), Some("WALK_2"));
        p.prev_frame(&anim);
        p.prev_frame(&anim);
        assert_eq!(p.current_frame(&anim).map(Frame::name), Some("WALK_4"));
        p.set_loop_enabled(false);
        p.next_frame(&anim);
        assert_eq!(p.current_frame_index(&anim), Some(3));
        p.to_end(&anim);
        assert_eq!(p.tick(), 15);
    }

    #[test]
    fn test_empty_animation() {
        let anim = Animation::new("EMPTY");
        let mut p = Player::new();
        p.play();
        assert_eq!(p.advance(1.0, &anim), None);
        p.next_frame(&anim);
        p.to_end(&anim);
        assert_eq!(p.tick(), 0);
        assert!(p.current_frame(&anim).is_none());
    }

    #[test]
    fn test_advance_over_huge_frames() {
        let mut anim = Animation::new("LONG");
        anim.create_frame("a", u32::MAX);
        anim.create_frame("b", 2);

        let mut p = Player::new();
        p.to_end(&anim);
        assert_eq!(p.tick(), u32::MAX - 1);
        p.play();
        // 16 ticks past the saturated end wrap to tick 15
        p.advance(1.0, &anim);
        assert_eq!(p.tick(), 15);
        assert_eq!(p.current_frame_index(&anim), Some(0));
    }
}
