//! TimelineModel: tracks of keyframes, a frame range, a playhead and an
//! undo history for keyframe edits.
//!
//! Every keyframe edit goes through the history as a
//! [`Command`](crate::core::undo::Command). After an undo step the model
//! emits [`TimelineChanged`] so views reload; redo does not emit it, views
//! that care about redo must refresh on their own.
//!
//! # Dragging
//!
//! A drag moves a selection of keyframes by the same delta. It is validated
//! for every selected keyframe before anything moves: the new frame must stay
//! inside `[start_frame, end_frame]` and strictly between the keyframe's
//! neighbours, where neighbours that are themselves selected (same track) are
//! ignored. One failing keyframe rejects the whole drag.

use std::collections::HashSet;

use log::{debug, trace};

use super::keyframe::{KeyFrame, Track};
use super::timeline_commands::{AddKeyFrame, MergeKeyFrames, MoveKeyFrame, RemoveKeyFrame, Tracks};
use super::timeline_events::{CurrentFrameChanged, TimelineChanged};
use crate::core::event_bus::EntityEmitter;
use crate::core::undo::{BoxedCommand, MacroCommand, UndoStack};
use crate::error::CommandError;

pub const DEFAULT_START_FRAME: i32 = 0;
pub const DEFAULT_END_FRAME: i32 = 200;

/// One selected keyframe, addressed by track and frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySelection {
    pub track: usize,
    pub frame: i32,
}

impl KeySelection {
    pub fn new(track: usize, frame: i32) -> Self {
        Self { track, frame }
    }
}

#[derive(Debug)]
pub struct TimelineModel {
    tracks: Tracks,
    start_frame: i32,
    end_frame: i32,
    current_frame: i32,
    history: UndoStack<Tracks>,
    emitter: EntityEmitter,
}

impl Default for TimelineModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineModel {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            start_frame: DEFAULT_START_FRAME,
            end_frame: DEFAULT_END_FRAME,
            current_frame: DEFAULT_START_FRAME,
            history: UndoStack::new(),
            emitter: EntityEmitter::dummy(),
        }
    }

    pub fn set_event_emitter(&mut self, emitter: EntityEmitter) {
        self.emitter = emitter;
    }

    // === Tracks ===

    /// Append a track, returning its index.
    pub fn add_track(&mut self, track: Track) -> usize {
        debug!("Timeline: add track '{}'", track.name);
        self.tracks.push(track);
        self.emitter.emit(TimelineChanged);
        self.tracks.len() - 1
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    // === Range & playhead ===

    pub fn start_frame(&self) -> i32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> i32 {
        self.end_frame
    }

    pub fn current_frame(&self) -> i32 {
        self.current_frame
    }

    /// Set the valid frame range (bounds are swapped if reversed).
    /// The playhead is pulled back inside.
    pub fn set_range(&mut self, start: i32, end: i32) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.start_frame = start;
        self.end_frame = end;
        self.emitter.emit(TimelineChanged);
        self.set_current_frame(self.current_frame);
    }

    /// Move the playhead, clamped into range. Returns the frame actually set.
    pub fn set_current_frame(&mut self, frame: i32) -> i32 {
        let new_frame = frame.clamp(self.start_frame, self.end_frame);
        if new_frame != self.current_frame {
            let old_frame = self.current_frame;
            self.current_frame = new_frame;
            self.emitter.emit(CurrentFrameChanged { old_frame, new_frame });
        }
        new_frame
    }

    // === History ===

    pub fn history(&self) -> &UndoStack<Tracks> {
        &self.history
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    /// Apply and record an arbitrary command.
    pub fn push(&mut self, command: BoxedCommand<Tracks>) -> Result<(), CommandError> {
        self.history.push(&mut self.tracks, command)
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let undone = self.history.undo(&mut self.tracks)?;
        if undone {
            self.emitter.emit(TimelineChanged);
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.history.redo(&mut self.tracks)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // === Keyframe edits ===

    pub fn add_keyframe(&mut self, track: usize, frame: i32, value: f64) -> Result<(), CommandError> {
        self.push(Box::new(AddKeyFrame::new(track, frame, value)))
    }

    pub fn remove_keyframe(&mut self, track: usize, keyframe: KeyFrame) -> Result<(), CommandError> {
        self.push(Box::new(RemoveKeyFrame::new(track, keyframe)))
    }

    /// Unvalidated single move; the slot is resolved now.
    pub fn move_keyframe(
        &mut self,
        track: usize,
        keyframe: KeyFrame,
        new_frame: i32,
        new_value: f64,
    ) -> Result<(), CommandError> {
        let command = MoveKeyFrame::new(&self.tracks, track, keyframe, new_frame, new_value)?;
        self.push(Box::new(command))
    }

    pub fn merge_keyframes(
        &mut self,
        track: usize,
        source_frames: &[i32],
        target_frame: i32,
    ) -> Result<(), CommandError> {
        self.push(Box::new(MergeKeyFrames::new(
            track,
            source_frames.iter().copied(),
            target_frame,
        )))
    }

    /// Merge onto the rounded mean of the selected frame numbers.
    /// An unselected keyframe already sitting on the target joins the merge,
    /// so the track never ends up with two keys on one frame.
    /// Returns the target frame, `None` for an empty selection.
    pub fn merge_selected(&mut self, track: usize, frames: &[i32]) -> Result<Option<i32>, CommandError> {
        if frames.is_empty() {
            return Ok(None);
        }
        let mean = frames.iter().map(|&f| f as f64).sum::<f64>() / frames.len() as f64;
        let target = mean.round() as i32;

        let mut sources = frames.to_vec();
        let occupied = self
            .tracks
            .get(track)
            .is_some_and(|t| t.get_keyframe_at_frame(target).is_some());
        if occupied && !sources.contains(&target) {
            trace!("Timeline: merge target {} already keyed, folding it in", target);
            sources.push(target);
        }
        self.merge_keyframes(track, &sources, target)?;
        Ok(Some(target))
    }

    // === Dragging ===

    /// Selected frames per track, the exclusion sets for adjacency checks.
    fn exclusions(selection: &[KeySelection]) -> Vec<(usize, HashSet<i32>)> {
        let mut by_track: Vec<(usize, HashSet<i32>)> = Vec::new();
        for sel in selection {
            match by_track.iter_mut().find(|(t, _)| *t == sel.track) {
                Some((_, frames)) => {
                    frames.insert(sel.frame);
                }
                None => by_track.push((sel.track, HashSet::from([sel.frame]))),
            }
        }
        by_track
    }

    /// Whether every selected keyframe can shift by `delta`.
    pub fn can_move_keyframes(&self, selection: &[KeySelection], delta: i32) -> bool {
        let exclusions = Self::exclusions(selection);
        selection.iter().all(|sel| {
            let Some(track) = self.tracks.get(sel.track) else {
                return false;
            };
            if track.get_keyframe_at_frame(sel.frame).is_none() {
                return false;
            }
            let exclude = exclusions
                .iter()
                .find(|(t, _)| *t == sel.track)
                .map(|(_, frames)| frames);
            let empty = HashSet::new();
            let Some(to) = sel.frame.checked_add(delta) else {
                return false;
            };
            track.can_place(
                sel.frame,
                to,
                exclude.unwrap_or(&empty),
                self.start_frame,
                self.end_frame,
            )
        })
    }

    /// Shift the selection by `delta` as one history entry.
    /// `Ok(false)` when the drag is rejected or moves nothing; no state changes then.
    pub fn move_keyframes(&mut self, selection: &[KeySelection], delta: i32) -> Result<bool, CommandError> {
        let mut unique: Vec<KeySelection> = Vec::with_capacity(selection.len());
        for sel in selection {
            if !unique.contains(sel) {
                unique.push(*sel);
            }
        }
        if unique.is_empty() || delta == 0 {
            return Ok(false);
        }
        if !self.can_move_keyframes(&unique, delta) {
            trace!("Timeline: drag by {} rejected", delta);
            return Ok(false);
        }

        let mut children: Vec<BoxedCommand<Tracks>> = Vec::with_capacity(unique.len());
        for sel in &unique {
            let kf = self
                .tracks
                .get(sel.track)
                .and_then(|t| t.get_keyframe_at_frame(sel.frame))
                .copied()
                .ok_or(CommandError::KeyFrameNotFound {
                    track: sel.track,
                    frame: sel.frame,
                })?;
            let command = MoveKeyFrame::new(&self.tracks, sel.track, kf, sel.frame + delta, kf.value)?;
            children.push(Box::new(command));
        }

        let command: BoxedCommand<Tracks> = if children.len() == 1 {
            children.remove(0)
        } else {
            Box::new(MacroCommand::new("Move multiple keyframes", children))
        };
        debug!("Timeline: '{}' by {}", command.title(), delta);
        self.push(command)?;
        Ok(true)
    }
}
