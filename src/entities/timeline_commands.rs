//! Undoable keyframe edits over a timeline's track list.
//!
//! Commands address tracks by index and keyframes by value or by slot.
//! Preconditions are checked at execution time and reported as
//! [`CommandError`]; nothing is mutated when a check fails.

use std::collections::HashSet;

use super::keyframe::{KeyFrame, Track};
use crate::core::undo::Command;
use crate::error::CommandError;

pub type Tracks = Vec<Track>;

fn track_mut(tracks: &mut Tracks, track: usize) -> Result<&mut Track, CommandError> {
    tracks.get_mut(track).ok_or(CommandError::TrackNotFound(track))
}

/// Last slot holding exactly `kf`.
fn rposition_exact(track: &Track, kf: KeyFrame) -> Option<usize> {
    track.keyframes().iter().rposition(|k| *k == kf)
}

/// Merged value for a set of keyframes: arithmetic mean, 0.0 for none.
pub fn merge_value(keyframes: &[KeyFrame]) -> f64 {
    if keyframes.is_empty() {
        return 0.0;
    }
    keyframes.iter().map(|k| k.value).sum::<f64>() / keyframes.len() as f64
}

// === Add ===

#[derive(Debug, Clone)]
pub struct AddKeyFrame {
    track: usize,
    keyframe: KeyFrame,
}

impl AddKeyFrame {
    pub fn new(track: usize, frame: i32, value: f64) -> Self {
        Self {
            track,
            keyframe: KeyFrame::new(frame, value),
        }
    }
}

impl Command<Tracks> for AddKeyFrame {
    fn title(&self) -> &str {
        "Add keyframe"
    }

    fn apply(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        track_mut(tracks, self.track)?.keyframes_mut().push(self.keyframe);
        Ok(())
    }

    fn revert(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        let track = track_mut(tracks, self.track)?;
        let idx = rposition_exact(track, self.keyframe).ok_or(CommandError::KeyFrameNotFound {
            track: self.track,
            frame: self.keyframe.frame,
        })?;
        track.keyframes_mut().remove(idx);
        Ok(())
    }
}

// === Remove ===

#[derive(Debug, Clone)]
pub struct RemoveKeyFrame {
    track: usize,
    keyframe: KeyFrame,
    /// Slot it was removed from, restored on revert
    index: Option<usize>,
}

impl RemoveKeyFrame {
    pub fn new(track: usize, keyframe: KeyFrame) -> Self {
        Self {
            track,
            keyframe,
            index: None,
        }
    }
}

impl Command<Tracks> for RemoveKeyFrame {
    fn title(&self) -> &str {
        "Remove keyframe"
    }

    fn apply(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        let track = track_mut(tracks, self.track)?;
        let idx = track
            .keyframes()
            .iter()
            .position(|k| *k == self.keyframe)
            .ok_or(CommandError::KeyFrameNotFound {
                track: self.track,
                frame: self.keyframe.frame,
            })?;
        track.keyframes_mut().remove(idx);
        self.index = Some(idx);
        Ok(())
    }

    fn revert(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        let track = track_mut(tracks, self.track)?;
        let idx = self.index.unwrap_or(track.len()).min(track.len());
        track.keyframes_mut().insert(idx, self.keyframe);
        Ok(())
    }
}

// === Move ===

/// Replaces the keyframe in a fixed slot. The slot is resolved once, when the
/// command is built; replaying after other structural edits targets that
/// same slot whatever it holds by then.
#[derive(Debug, Clone)]
pub struct MoveKeyFrame {
    track: usize,
    index: usize,
    old: KeyFrame,
    new: KeyFrame,
}

impl MoveKeyFrame {
    /// Resolve `old` to its slot in `tracks[track]`.
    pub fn new(
        tracks: &Tracks,
        track: usize,
        old: KeyFrame,
        new_frame: i32,
        new_value: f64,
    ) -> Result<Self, CommandError> {
        let t = tracks.get(track).ok_or(CommandError::TrackNotFound(track))?;
        let index = t
            .keyframes()
            .iter()
            .position(|k| *k == old)
            .ok_or(CommandError::KeyFrameNotFound { track, frame: old.frame })?;
        Ok(Self {
            track,
            index,
            old,
            new: KeyFrame::new(new_frame, new_value),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn write(&self, tracks: &mut Tracks, kf: KeyFrame) -> Result<(), CommandError> {
        let track = track_mut(tracks, self.track)?;
        let slot = track
            .keyframes_mut()
            .get_mut(self.index)
            .ok_or(CommandError::IndexOutOfRange {
                track: self.track,
                index: self.index,
            })?;
        *slot = kf;
        Ok(())
    }
}

impl Command<Tracks> for MoveKeyFrame {
    fn title(&self) -> &str {
        "Move keyframe"
    }

    fn apply(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        self.write(tracks, self.new)
    }

    fn revert(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        self.write(tracks, self.old)
    }
}

// === Merge ===

/// Collapse every keyframe on `sources` into one keyframe on `target`.
#[derive(Debug, Clone)]
pub struct MergeKeyFrames {
    track: usize,
    sources: HashSet<i32>,
    target: i32,
    /// (slot, keyframe) captured on apply, ascending slots
    captured: Vec<(usize, KeyFrame)>,
    merged: Option<KeyFrame>,
}

impl MergeKeyFrames {
    pub fn new(track: usize, sources: impl IntoIterator<Item = i32>, target: i32) -> Self {
        Self {
            track,
            sources: sources.into_iter().collect(),
            target,
            captured: Vec::new(),
            merged: None,
        }
    }

    pub fn merged(&self) -> Option<KeyFrame> {
        self.merged
    }
}

impl Command<Tracks> for MergeKeyFrames {
    fn title(&self) -> &str {
        "Merge keyframes"
    }

    fn apply(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        let track = track_mut(tracks, self.track)?;
        let captured: Vec<(usize, KeyFrame)> = track
            .keyframes()
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, k)| self.sources.contains(&k.frame))
            .collect();

        let values: Vec<KeyFrame> = captured.iter().map(|(_, k)| *k).collect();
        let merged = KeyFrame::new(self.target, merge_value(&values));

        let keyframes = track.keyframes_mut();
        for (idx, _) in captured.iter().rev() {
            keyframes.remove(*idx);
        }
        keyframes.push(merged);

        self.captured = captured;
        self.merged = Some(merged);
        Ok(())
    }

    fn revert(&mut self, tracks: &mut Tracks) -> Result<(), CommandError> {
        let Some(merged) = self.merged else {
            return Ok(());
        };
        let track = track_mut(tracks, self.track)?;
        let idx = rposition_exact(track, merged).ok_or(CommandError::KeyFrameNotFound {
            track: self.track,
            frame: merged.frame,
        })?;
        let keyframes = track.keyframes_mut();
        keyframes.remove(idx);
        for (slot, kf) in &self.captured {
            let slot = (*slot).min(keyframes.len());
            keyframes.insert(slot, *kf);
        }
        Ok(())
    }
}
