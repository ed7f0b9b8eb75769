//! Animation: a named, ordered sequence of frames.
//!
//! Structural changes (create/insert/remove/update of frames) are announced
//! right after they are applied: the frame-level event first, then
//! [`AnimationModified`]. Sprite-level edits inside a frame only raise the
//! frame's dirty flag; [`Animation::commit_frame_changes`] turns those into
//! `FrameModified` events in one sweep.
//!
//! An animation built outside a collection carries a dummy emitter, so it can
//! be edited and tested without a bus.

use std::collections::HashSet;

use log::{debug, trace};
use serde_json::{Value, json};
use uuid::Uuid;

use super::animation_events::{AnimationModified, FrameAdded, FrameModified, FrameRemoved};
use super::frame::{Frame, FrameUpdate};
use super::keys::*;
use super::traits::{Fields, Identified, TreeNode, position_by_id, relocate};
use crate::core::event_bus::EntityEmitter;
use crate::error::{ModelError, TreeError};

#[derive(Debug, Clone)]
pub struct Animation {
    id: Uuid,
    name: String,
    frames: Vec<Frame>,
    /// Frames handed out mutably since the last commit
    pending: HashSet<Uuid>,
    emitter: EntityEmitter,
}

impl PartialEq for Animation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.frames == other.frames
    }
}

impl Animation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            frames: Vec::new(),
            pending: HashSet::new(),
            emitter: EntityEmitter::dummy(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach to a bus (done by the owning collection).
    pub fn set_event_emitter(&mut self, emitter: EntityEmitter) {
        self.emitter = emitter;
    }

    pub(crate) fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.emitter.emit(AnimationModified(self.id));
    }

    fn announce_added(&self, frame_id: Uuid) {
        debug!("Animation '{}': added frame {}", self.name, frame_id);
        self.emitter.emit(FrameAdded {
            animation_id: self.id,
            frame_id,
        });
        self.emitter.emit(AnimationModified(self.id));
    }

    // === Frames ===

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Create a frame with fresh identity and append it.
    pub fn create_frame(&mut self, name: impl Into<String>, ticks: u32) -> &mut Frame {
        let frame = Frame::with_ticks(name, ticks);
        let frame_id = frame.id();
        self.frames.push(frame);
        self.announce_added(frame_id);
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    /// Append an existing frame.
    pub fn add_frame(&mut self, frame: Frame) -> Result<&mut Frame, ModelError> {
        let idx = self.frames.len();
        self.insert_frame(idx, frame)
    }

    /// Insert at `index` (clamped to the end of the list).
    pub fn insert_frame(&mut self, index: usize, frame: Frame) -> Result<&mut Frame, ModelError> {
        let frame_id = frame.id();
        if self.frame_index(frame_id).is_some() {
            return Err(ModelError::DuplicateId(frame_id));
        }
        let idx = index.min(self.frames.len());
        self.frames.insert(idx, frame);
        self.announce_added(frame_id);
        Ok(&mut self.frames[idx])
    }

    pub fn remove_frame(&mut self, id: Uuid) -> Option<Frame> {
        let Some(idx) = self.frame_index(id) else {
            trace!("Animation '{}': remove_frame {} not found", self.name, id);
            return None;
        };
        let frame = self.frames.remove(idx);
        self.pending.remove(&id);
        debug!("Animation '{}': removed frame '{}'", self.name, frame.name());
        self.emitter.emit(FrameRemoved {
            animation_id: self.id,
            frame_id: id,
        });
        self.emitter.emit(AnimationModified(self.id));
        Some(frame)
    }

    pub fn get_frame(&self, id: Uuid) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id() == id)
    }

    /// Mutable handle; the frame is swept by the next commit.
    pub fn frame_mut(&mut self, id: Uuid) -> Option<&mut Frame> {
        let idx = self.frame_index(id)?;
        self.pending.insert(id);
        Some(&mut self.frames[idx])
    }

    pub fn frame_at(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_at_mut(&mut self, index: usize) -> Option<&mut Frame> {
        let frame = self.frames.get_mut(index)?;
        self.pending.insert(frame.id());
        Some(frame)
    }

    pub fn frame_index(&self, id: Uuid) -> Option<usize> {
        position_by_id(&self.frames, id)
    }

    /// Apply `update` to the frame and announce it immediately.
    /// Returns whether the frame existed.
    pub fn update_frame(&mut self, id: Uuid, update: &FrameUpdate) -> bool {
        let Some(idx) = self.frame_index(id) else {
            return false;
        };
        self.frames[idx].apply_update(update);
        self.emitter.emit(FrameModified {
            animation_id: self.id,
            frame_id: id,
        });
        self.emitter.emit(AnimationModified(self.id));
        true
    }

    /// Stable relocation of one frame.
    pub fn move_frame(&mut self, from: usize, to: usize) -> bool {
        if !relocate(&mut self.frames, from, to) {
            return false;
        }
        if from != to {
            self.emitter.emit(AnimationModified(self.id));
        }
        true
    }

    // === Timing ===

    /// Sum of frame durations, always derived from the current frame list.
    /// Saturates at `u32::MAX`.
    pub fn total_ticks(&self) -> u32 {
        sum_ticks(&self.frames)
    }

    /// Index of the frame showing at `tick` (0-based), `None` past the end.
    pub fn frame_index_at_tick(&self, tick: u32) -> Option<usize> {
        let tick = u64::from(tick);
        let mut end = 0u64;
        for (idx, frame) in self.frames.iter().enumerate() {
            end += u64::from(frame.ticks());
            if tick < end {
                return Some(idx);
            }
        }
        None
    }

    pub fn frame_at_tick(&self, tick: u32) -> Option<&Frame> {
        self.frame_index_at_tick(tick).and_then(|idx| self.frames.get(idx))
    }

    /// First tick of the frame at `index`.
    pub fn frame_start_tick(&self, index: usize) -> Option<u32> {
        if index >= self.frames.len() {
            return None;
        }
        Some(sum_ticks(&self.frames[..index]))
    }

    // === Dirty tracking ===

    /// Ids handed out through `frame_mut` since the last commit.
    pub fn pending_frames(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.pending.iter().copied()
    }

    pub fn has_modified_frames(&self) -> bool {
        self.frames.iter().any(Frame::is_modified)
    }

    /// Sweep every frame: each dirty one yields exactly one `FrameModified`
    /// (followed by `AnimationModified`) and gets its flag cleared.
    /// Returns the number of frames surfaced.
    pub fn commit_frame_changes(&mut self) -> usize {
        self.pending.clear();
        let mut surfaced = 0;
        for idx in 0..self.frames.len() {
            if !self.frames[idx].commit() {
                continue;
            }
            surfaced += 1;
            self.emitter.emit(FrameModified {
                animation_id: self.id,
                frame_id: self.frames[idx].id(),
            });
            self.emitter.emit(AnimationModified(self.id));
        }
        if surfaced > 0 {
            debug!("Animation '{}': committed {} frame(s)", self.name, surfaced);
        }
        surfaced
    }
}

fn sum_ticks(frames: &[Frame]) -> u32 {
    frames.iter().fold(0u32, |acc, f| acc.saturating_add(f.ticks()))
}

impl Identified for Animation {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl<'a> IntoIterator for &'a Animation {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl TreeNode for Animation {
    fn to_tree(&self) -> Value {
        let frames: Vec<Value> = self.frames.iter().map(TreeNode::to_tree).collect();
        json!({
            A_ID: self.id.to_string(),
            A_NAME: self.name,
            A_FRAMES: frames,
        })
    }

    fn from_tree(tree: &Value) -> Result<Self, TreeError> {
        let f = Fields::new(tree, "animation")?;
        let mut animation = Self::new(f.str_or(A_NAME, "")?);
        animation.id = f.id(A_ID)?;
        for node in f.array(A_FRAMES)? {
            let frame = Frame::from_tree(node)?;
            if animation.frame_index(frame.id()).is_some() {
                return Err(TreeError::DuplicateId(frame.id()));
            }
            animation.frames.push(frame);
        }
        Ok(animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use crate::entities::sprite::Sprite;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn attached(name: &str) -> (EventBus, Animation) {
        let bus = EventBus::new();
        let mut anim = Animation::new(name);
        anim.set_event_emitter(EntityEmitter::from_emitter(bus.emitter()));
        (bus, anim)
    }

    fn record<E: Clone + 'static>(bus: &EventBus) -> Rc<RefCell<Vec<E>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe::<E, _>(move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    #[test]
    fn test_total_ticks_tracks_frame_list() {
        let mut anim = Animation::new("WALK");
        assert_eq!(anim.total_ticks(), 0);
        let a = anim.create_frame("WALK_0", 4).id();
        let b = anim.create_frame("WALK_1", 2).id();
        assert_eq!(anim.total_ticks(), 6);
        anim.update_frame(b, &FrameUpdate::ticks(5));
        assert_eq!(anim.total_ticks(), 9);
        anim.remove_frame(a);
        assert_eq!(anim.total_ticks(), 5);
        anim.frame_mut(b).unwrap().set_ticks(0);
        assert_eq!(anim.total_ticks(), 1);
    }

    #[test]
    fn test_frame_events_followed_by_animation_modified() {
        let (bus, mut anim) = attached("WALK");
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["added", "removed", "modified", "anim"] {
            let o = Rc::clone(&order);
            match tag {
                "added" => bus.subscribe::<FrameAdded, _>(move |_| o.borrow_mut().push(tag)),
                "removed" => bus.subscribe::<FrameRemoved, _>(move |_| o.borrow_mut().push(tag)),
                "modified" => bus.subscribe::<FrameModified, _>(move |_| o.borrow_mut().push(tag)),
                _ => bus.subscribe::<AnimationModified, _>(move |_| o.borrow_mut().push(tag)),
            };
        }

        let id = anim.create_frame("WALK_0", 1).id();
        assert!(anim.update_frame(id, &FrameUpdate::ticks(3)));
        anim.remove_frame(id);

        assert_eq!(
            *order.borrow(),
            vec!["added", "anim", "modified", "anim", "removed", "anim"]
        );
    }

    #[test]
    fn test_missing_ids_are_not_errors() {
        let (bus, mut anim) = attached("JUMP");
        let modified = record::<AnimationModified>(&bus);
        let ghost = Uuid::new_v4();

        assert!(anim.remove_frame(ghost).is_none());
        assert!(anim.get_frame(ghost).is_none());
        assert!(anim.frame_mut(ghost).is_none());
        assert!(!anim.update_frame(ghost, &FrameUpdate::ticks(2)));
        assert!(modified.borrow().is_empty());
    }

    #[test]
    fn test_commit_surfaces_each_dirty_frame_once() {
        let (bus, mut anim) = attached("WALK");
        let clean = anim.create_frame("WALK_0", 4).id();
        let dirty = anim.create_frame("WALK_1", 4).id();
        let seen = record::<FrameModified>(&bus);

        anim.frame_mut(dirty)
            .unwrap()
            .add_sprite(Sprite::new("HEAD_1"))
            .unwrap();
        // Handed out but never touched: not dirty
        anim.frame_mut(clean);
        assert!(anim.get_frame(dirty).unwrap().is_modified());
        assert_eq!(anim.pending_frames().count(), 2);

        assert_eq!(anim.commit_frame_changes(), 1);
        assert!(!anim.get_frame(dirty).unwrap().is_modified());
        assert_eq!(anim.pending_frames().count(), 0);
        assert_eq!(
            *seen.borrow(),
            vec![FrameModified {
                animation_id: anim.id(),
                frame_id: dirty,
            }]
        );

        // Second commit has nothing to report
        assert_eq!(anim.commit_frame_changes(), 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_insert_and_duplicate() {
        let mut anim = Animation::new("SHOOT");
        anim.create_frame("SHOOT_0", 1);
        let frame = Frame::new("SHOOT_X");
        let dup = frame.clone();
        anim.insert_frame(0, frame).unwrap();
        assert_eq!(anim.frame_at(0).map(Frame::name), Some("SHOOT_X"));
        assert!(matches!(anim.add_frame(dup), Err(ModelError::DuplicateId(_))));
        assert_eq!(anim.len(), 2);
    }

    #[test]
    fn test_move_frame_stable() {
        let mut anim = Animation::new("A");
        for n in ["0", "1", "2"] {
            anim.create_frame(n, 1);
        }
        assert!(anim.move_frame(0, 2));
        let names: Vec<&str> = anim.iter().map(Frame::name).collect();
        assert_eq!(names, vec!["1", "2", "0"]);
        assert!(!anim.move_frame(3, 0));
    }

    #[test]
    fn test_frame_at_tick() {
        let mut anim = Animation::new("A");
        anim.create_frame("a", 2);
        anim.create_frame("b", 3);
        assert_eq!(anim.frame_at_tick(0).map(Frame::name), Some("a"));
        assert_eq!(anim.frame_at_tick(1).map(Frame::name), Some("a"));
        assert_eq!(anim.frame_at_tick(2).map(Frame::name), Some("b"));
        assert_eq!(anim.frame_at_tick(4).map(Frame::name), Some("b"));
        assert!(anim.frame_at_tick(5).is_none());
        assert_eq!(anim.frame_start_tick(1), Some(2));
        assert_eq!(anim.frame_start_tick(2), None);
    }

    #[test]
    fn test_huge_tick_counts_saturate() {
        let mut anim = Animation::new("LONG");
        anim.create_frame("a", u32::MAX);
        anim.create_frame("b", 2);
        assert_eq!(anim.total_ticks(), u32::MAX);
        assert_eq!(anim.frame_start_tick(1), Some(u32::MAX));
        assert_eq!(anim.frame_at_tick(u32::MAX - 1).map(Frame::name), Some("a"));
        assert_eq!(anim.frame_at_tick(u32::MAX).map(Frame::name), Some("b"));

        // Same through a loaded tree
        let mut src = Animation::new("LOADED");
        src.create_frame("x", u32::MAX);
        src.create_frame("y", u32::MAX);
        let loaded = Animation::from_tree(&src.to_tree()).unwrap();
        assert_eq!(loaded.total_ticks(), u32::MAX);
        assert_eq!(loaded.frame_at_tick(u32::MAX).map(Frame::name), Some("y"));
        assert_eq!(loaded.frame_index_at_tick(0), Some(0));
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut anim = Animation::new("A");
        anim.create_frame("x", 1);
        anim.create_frame("y", 1);
        let first: Vec<Uuid> = (&anim).into_iter().map(Frame::id).collect();
        let second: Vec<Uuid> = anim.iter().map(Frame::id).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_tree_round_trip() {
        let mut anim = Animation::new("WALK");
        anim.create_frame("WALK_0", 4).create_sprite("LEG").set_position(160, 22);
        anim.create_frame("WALK_1", 4);
        let back = Animation::from_tree(&anim.to_tree()).unwrap();
        assert_eq!(back, anim);
        assert_eq!(back.total_ticks(), 8);
    }
}
