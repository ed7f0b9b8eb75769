//! AnimationCollection: top-level container of animations keyed by id.
//!
//! The collection owns the [`EventBus`] every view subscribes to. Each
//! animation it adopts gets an emitter for that bus; a deleted animation is
//! detached before it is handed back, so later edits on it stay silent.
//!
//! Iteration order is insertion order of the surviving animations.
//!
//! # Persistence
//!
//! ```json
//! {"animations": {"<uuid>": {"id": "<uuid>", "name": "WALK", "frames": [...]}}}
//! ```
//!
//! The map key is authoritative for the animation id. [`AnimationCollection::load_tree`]
//! parses the whole tree before touching the current contents, then fires a
//! single [`CollectionLoaded`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::animation::Animation;
use super::animation_events::{AnimationAdded, AnimationRemoved, CollectionLoaded};
use super::keys::*;
use super::traits::{Fields, Identified, TreeNode, parse_id};
use crate::core::event_bus::{EntityEmitter, EventBus};
use crate::error::{ModelError, TreeError};

#[derive(Default)]
pub struct AnimationCollection {
    animations: IndexMap<Uuid, Animation>,
    bus: EventBus,
}

impl std::fmt::Debug for AnimationCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationCollection")
            .field("animations", &self.animations.len())
            .field("bus", &self.bus)
            .finish()
    }
}

/// Equal when the animations (ids, names, frames, order) match. The bus is ignored.
impl PartialEq for AnimationCollection {
    fn eq(&self, other: &Self) -> bool {
        self.animations.len() == other.animations.len()
            && self
                .animations
                .iter()
                .zip(other.animations.iter())
                .all(|((ka, a), (kb, b))| ka == kb && a == b)
    }
}

impl AnimationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection publishing on an existing bus.
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            animations: IndexMap::new(),
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn emitter(&self) -> EntityEmitter {
        EntityEmitter::from_emitter(self.bus.emitter())
    }

    // === CRUD ===

    /// Create an empty animation with fresh identity.
    pub fn create_animation(&mut self, name: impl Into<String>) -> &mut Animation {
        let mut animation = Animation::new(name);
        animation.set_event_emitter(self.emitter());
        let id = animation.id();
        debug!("Collection: created animation '{}' ({})", animation.name(), id);
        let slot = self.animations.entry(id).or_insert(animation);
        self.bus.emit(AnimationAdded(id));
        slot
    }

    /// Create an animation together with its first frame `"{name}_0"`.
    pub fn create_animation_with_frame(&mut self, name: &str, ticks: u32) -> &mut Animation {
        let animation = self.create_animation(name);
        animation.create_frame(format!("{}_0", name), ticks);
        animation
    }

    /// Adopt an animation built elsewhere. Its id must not be taken.
    pub fn add_animation(&mut self, mut animation: Animation) -> Result<&mut Animation, ModelError> {
        let id = animation.id();
        if self.animations.contains_key(&id) {
            return Err(ModelError::DuplicateId(id));
        }
        animation.set_event_emitter(self.emitter());
        let slot = self.animations.entry(id).or_insert(animation);
        self.bus.emit(AnimationAdded(id));
        Ok(slot)
    }

    pub fn get_animation(&self, id: Uuid) -> Option<&Animation> {
        self.animations.get(&id)
    }

    pub fn get_animation_mut(&mut self, id: Uuid) -> Option<&mut Animation> {
        self.animations.get_mut(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.animations.contains_key(&id)
    }

    /// Rename. Returns whether the animation existed.
    pub fn update_animation(&mut self, id: Uuid, name: impl Into<String>) -> bool {
        match self.animations.get_mut(&id) {
            Some(animation) => {
                animation.rename(name);
                true
            }
            None => {
                trace!("Collection: update_animation {} not found", id);
                false
            }
        }
    }

    /// Remove and return the animation, detached from the bus.
    pub fn delete_animation(&mut self, id: Uuid) -> Option<Animation> {
        let mut animation = self.animations.shift_remove(&id)?;
        animation.set_event_emitter(EntityEmitter::dummy());
        debug!("Collection: deleted animation '{}' ({})", animation.name(), id);
        self.bus.emit(AnimationRemoved(id));
        Some(animation)
    }

    /// Current animations in container order.
    pub fn list_animations(&self) -> Vec<&Animation> {
        self.animations.values().collect()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.animations.keys().copied().collect()
    }

    pub fn animation_at(&self, index: usize) -> Option<&Animation> {
        self.animations.get_index(index).map(|(_, a)| a)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Animation> {
        self.animations.values().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> indexmap::map::Values<'_, Uuid, Animation> {
        self.animations.values()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Commit pending frame changes in every animation.
    /// Returns the total number of frames surfaced.
    pub fn commit_all(&mut self) -> usize {
        self.animations
            .values_mut()
            .map(Animation::commit_frame_changes)
            .sum()
    }

    /// Unique name based on `source`: trailing digits and `_` are stripped,
    /// then `base_N` with N one past the highest number in use.
    pub fn gen_name(&self, source: &str) -> String {
        let base = {
            let name = source.trim_end_matches(|c: char| c.is_ascii_digit());
            let name = name.trim_end_matches('_');
            if name.is_empty() { "animation" } else { name }
        };

        let mut max_num = 0u32;
        for animation in self.animations.values() {
            if let Some(rest) = animation.name().strip_prefix(base) {
                if let Ok(n) = rest.trim_start_matches('_').parse::<u32>() {
                    max_num = max_num.max(n);
                }
            }
        }
        format!("{}_{}", base, max_num + 1)
    }

    // === Persistence ===

    fn parse_animations(tree: &Value) -> Result<IndexMap<Uuid, Animation>, TreeError> {
        let f = Fields::new(tree, "collection")?;
        let mut animations = IndexMap::new();
        let Some(entries) = f.object(A_ANIMATIONS)? else {
            return Ok(animations);
        };
        for (key, node) in entries {
            let id = parse_id(key)?;
            let mut animation = Animation::from_tree(node)?;
            animation.set_id(id);
            if animations.insert(id, animation).is_some() {
                return Err(TreeError::DuplicateId(id));
            }
        }
        Ok(animations)
    }

    /// Replace the contents from a tree. Fires `CollectionLoaded` once.
    /// On error the collection is left untouched.
    pub fn load_tree(&mut self, tree: &Value) -> Result<(), TreeError> {
        let mut animations = Self::parse_animations(tree)?;
        for animation in animations.values_mut() {
            animation.set_event_emitter(self.emitter());
        }
        self.animations = animations;
        info!("Collection: loaded {} animation(s)", self.animations.len());
        self.bus.emit(CollectionLoaded);
        Ok(())
    }

    /// Write the pretty-printed tree. A non-`.json` path gets the extension
    /// replaced. Returns the path actually written.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, TreeError> {
        let json = serde_json::to_string_pretty(&self.to_tree())?;

        let path = path.as_ref();
        let path = if path.extension().and_then(|s| s.to_str()) != Some("json") {
            path.with_extension("json")
        } else {
            path.to_path_buf()
        };

        fs::write(&path, json)?;
        info!("Collection: saved {} animation(s) to {}", self.animations.len(), path.display());
        Ok(path)
    }

    /// Read a file written by [`save_json`](Self::save_json) into this collection.
    pub fn load_json<P: AsRef<Path>>(&mut self, path: P) -> Result<(), TreeError> {
        let json = fs::read_to_string(path.as_ref())?;
        let tree: Value = serde_json::from_str(&json)?;
        self.load_tree(&tree)
    }
}

impl<'a> IntoIterator for &'a AnimationCollection {
    type Item = &'a Animation;
    type IntoIter = indexmap::map::Values<'a, Uuid, Animation>;

    fn into_iter(self) -> Self::IntoIter {
        self.animations.values()
    }
}

impl TreeNode for AnimationCollection {
    fn to_tree(&self) -> Value {
        let mut animations = Map::new();
        for (id, animation) in &self.animations {
            animations.insert(id.to_string(), animation.to_tree());
        }
        let mut root = Map::new();
        root.insert(A_ANIMATIONS.to_string(), Value::Object(animations));
        Value::Object(root)
    }

    /// Standalone collection on a fresh bus. No event is emitted.
    fn from_tree(tree: &Value) -> Result<Self, TreeError> {
        let mut collection = Self::new();
        let mut animations = Self::parse_animations(tree)?;
        for animation in animations.values_mut() {
            animation.set_event_emitter(collection.emitter());
        }
        collection.animations = animations;
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::animation_events::{AnimationModified, FrameAdded};
    use crate::entities::frame::Frame;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    fn counter<E: 'static>(bus: &EventBus) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe::<E, _>(move |_| c.set(c.get() + 1));
        count
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("musa_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_ids_unique_across_create_delete() {
        let mut c = AnimationCollection::new();
        let mut deleted = Vec::new();
        for i in 0..20 {
            let id = c.create_animation(format!("A{}", i)).id();
            if i % 3 == 0 {
                c.delete_animation(id);
                deleted.push(id);
            }
        }
        let live: HashSet<Uuid> = c.iter().map(|a| a.id()).collect();
        assert_eq!(live.len(), c.len());
        assert!(deleted.iter().all(|id| !live.contains(id)));
    }

    #[test]
    fn test_create_emits_added_after_insert() {
        let mut c = AnimationCollection::new();
        let added = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&added);
        c.bus().subscribe::<AnimationAdded, _>(move |e| sink.borrow_mut().push(e.0));

        let id = c.create_animation("WALK").id();
        assert_eq!(*added.borrow(), vec![id]);
        assert_eq!(c.get_animation(id).map(Animation::name), Some("WALK"));
    }

    #[test]
    fn test_create_with_first_frame() {
        let mut c = AnimationCollection::new();
        let frames = counter::<FrameAdded>(c.bus());
        let anim = c.create_animation_with_frame("SHOOT", 1);
        assert_eq!(anim.frame_at(0).map(Frame::name), Some("SHOOT_0"));
        assert_eq!(frames.get(), 1);
    }

    #[test]
    fn test_rename_and_missing() {
        let mut c = AnimationCollection::new();
        let modified = counter::<AnimationModified>(c.bus());
        let id = c.create_animation("WALK").id();

        assert!(c.update_animation(id, "RUN"));
        assert_eq!(c.get_animation(id).map(Animation::name), Some("RUN"));
        assert_eq!(modified.get(), 1);

        let ghost = Uuid::new_v4();
        assert!(!c.update_animation(ghost, "X"));
        assert!(c.delete_animation(ghost).is_none());
        assert!(c.get_animation(ghost).is_none());
    }

    #[test]
    fn test_deleted_animation_is_detached() {
        let mut c = AnimationCollection::new();
        let modified = counter::<AnimationModified>(c.bus());
        let removed = counter::<AnimationRemoved>(c.bus());
        let id = c.create_animation("WALK").id();

        let mut gone = c.delete_animation(id).unwrap();
        assert_eq!(removed.get(), 1);
        gone.rename("ZOMBIE");
        assert_eq!(modified.get(), 0);
        // Stale id lookups are plain misses
        assert!(c.get_animation(id).is_none());
    }

    #[test]
    fn test_survivors_keep_insertion_order() {
        let mut c = AnimationCollection::new();
        let ids: Vec<Uuid> = ["A", "B", "C", "D"]
            .iter()
            .map(|n| c.create_animation(*n).id())
            .collect();
        c.delete_animation(ids[1]);
        let names: Vec<&str> = c.list_animations().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
        assert_eq!(c.animation_at(1).map(Animation::name), Some("C"));
    }

    #[test]
    fn test_add_animation_duplicate() {
        let mut c = AnimationCollection::new();
        let anim = Animation::new("JUMP");
        let copy = anim.clone();
        c.add_animation(anim).unwrap();
        assert!(matches!(c.add_animation(copy), Err(ModelError::DuplicateId(_))));
    }

    #[test]
    fn test_commit_all() {
        let mut c = AnimationCollection::new();
        for name in ["A", "B"] {
            let anim = c.create_animation_with_frame(name, 1);
            let frame_id = anim.frame_at(0).unwrap().id();
            anim.frame_mut(frame_id).unwrap().create_sprite("P");
        }
        assert_eq!(c.commit_all(), 2);
        assert_eq!(c.commit_all(), 0);
    }

    #[test]
    fn test_walk_scenario() {
        let mut c = AnimationCollection::new();
        let anim = c.create_animation("WALK");
        let anim_id = anim.id();
        let frame = anim.create_frame("WALK_0", 4);
        frame.create_sprite("HEAD_1");
        frame.create_sprite("LEG_2");
        let frame_id = frame.id();
        assert_eq!(anim.total_ticks(), 4);
        anim.remove_frame(frame_id);
        assert_eq!(anim.total_ticks(), 0);

        let back = AnimationCollection::from_tree(&c.to_tree()).unwrap();
        assert_eq!(back, c);
        let walk = back.get_animation(anim_id).unwrap();
        assert_eq!(walk.name(), "WALK");
        assert!(walk.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let mut c = AnimationCollection::new();
        for name in ["WALK", "SHOOT", "JUMP"] {
            let anim = c.create_animation(name);
            for i in 0..3 {
                let frame = anim.create_frame(format!("{}_{}", name, i), 4);
                frame.create_sprite("HEAD_1").set_position(150, 10);
                frame.create_sprite("ARM").set_v_flip(true);
            }
        }
        let tree = c.to_tree();
        let back = AnimationCollection::from_tree(&tree).unwrap();
        assert_eq!(back, c);
        let names: Vec<&str> = back.iter().map(Animation::name).collect();
        assert_eq!(names, vec!["WALK", "SHOOT", "JUMP"]);
    }

    #[test]
    fn test_load_tree_fires_loaded_once() {
        let mut source = AnimationCollection::new();
        source.create_animation_with_frame("WALK", 4);
        source.create_animation("JUMP");
        let tree = source.to_tree();

        let mut c = AnimationCollection::new();
        let loaded = counter::<CollectionLoaded>(c.bus());
        let added = counter::<AnimationAdded>(c.bus());
        let frames = counter::<FrameAdded>(c.bus());
        c.load_tree(&tree).unwrap();

        assert_eq!(loaded.get(), 1);
        assert_eq!(added.get(), 0);
        assert_eq!(frames.get(), 0);
        assert_eq!(c, source);
    }

    #[test]
    fn test_loaded_animations_are_attached() {
        let mut source = AnimationCollection::new();
        let id = source.create_animation("WALK").id();
        let mut c = AnimationCollection::new();
        c.load_tree(&source.to_tree()).unwrap();
        let modified = counter::<AnimationModified>(c.bus());
        assert!(c.update_animation(id, "RUN"));
        assert_eq!(modified.get(), 1);
    }

    #[test]
    fn test_failed_load_leaves_collection_untouched() {
        let mut c = AnimationCollection::new();
        c.create_animation("KEEP");
        let bad = json!({"animations": {"not-a-uuid": {"name": "X"}}});
        assert!(matches!(c.load_tree(&bad), Err(TreeError::InvalidId(_))));
        assert_eq!(c.len(), 1);

        let id = Uuid::new_v4().to_string();
        let bad = json!({"animations": {id: {"frames": [{"ticks": "four"}]}}});
        assert!(matches!(c.load_tree(&bad), Err(TreeError::InvalidField { field: "ticks", .. })));
        assert_eq!(c.find_by_name("KEEP").map(Animation::len), Some(0));
    }

    #[test]
    fn test_map_key_wins_over_inner_id() {
        let key = Uuid::new_v4();
        let tree = json!({"animations": {key.to_string(): {"id": Uuid::new_v4().to_string(), "name": "W"}}});
        let c = AnimationCollection::from_tree(&tree).unwrap();
        assert_eq!(c.animation_at(0).map(|a| a.id()), Some(key));
    }

    #[test]
    fn test_empty_tree() {
        let c = AnimationCollection::from_tree(&json!({})).unwrap();
        assert!(c.is_empty());
        assert!(AnimationCollection::from_tree(&json!("nope")).is_err());
    }

    #[test]
    fn test_gen_name() {
        let mut c = AnimationCollection::new();
        assert_eq!(c.gen_name("WALK"), "WALK_1");
        c.create_animation("WALK_1");
        c.create_animation("WALK_4");
        assert_eq!(c.gen_name("WALK_1"), "WALK_5");
        assert_eq!(c.gen_name("123"), "animation_1");
    }

    #[test]
    fn test_json_file_round_trip() {
        let mut c = AnimationCollection::new();
        c.create_animation_with_frame("WALK", 4)
            .frame_at_mut(0)
            .unwrap()
            .create_sprite("HEAD_1");
        let written = c.save_json(temp_path("walk.anim")).unwrap();
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("json"));

        let mut back = AnimationCollection::new();
        back.load_json(&written).unwrap();
        assert_eq!(back, c);
        let _ = fs::remove_dir_all(written.parent().unwrap());
    }
}
