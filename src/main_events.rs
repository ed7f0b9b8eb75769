//! Application event handling.
//!
//! Views raise `*Request` events on the bus; the app loop polls them and
//! routes each through [`handle_app_event`]. Model notifications
//! (`AnimationAdded`, `FrameModified`, ...) share the same queue and are
//! ignored here.
//!
//! Anything touching the filesystem is not done inline: it comes back as a
//! deferred action in [`EventResult`] and runs in `Shell::handle_deferred`.

use log::{debug, warn};
use std::path::PathBuf;

use crate::core::edit_events::*;
use crate::core::event_bus::{BoxedEvent, downcast_event};
use crate::core::player_events::*;
use crate::entities::FrameUpdate;
use crate::entities::traits::Identified;
use crate::shell::Shell;

/// Result of handling an app event - may contain deferred actions
#[derive(Debug, Default)]
pub struct EventResult {
    pub load_collection: Option<PathBuf>,
    pub save_collection: Option<PathBuf>,
    pub import_sheet: Option<ImportSheetRequest>,
}

impl EventResult {
    /// Fold a later result into this one. Later requests win.
    pub fn merge(&mut self, other: EventResult) {
        if other.load_collection.is_some() {
            self.load_collection = other.load_collection;
        }
        if other.save_collection.is_some() {
            self.save_collection = other.save_collection;
        }
        if other.import_sheet.is_some() {
            self.import_sheet = other.import_sheet;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.load_collection.is_none() && self.save_collection.is_none() && self.import_sheet.is_none()
    }
}

/// Handle a single app event (called from the event loop).
/// Returns Some(result) if the event was handled, None otherwise.
pub fn handle_app_event(event: &BoxedEvent, shell: &mut Shell) -> Option<EventResult> {
    let mut result = EventResult::default();

    // === Playback Control ===
    if downcast_event::<TogglePlayPauseRequest>(event).is_some() {
        shell.player.toggle_play_pause();
        debug!("TogglePlayPause: playing={}", shell.player.is_playing());
        return Some(result);
    }
    if downcast_event::<StopRequest>(event).is_some() {
        shell.player.stop();
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetTickRequest>(event) {
        if let Some(animation) = shell.active.and_then(|id| shell.collection.get_animation(id)) {
            shell.player.set_tick(e.0, animation);
        }
        return Some(result);
    }
    if downcast_event::<StepForwardRequest>(event).is_some() {
        if let Some(animation) = shell.active.and_then(|id| shell.collection.get_animation(id)) {
            shell.player.next_frame(animation);
        }
        return Some(result);
    }
    if downcast_event::<StepBackwardRequest>(event).is_some() {
        if let Some(animation) = shell.active.and_then(|id| shell.collection.get_animation(id)) {
            shell.player.prev_frame(animation);
        }
        return Some(result);
    }
    if downcast_event::<JumpToStartRequest>(event).is_some() {
        shell.player.to_start();
        return Some(result);
    }
    if downcast_event::<JumpToEndRequest>(event).is_some() {
        if let Some(animation) = shell.active.and_then(|id| shell.collection.get_animation(id)) {
            shell.player.to_end(animation);
        }
        return Some(result);
    }

    // === FPS / Loop ===
    if let Some(e) = downcast_event::<SetFpsRequest>(event) {
        shell.player.set_fps(e.0);
        shell.settings.fps = shell.player.fps();
        return Some(result);
    }
    if downcast_event::<IncreaseFpsRequest>(event).is_some() {
        shell.player.increase_fps();
        shell.settings.fps = shell.player.fps();
        return Some(result);
    }
    if downcast_event::<DecreaseFpsRequest>(event).is_some() {
        shell.player.decrease_fps();
        shell.settings.fps = shell.player.fps();
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetLoopRequest>(event) {
        shell.player.set_loop_enabled(e.0);
        shell.settings.loop_enabled = e.0;
        return Some(result);
    }
    if let Some(e) = downcast_event::<SelectAnimationRequest>(event) {
        shell.select_animation(e.0);
        return Some(result);
    }

    // === Animations ===
    if let Some(e) = downcast_event::<AddAnimationRequest>(event) {
        let name = match shell.collection.find_by_name(&e.0) {
            Some(_) => shell.collection.gen_name(&e.0),
            None => e.0.clone(),
        };
        let ticks = shell.settings.default_ticks;
        let id = shell.collection.create_animation_with_frame(&name, ticks).id();
        shell.select_animation(id);
        return Some(result);
    }
    if let Some(e) = downcast_event::<RenameAnimationRequest>(event) {
        if !shell.collection.update_animation(e.animation_id, e.name.as_str()) {
            warn!("Rename: animation {} not found", e.animation_id);
        }
        return Some(result);
    }
    if let Some(e) = downcast_event::<RemoveAnimationRequest>(event) {
        if shell.collection.delete_animation(e.0).is_none() {
            warn!("Remove: animation {} not found", e.0);
        } else if shell.active == Some(e.0) {
            shell.active = shell.collection.ids().first().copied();
            shell.player.stop();
            shell.player.to_start();
        }
        return Some(result);
    }

    // === Frames ===
    if let Some(e) = downcast_event::<AddFrameRequest>(event) {
        let ticks = e.ticks.unwrap_or(shell.settings.default_ticks);
        match shell.collection.get_animation_mut(e.animation_id) {
            Some(animation) => {
                let name = format!("{}_{}", animation.name(), animation.len());
                animation.create_frame(name, ticks);
            }
            None => warn!("AddFrame: animation {} not found", e.animation_id),
        }
        return Some(result);
    }
    if let Some(e) = downcast_event::<RemoveFrameRequest>(event) {
        let removed = shell
            .collection
            .get_animation_mut(e.animation_id)
            .and_then(|a| a.remove_frame(e.frame_id));
        if removed.is_none() {
            warn!("RemoveFrame: frame {} not found in {}", e.frame_id, e.animation_id);
        }
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetFrameTicksRequest>(event) {
        let updated = shell
            .collection
            .get_animation_mut(e.animation_id)
            .is_some_and(|a| a.update_frame(e.frame_id, &FrameUpdate::ticks(e.ticks)));
        if !updated {
            warn!("SetFrameTicks: frame {} not found in {}", e.frame_id, e.animation_id);
        }
        return Some(result);
    }

    // === Sprites ===
    if let Some(e) = downcast_event::<MoveSpriteRequest>(event) {
        if let Some(animation) = shell.collection.get_animation_mut(e.animation_id) {
            let moved = animation
                .frame_mut(e.frame_id)
                .is_some_and(|f| f.move_sprite(e.from, e.to));
            if !moved {
                warn!("MoveSprite: {} -> {} rejected in frame {}", e.from, e.to, e.frame_id);
            }
            animation.commit_frame_changes();
        }
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetSpriteVisibilityRequest>(event) {
        if let Some(animation) = shell.collection.get_animation_mut(e.animation_id) {
            if let Some(frame) = animation.frame_mut(e.frame_id) {
                frame.set_sprite_visibility(e.index, e.visible);
            }
            animation.commit_frame_changes();
        }
        return Some(result);
    }

    // === History ===
    if downcast_event::<UndoRequest>(event).is_some() {
        if let Err(err) = shell.timeline.undo() {
            warn!("Undo failed: {}", err);
            shell.error_msg = Some(format!("Undo failed: {}", err));
        }
        return Some(result);
    }
    if downcast_event::<RedoRequest>(event).is_some() {
        if let Err(err) = shell.timeline.redo() {
            warn!("Redo failed: {}", err);
            shell.error_msg = Some(format!("Redo failed: {}", err));
        }
        return Some(result);
    }

    // === Deferred (filesystem) ===
    if let Some(e) = downcast_event::<ImportSheetRequest>(event) {
        result.import_sheet = Some(e.clone());
        return Some(result);
    }
    if let Some(e) = downcast_event::<SaveCollectionRequest>(event) {
        result.save_collection = Some(e.0.clone());
        return Some(result);
    }
    if let Some(e) = downcast_event::<LoadCollectionRequest>(event) {
        result.load_collection = Some(e.0.clone());
        return Some(result);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::animation_events::AnimationAdded;
    use crate::entities::{KeyFrame, Track};

    fn shell_with_walk() -> (Shell, uuid::Uuid) {
        let mut shell = Shell::new();
        shell.bus.emit(AddAnimationRequest("WALK".into()));
        shell.process_events();
        let id = shell.active.unwrap();
        (shell, id)
    }

    #[test]
    fn test_model_notifications_are_not_handled() {
        let mut shell = Shell::new();
        let event: BoxedEvent = Box::new(AnimationAdded(uuid::Uuid::new_v4()));
        assert!(handle_app_event(&event, &mut shell).is_none());
    }

    #[test]
    fn test_add_animation_selects_it() {
        let (shell, id) = shell_with_walk();
        let walk = shell.collection.get_animation(id).unwrap();
        assert_eq!(walk.name(), "WALK");
        assert_eq!(walk.frames()[0].name(), "WALK_0");
    }

    #[test]
    fn test_add_animation_dedupes_name() {
        let (mut shell, _) = shell_with_walk();
        shell.bus.emit(AddAnimationRequest("WALK".into()));
        shell.process_events();
        let second = shell.collection.get_animation(shell.active.unwrap()).unwrap();
        assert_eq!(second.name(), "WALK_1");
        assert_eq!(shell.collection.len(), 2);
    }

    #[test]
    fn test_frame_requests() {
        let (mut shell, id) = shell_with_walk();
        shell.bus.emit(AddFrameRequest { animation_id: id, ticks: Some(4) });
        shell.process_events();

        let walk = shell.collection.get_animation(id).unwrap();
        assert_eq!(walk.len(), 2);
        assert_eq!(walk.frames()[1].name(), "WALK_1");
        assert_eq!(walk.frames()[1].ticks(), 4);
        let first = walk.frames()[0].id();

        shell.bus.emit(SetFrameTicksRequest { animation_id: id, frame_id: first, ticks: 3 });
        shell.bus.emit(RemoveFrameRequest { animation_id: id, frame_id: first });
        shell.process_events();

        let walk = shell.collection.get_animation(id).unwrap();
        assert_eq!(walk.len(), 1);
        assert_eq!(walk.frames()[0].name(), "WALK_1");
    }

    #[test]
    fn test_sprite_requests() {
        let (mut shell, id) = shell_with_walk();
        let frame_id = {
            let walk = shell.collection.get_animation_mut(id).unwrap();
            let frame = walk.frame_at_mut(0).unwrap();
            for name in ["A", "B", "C"] {
                frame.create_sprite(name);
            }
            frame.commit();
            frame.id()
        };

        shell.bus.emit(MoveSpriteRequest { animation_id: id, frame_id, from: 0, to: 2 });
        shell.bus.emit(SetSpriteVisibilityRequest { animation_id: id, frame_id, index: 0, visible: false });
        shell.process_events();

        let frame = shell.collection.get_animation(id).unwrap().get_frame(frame_id).unwrap();
        let names: Vec<_> = frame.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["B", "C", "A"]);
        assert!(!frame.sprites()[0].visible());
        assert!(!frame.is_modified());
    }

    #[test]
    fn test_remove_active_animation_reselects() {
        let (mut shell, walk) = shell_with_walk();
        shell.bus.emit(AddAnimationRequest("JUMP".into()));
        shell.process_events();
        let jump = shell.active.unwrap();
        assert_ne!(jump, walk);

        shell.bus.emit(RemoveAnimationRequest(jump));
        shell.process_events();
        assert_eq!(shell.active, Some(walk));
        assert!(!shell.collection.contains(jump));
    }

    #[test]
    fn test_fps_requests_sync_settings() {
        let mut shell = Shell::new();
        shell.bus.emit(SetFpsRequest(500));
        shell.bus.emit(SetLoopRequest(false));
        shell.process_events();
        assert_eq!(shell.player.fps(), 60);
        assert_eq!(shell.settings.fps, 60);
        assert!(!shell.settings.loop_enabled);
    }

    #[test]
    fn test_undo_redo_requests() {
        let mut shell = Shell::new();
        let track = shell.timeline.add_track(Track::new("x"));
        shell.timeline.add_keyframe(track, 10, 1.0).unwrap();

        shell.bus.emit(UndoRequest);
        shell.process_events();
        assert!(shell.timeline.tracks()[track].is_empty());

        shell.bus.emit(RedoRequest);
        shell.process_events();
        assert_eq!(shell.timeline.tracks()[track].keyframes(), &[KeyFrame::new(10, 1.0)]);
    }

    #[test]
    fn test_filesystem_requests_are_deferred() {
        let mut shell = Shell::new();
        shell.bus.emit(SaveCollectionRequest(PathBuf::from("a.json")));
        shell.bus.emit(SaveCollectionRequest(PathBuf::from("b.json")));
        let merged = shell.process_events().unwrap();
        assert_eq!(merged.save_collection, Some(PathBuf::from("b.json")));
        assert!(merged.load_collection.is_none());
    }
}
