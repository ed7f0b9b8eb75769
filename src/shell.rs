//! Application shell: owns the models and routes bus traffic.
//!
//! Views (or the CLI) talk to the shell only through the event bus; the
//! shell polls it once per loop iteration and applies the requests.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::core::event_bus::{EntityEmitter, EventBus};
use crate::core::player::Player;
use crate::entities::traits::Identified;
use crate::entities::{AnimationCollection, SpriteSheet, TimelineModel};
use crate::main_events::{EventResult, handle_app_event};

/// Shell state shared by the binary and tests
pub struct Shell {
    pub bus: EventBus,
    pub collection: AnimationCollection,
    pub timeline: TimelineModel,
    pub player: Player,
    pub settings: Settings,
    /// Animation shown in the player and frame list
    pub active: Option<Uuid>,
    pub error_msg: Option<String>,
    /// Where the collection was last saved or loaded from
    pub last_path: Option<PathBuf>,
}

impl Shell {
    /// Create a shell with an empty collection and default settings
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let bus = EventBus::new();
        let collection = AnimationCollection::with_bus(bus.clone());

        let mut timeline = TimelineModel::new();
        timeline.set_event_emitter(EntityEmitter::from_emitter(bus.emitter()));
        timeline.set_range(settings.timeline_start, settings.timeline_end);
        timeline.set_undo_limit(settings.undo_limit);

        let mut player = Player::new();
        player.set_fps(settings.fps);
        player.set_loop_enabled(settings.loop_enabled);

        // Setup notifications are not user actions
        let _ = bus.poll();

        Self {
            bus,
            collection,
            timeline,
            player,
            settings,
            active: None,
            error_msg: None,
            last_path: None,
        }
    }

    /// Make `id` the active animation and rewind the player.
    pub fn select_animation(&mut self, id: Uuid) -> bool {
        if !self.collection.contains(id) {
            warn!("Select: animation {} not found", id);
            return false;
        }
        if self.active != Some(id) {
            debug!("Active animation: {}", id);
            self.active = Some(id);
            self.player.stop();
            self.player.to_start();
        }
        true
    }

    /// Fill the collection with the WALK / SHOOT / JUMP demo set.
    pub fn load_demo(&mut self) {
        demo_data(&mut self.collection);
        if let Some(first) = self.collection.ids().first().copied() {
            self.select_animation(first);
        }
    }

    /// Slice a validated sheet into a new animation: one frame per cell,
    /// each holding one sprite that points at the cell by index.
    pub fn import_sheet(&mut self, sheet: &SpriteSheet) -> Result<Uuid> {
        sheet
            .validate()
            .with_context(|| format!("Invalid sprite sheet: {}", sheet.path.display()))?;

        let name = match self.collection.find_by_name(&sheet.base_name) {
            Some(_) => self.collection.gen_name(&sheet.base_name),
            None => sheet.base_name.clone(),
        };
        let ticks = self.settings.default_ticks;
        let cells = sheet.cells();

        let animation = self.collection.create_animation(name);
        for cell in &cells {
            let cell_name = sheet.cell_name(cell.index);
            let frame = animation.create_frame(cell_name.as_str(), ticks);
            let sprite = frame.create_sprite(cell_name);
            sprite.set_sprite_index(cell.index as u32);
            frame.commit();
        }
        let id = animation.id();
        info!(
            "Imported {} cell(s) from {} as '{}'",
            cells.len(),
            sheet.path.display(),
            animation.name()
        );
        self.select_animation(id);
        Ok(id)
    }

    /// Open an image from disk and import it.
    pub fn open_sheet(
        &mut self,
        path: &Path,
        cell: (u32, u32),
        offset: (u32, u32),
        base_name: &str,
    ) -> Result<Uuid> {
        let sheet = SpriteSheet::open(path, cell)
            .with_context(|| format!("Failed to read sprite sheet: {}", path.display()))?
            .with_offset(offset.0, offset.1)
            .with_base_name(base_name);
        self.import_sheet(&sheet)
    }

    pub fn save(&mut self, path: &Path) -> Result<PathBuf> {
        let written = self
            .collection
            .save_json(path)
            .with_context(|| format!("Failed to save collection: {}", path.display()))?;
        self.last_path = Some(written.clone());
        self.settings.last_collection = Some(written.to_string_lossy().into_owned());
        Ok(written)
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.collection
            .load_json(path)
            .with_context(|| format!("Failed to load collection: {}", path.display()))?;
        self.last_path = Some(path.to_path_buf());
        self.settings.last_collection = Some(path.to_string_lossy().into_owned());
        self.active = None;
        if let Some(first) = self.collection.ids().first().copied() {
            self.select_animation(first);
        }
        Ok(())
    }

    /// Process events from the event bus, returns merged deferred actions
    pub fn process_events(&mut self) -> Option<EventResult> {
        let mut merged = EventResult::default();
        let mut any_handled = false;

        for event in self.bus.poll() {
            if let Some(r) = handle_app_event(&event, self) {
                merged.merge(r);
                any_handled = true;
            }
        }

        if any_handled { Some(merged) } else { None }
    }

    /// Handle deferred actions from EventResult
    pub fn handle_deferred(&mut self, result: EventResult) {
        // Load before import/save so they act on the loaded collection
        if let Some(path) = result.load_collection
            && let Err(e) = self.load(&path)
        {
            warn!("{:#}", e);
            self.error_msg = Some(format!("Load failed: {:#}", e));
        }

        if let Some(req) = result.import_sheet
            && let Err(e) = self.open_sheet(&req.path, req.cell, req.offset, &req.base_name)
        {
            warn!("{:#}", e);
            self.error_msg = Some(format!("Import failed: {:#}", e));
        }

        if let Some(path) = result.save_collection {
            match self.save(&path) {
                Ok(written) => info!("Collection saved to {}", written.display()),
                Err(e) => {
                    warn!("{:#}", e);
                    self.error_msg = Some(format!("Save failed: {:#}", e));
                }
            }
        }
    }

    /// Poll the bus and run whatever it deferred. One app-loop iteration.
    pub fn pump(&mut self) {
        if let Some(result) = self.process_events() {
            self.handle_deferred(result);
        }
    }

    /// Indented animation / frame / sprite listing.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for animation in &self.collection {
            let marker = if self.active == Some(animation.id()) { "*" } else { " " };
            let _ = writeln!(
                out,
                "{}{} ({} frames, {} ticks)",
                marker,
                animation.name(),
                animation.len(),
                animation.total_ticks()
            );
            for frame in animation {
                let _ = writeln!(out, "    {} [{} ticks]", frame.name(), frame.ticks());
                for sprite in frame {
                    let (x, y) = sprite.position();
                    let _ = writeln!(
                        out,
                        "        {} #{} @ ({}, {}){}{}{}",
                        sprite.name(),
                        sprite.sprite_index(),
                        x,
                        y,
                        if sprite.h_flip() { " h-flip" } else { "" },
                        if sprite.v_flip() { " v-flip" } else { "" },
                        if sprite.visible() { "" } else { " hidden" },
                    );
                }
            }
        }
        out
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

/// Demo pieces: (name, x, y). All are vertically flipped.
const DEMO_PIECES: &[(&str, i32, i32)] = &[
    ("FRONT_LEG_2", 150, 10),
    ("HEAD_1", 150, 10),
    ("BACK_LEG_3", 160, 22),
    ("RIGHT_ARM_2", 150, 10),
    ("LEFT_ARM_0", 150, 10),
];

const DEMO_ANIMATIONS: &[&str] = &["WALK", "SHOOT", "JUMP"];
const DEMO_TICKS: u32 = 4;

/// Populate `collection` with three four-frame animations.
pub fn demo_data(collection: &mut AnimationCollection) {
    for name in DEMO_ANIMATIONS {
        let animation = collection.create_animation(*name);
        for i in 1..=4 {
            let frame = animation.create_frame(format!("{}_{}", name, i), DEMO_TICKS);
            for (piece, x, y) in DEMO_PIECES {
                let sprite = frame.create_sprite(*piece);
                sprite.set_position(*x, *y);
                sprite.set_v_flip(true);
            }
            frame.commit();
        }
    }
}

/// Initialize logging.
///
/// Verbosity maps 0 -> warn, 1 -> info, 2 -> debug, 3+ -> trace; `RUST_LOG`
/// still overrides it. With a log file everything goes there instead of stderr.
pub fn init_logger(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_millis();

    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .context("Logger already initialized")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::edit_events::{ImportSheetRequest, LoadCollectionRequest, SaveCollectionRequest};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("musa_shell_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_new_shell_is_quiet() {
        let mut shell = Shell::new();
        assert_eq!(shell.bus.queue_len(), 0);
        assert!(shell.process_events().is_none());
    }

    #[test]
    fn test_settings_flow_into_models() {
        let settings = Settings {
            fps: 24,
            loop_enabled: false,
            timeline_start: 10,
            timeline_end: 50,
            ..Default::default()
        };
        let shell = Shell::with_settings(settings);
        assert_eq!(shell.player.fps(), 24);
        assert!(!shell.player.loop_enabled());
        assert_eq!((shell.timeline.start_frame(), shell.timeline.end_frame()), (10, 50));
    }

    #[test]
    fn test_demo_data() {
        let mut shell = Shell::new();
        shell.load_demo();

        let names: Vec<_> = shell.collection.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["WALK", "SHOOT", "JUMP"]);
        let walk = shell.collection.find_by_name("WALK").unwrap();
        assert_eq!(shell.active, Some(walk.id()));
        assert_eq!(walk.len(), 4);
        assert_eq!(walk.frames()[3].name(), "WALK_4");
        assert_eq!(walk.total_ticks(), 16);

        let back_leg = &walk.frames()[0].sprites()[2];
        assert_eq!(back_leg.name(), "BACK_LEG_3");
        assert_eq!(back_leg.position(), (160, 22));
        assert!(back_leg.v_flip());
        assert!(!walk.has_modified_frames());
    }

    #[test]
    fn test_import_sheet() {
        let mut shell = Shell::new();
        let sheet = SpriteSheet::new("hero.png", 64, 32, (32, 32)).with_base_name("hero");
        let id = shell.import_sheet(&sheet).unwrap();

        let hero = shell.collection.get_animation(id).unwrap();
        assert_eq!(hero.name(), "hero");
        assert_eq!(hero.len(), 2);
        assert_eq!(hero.frames()[1].name(), "hero_1");
        assert_eq!(hero.frames()[1].sprites()[0].sprite_index(), 1);
        assert_eq!(shell.active, Some(id));

        // Same base name again gets a fresh animation name
        let again = shell.import_sheet(&sheet).unwrap();
        assert_eq!(shell.collection.get_animation(again).unwrap().name(), "hero_1");
    }

    #[test]
    fn test_import_invalid_sheet() {
        let mut shell = Shell::new();
        let sheet = SpriteSheet::new("bad.png", 50, 32, (32, 32));
        assert!(shell.import_sheet(&sheet).is_err());
        assert!(shell.collection.is_empty());
    }

    #[test]
    fn test_deferred_save_and_load() {
        let dir = temp_dir();
        let path = dir.join("walk.json");

        let mut shell = Shell::new();
        shell.load_demo();
        shell.bus.emit(SaveCollectionRequest(path.clone()));
        shell.pump();
        assert!(shell.error_msg.is_none());
        assert!(path.exists());

        let mut other = Shell::new();
        other.bus.emit(LoadCollectionRequest(path.clone()));
        other.pump();
        assert_eq!(other.collection, shell.collection);
        assert_eq!(other.last_path, Some(path));
        assert!(other.active.is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_deferred_failures_set_error() {
        let mut shell = Shell::new();
        shell.bus.emit(LoadCollectionRequest(PathBuf::from("/nonexistent/musa/x.json")));
        shell.pump();
        assert!(shell.error_msg.as_deref().unwrap().starts_with("Load failed"));

        shell.error_msg = None;
        shell.bus.emit(ImportSheetRequest {
            path: PathBuf::from("/nonexistent/musa/sheet.png"),
            cell: (32, 32),
            offset: (0, 0),
            base_name: "sprite".into(),
        });
        shell.pump();
        assert!(shell.error_msg.as_deref().unwrap().starts_with("Import failed"));
    }

    #[test]
    fn test_summary_marks_active() {
        let mut shell = Shell::new();
        shell.load_demo();
        let summary = shell.summary();
        assert!(summary.starts_with("*WALK (4 frames, 16 ticks)"));
        assert!(summary.contains("        BACK_LEG_3 #0 @ (160, 22) v-flip"));
        assert!(summary.contains(" SHOOT (4 frames"));
    }
}
