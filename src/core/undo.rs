//! Linear undo/redo history over a target of type `T`.
//!
//! `index` splits the history: commands left of it are applied, commands
//! right of it were undone and can be redone. Pushing applies the command
//! first; only if that succeeds is the redo tail dropped and the command
//! appended, so a failing command never disturbs the history.
//!
//! [`MacroCommand`] groups children under one title. Its revert walks the
//! children in the same order they were applied (see the pinned test below);
//! a child failing during apply rolls back the already applied children in
//! reverse before the error is reported.

use log::{debug, trace, warn};

use crate::error::CommandError;

/// A reversible unit of mutation.
pub trait Command<T> {
    /// Display text ("Add keyframe", "Move multiple keyframes", ...)
    fn title(&self) -> &str;
    fn apply(&mut self, target: &mut T) -> Result<(), CommandError>;
    fn revert(&mut self, target: &mut T) -> Result<(), CommandError>;
}

pub type BoxedCommand<T> = Box<dyn Command<T>>;

/// Unlimited history
pub const NO_LIMIT: usize = 0;

pub struct UndoStack<T> {
    commands: Vec<BoxedCommand<T>>,
    index: usize,
    /// Max commands kept (0 = unlimited); oldest dropped first
    limit: usize,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            index: 0,
            limit: NO_LIMIT,
        }
    }
}

impl<T> std::fmt::Debug for UndoStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let titles: Vec<&str> = self.commands.iter().map(|c| c.title()).collect();
        f.debug_struct("UndoStack")
            .field("commands", &titles)
            .field("index", &self.index)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<T> UndoStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Apply `command` to `target` and record it.
    pub fn push(&mut self, target: &mut T, mut command: BoxedCommand<T>) -> Result<(), CommandError> {
        if let Err(e) = command.apply(target) {
            warn!("Undo: '{}' failed: {}", command.title(), e);
            return Err(e);
        }
        if self.index < self.commands.len() {
            trace!("Undo: dropping {} redo command(s)", self.commands.len() - self.index);
            self.commands.truncate(self.index);
        }
        debug!("Undo: push '{}'", command.title());
        self.commands.push(command);
        self.index += 1;
        self.enforce_limit();
        Ok(())
    }

    /// Revert the last applied command. `Ok(false)` when nothing to undo.
    /// A command that fails to revert stays on the applied side.
    pub fn undo(&mut self, target: &mut T) -> Result<bool, CommandError> {
        if self.index == 0 {
            return Ok(false);
        }
        let command = &mut self.commands[self.index - 1];
        command.revert(target)?;
        debug!("Undo: '{}'", command.title());
        self.index -= 1;
        Ok(true)
    }

    /// Re-apply the next undone command. `Ok(false)` when nothing to redo.
    pub fn redo(&mut self, target: &mut T) -> Result<bool, CommandError> {
        if self.index >= self.commands.len() {
            return Ok(false);
        }
        let command = &mut self.commands[self.index];
        command.apply(target)?;
        debug!("Redo: '{}'", command.title());
        self.index += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    /// Number of applied commands.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Title of the command `undo` would revert.
    pub fn undo_text(&self) -> Option<&str> {
        self.index.checked_sub(1).map(|i| self.commands[i].title())
    }

    /// Title of the command `redo` would apply.
    pub fn redo_text(&self) -> Option<&str> {
        self.commands.get(self.index).map(|c| c.title())
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.index = 0;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        if self.limit == NO_LIMIT || self.commands.len() <= self.limit {
            return;
        }
        // Only applied commands are dropped; the redo tail survives
        let excess = (self.commands.len() - self.limit).min(self.index);
        if excess > 0 {
            self.commands.drain(..excess);
            self.index -= excess;
            trace!("Undo: dropped {} oldest command(s)", excess);
        }
    }
}

/// Composite command applied as one history entry.
pub struct MacroCommand<T> {
    title: String,
    children: Vec<BoxedCommand<T>>,
}

impl<T> MacroCommand<T> {
    pub fn new(title: impl Into<String>, children: Vec<BoxedCommand<T>>) -> Self {
        Self {
            title: title.into(),
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn wrap(&self, source: CommandError) -> CommandError {
        CommandError::Macro {
            title: self.title.clone(),
            source: Box::new(source),
        }
    }
}

impl<T> Command<T> for MacroCommand<T> {
    fn title(&self) -> &str {
        &self.title
    }

    fn apply(&mut self, target: &mut T) -> Result<(), CommandError> {
        for i in 0..self.children.len() {
            if let Err(e) = self.children[i].apply(target) {
                for done in self.children[..i].iter_mut().rev() {
                    if let Err(rollback) = done.revert(target) {
                        warn!("Macro '{}': rollback of '{}' failed: {}", self.title, done.title(), rollback);
                    }
                }
                return Err(self.wrap(e));
            }
        }
        Ok(())
    }

    fn revert(&mut self, target: &mut T) -> Result<(), CommandError> {
        // Same order as apply
        for i in 0..self.children.len() {
            if let Err(e) = self.children[i].revert(target) {
                return Err(self.wrap(e));
            }
        }
        Ok(())
    }
}
