// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo command log.
//!
//! Commands are stored in a flat arena with a cursor. Everything before the
//! cursor is undoable, everything from the cursor on is redoable. Committing
//! drops the redoable tail. The log never executes anything itself; the
//! caller has already applied a command when it commits it.

use crate::commands::EditorCommand;
use serde::{Deserialize, Serialize};

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Commands that can be undone
    pub undo_count: usize,
    /// Commands that can be redone
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history
#[derive(Debug, Clone)]
pub struct CommandLog {
    commands: Vec<EditorCommand>,
    cursor: usize,
    max_depth: usize,
}

impl CommandLog {
    /// Create a log with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record an applied command
    pub fn commit(&mut self, command: EditorCommand) {
        self.commands.truncate(self.cursor);
        self.commands.push(command);

        // Enforce history limit
        if self.commands.len() > self.max_depth {
            let excess = self.commands.len() - self.max_depth;
            self.commands.drain(..excess);
        }
        self.cursor = self.commands.len();
    }

    /// Step back; returns the command to revert, or `None` at the start
    pub fn undo(&mut self) -> Option<&EditorCommand> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.commands.get(self.cursor)
    }

    /// Step forward; returns the command to apply, or `None` at the end
    pub fn redo(&mut self) -> Option<&EditorCommand> {
        let command = self.commands.get(self.cursor)?;
        self.cursor += 1;
        Some(command)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(EditorCommand::description)
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<String> {
        self.commands.get(self.cursor).map(EditorCommand::description)
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.cursor,
            redo_count: self.commands.len() - self.cursor,
            max_depth: self.max_depth,
        }
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new()
    }
}
