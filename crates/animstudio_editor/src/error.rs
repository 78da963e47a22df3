// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor error type.

use animstudio_sequencer::AnimationError;
use thiserror::Error;

/// Errors surfaced by editor operations
#[derive(Debug, Error)]
pub enum EditorError {
    /// Timeline, curve or codec failure
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or rig file could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be written
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// JSON export failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file is from a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedSettings {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// A frame sink rejected a frame
    #[error("Frame sink failed: {0}")]
    FrameSink(String),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
