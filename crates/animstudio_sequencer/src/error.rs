// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the keyframe engine.

use thiserror::Error;

/// Errors raised by timeline, curve and codec operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimationError {
    /// The animation buffer could not be decoded
    #[error("Malformed animation file: {0}")]
    MalformedFile(String),

    /// An operation needed at least one keyframe
    #[error("No animation loaded")]
    NoAnimationLoaded,

    /// A mutation would break a timeline or curve invariant
    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),

    /// A part name is not part of the loaded model
    #[error("Unknown part: {0}")]
    UnknownPart(String),

    /// Generated output could not be written
    #[error("Failed to write output: {0}")]
    Format(#[from] std::fmt::Error),
}

impl AnimationError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFile(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidMutation(message.into())
    }
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, AnimationError>;
