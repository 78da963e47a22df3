// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor tools (transform gizmo mode, space and axes)

use animstudio_sequencer::PoseChannel;
use serde::{Deserialize, Serialize};

/// Transform gizmo mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformTool {
    /// Gizmo hidden
    #[default]
    None,
    /// Rotate mode - R key
    Rotate,
    /// Translate (move) mode - T key
    Translate,
}

impl TransformTool {
    /// Get the name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Rotate => "Rotate",
            Self::Translate => "Translate",
        }
    }

    /// Get the hotkey for this mode
    pub fn hotkey(&self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Rotate => Some('R'),
            Self::Translate => Some('T'),
        }
    }

    /// Pose channel the gizmo edits
    pub fn channel(&self) -> Option<PoseChannel> {
        match self {
            Self::None => None,
            Self::Rotate => Some(PoseChannel::Rotation),
            Self::Translate => Some(PoseChannel::Position),
        }
    }
}

/// Coordinate space the gizmo operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoSpace {
    /// Part-local axes
    #[default]
    Local,
    /// World axes
    World,
}

impl GizmoSpace {
    /// Get the name of this space
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::World => "World",
        }
    }

    /// The other space
    pub fn toggled(&self) -> Self {
        match self {
            Self::Local => Self::World,
            Self::World => Self::Local,
        }
    }
}

/// A single pose axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Index into a `[f64; 3]`
    pub fn index(&self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Parse an axis label (`x`, `y` or `z`, any case)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "x" | "X" => Some(Self::X),
            "y" | "Y" => Some(Self::Y),
            "z" | "Z" => Some(Self::Z),
            _ => None,
        }
    }
}
