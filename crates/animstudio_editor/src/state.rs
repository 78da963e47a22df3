// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state.
//!
//! This module contains the document the commands act on: the timeline,
//! the rig it poses, the selection and the active tools.

use crate::tools::{GizmoSpace, TransformTool};
use animstudio_sequencer::{Keyframe, KeyframeId, PartName, PoseChannel, PoseProvider, Rig, Timeline, Vec3};
use serde::{Deserialize, Serialize};

/// Part and keyframe selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected part
    pub part: Option<PartName>,
    /// Selected keyframe; pose edits are recorded into it
    pub keyframe: Option<KeyframeId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.part = None;
        self.keyframe = None;
    }

    /// Check if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.part.is_none() && self.keyframe.is_none()
    }
}

/// Everything undo/redo restores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    /// Animation being edited
    pub timeline: Timeline,
    /// Model the animation poses
    pub rig: Rig,
    /// Current selection
    pub selection: Selection,
    /// Active gizmo mode
    pub tool: TransformTool,
    /// Gizmo coordinate space
    pub space: GizmoSpace,
}

impl EditorState {
    /// Create a state for a rig with an empty timeline
    pub fn new(rig: Rig) -> Self {
        Self {
            timeline: Timeline::new(),
            rig,
            selection: Selection::new(),
            tool: TransformTool::None,
            space: GizmoSpace::Local,
        }
    }

    /// The selected keyframe, if it still exists
    pub fn selected_keyframe(&self) -> Option<&Keyframe> {
        self.selection.keyframe.and_then(|id| self.timeline.keyframe(id))
    }

    /// Value shown for the selected part: the selected keyframe's value, else the live pose
    pub fn selected_value(&self, channel: PoseChannel) -> Option<Vec3> {
        let part = self.selection.part.as_ref()?;
        if let Some(value) = self.selected_keyframe().and_then(|kf| kf.value(channel, part)) {
            return Some(value);
        }
        self.rig.current(part).map(|t| channel.read(&t))
    }
}
