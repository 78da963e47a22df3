// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands for undo/redo support.
//!
//! Each command carries enough data to both apply and revert itself
//! against an [`EditorState`]. Commands are recorded after the caller has
//! applied them, so `apply` is only ever run again by redo.

use crate::state::EditorState;
use crate::tools::{GizmoSpace, TransformTool};
use animstudio_sequencer::{
    AnimationError, Keyframe, KeyframeId, PartName, PointId, PoseChannel, PoseProvider, ProgressionCurve,
    ProgressionPoint, Vec3,
};
use serde::{Deserialize, Serialize};

/// Result type for applying commands
pub type Result<T> = std::result::Result<T, AnimationError>;

/// A reversible editor mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorCommand {
    /// Insert a keyframe and select it
    AddKeyframe {
        /// Keyframe as created
        keyframe: Keyframe,
        /// Insertion index
        index: usize,
        /// Keyframe selected before
        previous_selection: Option<KeyframeId>,
    },
    /// Remove a keyframe
    DeleteKeyframe {
        /// Keyframe as it was when removed
        keyframe: Keyframe,
        /// Insertion index it was removed from
        index: usize,
        /// Whether it was the selected keyframe
        was_selected: bool,
        /// Whether it was the loop keyframe
        was_loop: bool,
    },
    /// Change a keyframe's start and duration
    Retime {
        /// Keyframe
        id: KeyframeId,
        /// (start, duration) before
        from: (f64, f64),
        /// (start, duration) after
        to: (f64, f64),
    },
    /// Set a part's rotation or position, recording it into a keyframe if one was selected
    SetPose {
        /// Part
        part: PartName,
        /// Rotation or position
        channel: PoseChannel,
        /// Keyframe the value was recorded into
        keyframe: Option<KeyframeId>,
        /// Live value before
        from: Vec3,
        /// Value after
        to: Vec3,
        /// Keyframe target before, if there was one
        previous_target: Option<Vec3>,
    },
    /// Add a progression point
    AddPoint {
        /// Keyframe owning the curve
        keyframe: KeyframeId,
        /// Index the point was pushed at
        index: usize,
        /// The new point
        point: ProgressionPoint,
    },
    /// Move a progression point
    MovePoint {
        /// Keyframe owning the curve
        keyframe: KeyframeId,
        /// Point
        id: PointId,
        /// (x, y) before
        from: (f64, f64),
        /// (x, y) after
        to: (f64, f64),
    },
    /// Remove a progression point
    RemovePoint {
        /// Keyframe owning the curve
        keyframe: KeyframeId,
        /// Index the point was removed from
        index: usize,
        /// The removed point
        point: ProgressionPoint,
    },
    /// Change the selected part
    SelectPart {
        /// Part selected before
        from: Option<PartName>,
        /// Part selected after
        to: Option<PartName>,
    },
    /// Change the selected keyframe
    SelectKeyframe {
        /// Keyframe selected before
        from: Option<KeyframeId>,
        /// Keyframe selected after
        to: Option<KeyframeId>,
    },
    /// Change the gizmo mode
    SetTool {
        /// Mode before
        from: TransformTool,
        /// Mode after
        to: TransformTool,
    },
    /// Change the gizmo space
    SetSpace {
        /// Space before
        from: GizmoSpace,
        /// Space after
        to: GizmoSpace,
    },
    /// Toggle looping
    SetLooping {
        /// Flag before
        from: bool,
        /// Flag after
        to: bool,
    },
    /// Toggle inertia
    SetInertia {
        /// Flag before
        from: bool,
        /// Flag after
        to: bool,
    },
    /// Change the loop keyframe
    LoopKeyframe {
        /// Loop keyframe before
        from: Option<KeyframeId>,
        /// Loop keyframe after
        to: Option<KeyframeId>,
    },
}

impl EditorCommand {
    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::AddKeyframe { .. } => "Add Keyframe".to_string(),
            Self::DeleteKeyframe { .. } => "Delete Keyframe".to_string(),
            Self::Retime { .. } => "Retime Keyframe".to_string(),
            Self::SetPose { part, channel, .. } => format!("Set {} of {part}", channel.name()),
            Self::AddPoint { .. } => "Add Progression Point".to_string(),
            Self::MovePoint { .. } => "Move Progression Point".to_string(),
            Self::RemovePoint { .. } => "Remove Progression Point".to_string(),
            Self::SelectPart { .. } => "Select Part".to_string(),
            Self::SelectKeyframe { .. } => "Select Keyframe".to_string(),
            Self::SetTool { to, .. } => format!("Set Tool: {}", to.name()),
            Self::SetSpace { to, .. } => format!("Set Space: {}", to.name()),
            Self::SetLooping { to, .. } => toggle_description("Looping", *to),
            Self::SetInertia { to, .. } => toggle_description("Inertia", *to),
            Self::LoopKeyframe { .. } => "Set Loop Keyframe".to_string(),
        }
    }

    /// Apply the command (redo)
    pub fn apply(&self, state: &mut EditorState) -> Result<()> {
        match self {
            Self::AddKeyframe { keyframe, index, .. } => {
                state.timeline.insert_keyframe_at(*index, keyframe.clone());
                state.selection.keyframe = Some(keyframe.id);
            }
            Self::DeleteKeyframe { keyframe, .. } => {
                state.timeline.remove_keyframe(keyframe.id);
                if state.selection.keyframe == Some(keyframe.id) {
                    state.selection.keyframe = None;
                }
                if state.timeline.loop_keyframe() == Some(keyframe.id) {
                    state.timeline.set_loop_keyframe(None);
                }
            }
            Self::Retime { id, to, .. } => state.timeline.retime_keyframe(*id, to.0, to.1)?,
            Self::SetPose { part, channel, keyframe, to, .. } => {
                state.rig.set_channel(part, *channel, *to);
                if let Some(kf) = keyframe.and_then(|id| state.timeline.keyframe_mut(id)) {
                    kf.set_target(*channel, part.clone(), *to);
                }
            }
            Self::AddPoint { keyframe, index, point } => edit_curve(state, *keyframe, |curve| {
                curve.restore_point(*index, *point);
                Ok(())
            })?,
            Self::MovePoint { keyframe, id, to, .. } => {
                edit_curve(state, *keyframe, |curve| curve.move_point(*id, to.0, to.1))?
            }
            Self::RemovePoint { keyframe, point, .. } => {
                edit_curve(state, *keyframe, |curve| curve.remove_point(point.id).map(drop))?
            }
            Self::SelectPart { to, .. } => state.selection.part = to.clone(),
            Self::SelectKeyframe { to, .. } => state.selection.keyframe = *to,
            Self::SetTool { to, .. } => state.tool = *to,
            Self::SetSpace { to, .. } => state.space = *to,
            Self::SetLooping { to, .. } => state.timeline.looping = *to,
            Self::SetInertia { to, .. } => state.timeline.inertia = *to,
            Self::LoopKeyframe { to, .. } => state.timeline.set_loop_keyframe(*to),
        }
        Ok(())
    }

    /// Revert the command (undo)
    pub fn revert(&self, state: &mut EditorState) -> Result<()> {
        match self {
            Self::AddKeyframe { keyframe, previous_selection, .. } => {
                state.timeline.remove_keyframe(keyframe.id);
                state.selection.keyframe = *previous_selection;
            }
            Self::DeleteKeyframe { keyframe, index, was_selected, was_loop } => {
                state.timeline.insert_keyframe_at(*index, keyframe.clone());
                if *was_selected {
                    state.selection.keyframe = Some(keyframe.id);
                }
                if *was_loop {
                    state.timeline.set_loop_keyframe(Some(keyframe.id));
                }
            }
            Self::Retime { id, from, .. } => state.timeline.retime_keyframe(*id, from.0, from.1)?,
            Self::SetPose { part, channel, keyframe, from, previous_target, .. } => {
                state.rig.set_channel(part, *channel, *from);
                if let Some(kf) = keyframe.and_then(|id| state.timeline.keyframe_mut(id)) {
                    match previous_target {
                        Some(value) => {
                            kf.set_target(*channel, part.clone(), *value);
                        }
                        None => {
                            kf.clear_target(*channel, part);
                        }
                    }
                }
            }
            Self::AddPoint { keyframe, point, .. } => {
                edit_curve(state, *keyframe, |curve| curve.remove_point(point.id).map(drop))?
            }
            Self::MovePoint { keyframe, id, from, .. } => {
                edit_curve(state, *keyframe, |curve| curve.move_point(*id, from.0, from.1))?
            }
            Self::RemovePoint { keyframe, index, point } => edit_curve(state, *keyframe, |curve| {
                curve.restore_point(*index, *point);
                Ok(())
            })?,
            Self::SelectPart { from, .. } => state.selection.part = from.clone(),
            Self::SelectKeyframe { from, .. } => state.selection.keyframe = *from,
            Self::SetTool { from, .. } => state.tool = *from,
            Self::SetSpace { from, .. } => state.space = *from,
            Self::SetLooping { from, .. } => state.timeline.looping = *from,
            Self::SetInertia { from, .. } => state.timeline.inertia = *from,
            Self::LoopKeyframe { from, .. } => state.timeline.set_loop_keyframe(*from),
        }
        Ok(())
    }
}

fn toggle_description(what: &str, enabled: bool) -> String {
    if enabled {
        format!("Enable {what}")
    } else {
        format!("Disable {what}")
    }
}

/// Edit a keyframe's curve, leaving it x-sorted afterwards
fn edit_curve(
    state: &mut EditorState,
    id: KeyframeId,
    edit: impl FnOnce(&mut ProgressionCurve) -> Result<()>,
) -> Result<()> {
    let curve = state
        .timeline
        .keyframe_mut(id)
        .map(|kf| &mut kf.progression)
        .ok_or_else(|| AnimationError::InvalidMutation(format!("no keyframe {:?}", id.0)))?;
    edit(curve)?;
    curve.ensure_sorted();
    Ok(())
}
