// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor context: the operations the UI layer invokes.
//!
//! Every document mutation is applied to [`EditorState`] and then recorded
//! in the [`CommandLog`]. Operations that need a selection do nothing when
//! there is none. Playback is driven by [`EditorContext::tick`] and is
//! frozen while a batch export holds the context busy.

use crate::commands::EditorCommand;
use crate::error::{EditorError, Result};
use crate::history::{CommandLog, HistoryStats};
use crate::settings::EditorSettings;
use crate::state::EditorState;
use crate::tools::{Axis, GizmoSpace, TransformTool};
use animstudio_sequencer::{
    codec, export, BakedAnimation, KeyframeId, PointId, PoseChannel, PoseProvider, PoseSnapshot,
    ProcedureExporter, Rig, Vec3,
};
use std::path::Path;

/// Parse numeric text input. Returns `None` for anything that is not a finite number.
pub fn parse_axis_value(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn reject_non_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    tracing::warn!("Rejected non-finite {what}");
    Err(EditorError::InvalidInput(format!("non-finite {what}")))
}

/// Editor state plus history and settings
#[derive(Debug)]
pub struct EditorContext {
    /// Document state restored by undo/redo
    pub state: EditorState,
    /// Undo/redo history
    pub history: CommandLog,
    /// Editor settings
    pub settings: EditorSettings,
    pub(crate) busy: bool,
    dirty: bool,
}

impl EditorContext {
    /// Create a context editing a new animation for `rig`
    pub fn new(rig: Rig, settings: EditorSettings) -> Self {
        let mut state = EditorState::new(rig);
        state.timeline.default_duration = settings.default_keyframe_duration;
        state.timeline.clock.set_speed(settings.playback_speed);

        Self {
            state,
            history: CommandLog::with_max_depth(settings.history_depth),
            settings,
            busy: false,
            dirty: false,
        }
    }

    /// Whether a batch export is running
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Check if there are unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn commit(&mut self, command: EditorCommand) {
        tracing::debug!("Committed: {}", command.description());
        self.history.commit(command);
        self.dirty = true;
    }

    /// Apply a command to the state, then record it
    fn execute(&mut self, command: EditorCommand) -> Result<()> {
        command.apply(&mut self.state)?;
        self.commit(command);
        Ok(())
    }

    // ---- Keyframes ----

    /// Capture a keyframe at the playhead from the current pose and select it
    pub fn add_keyframe(&mut self) -> Result<KeyframeId> {
        let keyframe = self.state.timeline.create_keyframe(&self.state.rig)?;
        let id = keyframe.id;
        self.execute(EditorCommand::AddKeyframe {
            index: self.state.timeline.len(),
            previous_selection: self.state.selection.keyframe,
            keyframe,
        })?;
        Ok(id)
    }

    /// Delete the selected keyframe
    pub fn delete_selected_keyframe(&mut self) {
        let Some(id) = self.state.selection.keyframe else {
            return;
        };
        let Some(index) = self.state.timeline.position_of(id) else {
            return;
        };
        let Some(keyframe) = self.state.timeline.keyframe(id).cloned() else {
            return;
        };
        let was_loop = self.state.timeline.loop_keyframe() == Some(id);

        let command = EditorCommand::DeleteKeyframe {
            keyframe,
            index,
            was_selected: true,
            was_loop,
        };
        if let Err(err) = self.execute(command) {
            tracing::warn!("Delete keyframe failed: {err}");
        }
    }

    /// Move the selected keyframe's start
    pub fn set_start_time(&mut self, start_time: f64) -> Result<()> {
        let Some((id, start, duration)) = self.selected_timing() else {
            return Ok(());
        };
        self.retime(id, (start, duration), (start_time, duration))
    }

    /// Change the selected keyframe's duration, keeping its end where it is
    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        let Some((id, start, old_duration)) = self.selected_timing() else {
            return Ok(());
        };
        let new_start = start - (duration - old_duration);
        self.retime(id, (start, old_duration), (new_start, duration))
    }

    fn selected_timing(&self) -> Option<(KeyframeId, f64, f64)> {
        self.state
            .selected_keyframe()
            .map(|kf| (kf.id, kf.start_time(), kf.duration()))
    }

    fn retime(&mut self, id: KeyframeId, from: (f64, f64), to: (f64, f64)) -> Result<()> {
        if let Err(err) = self.execute(EditorCommand::Retime { id, from, to }) {
            tracing::warn!("Rejected retime of keyframe: {err}");
            return Err(err);
        }
        Ok(())
    }

    /// Designate a keyframe whose end is where looped playback re-enters
    pub fn set_loop_keyframe(&mut self, id: Option<KeyframeId>) -> Result<()> {
        if let Some(id) = id {
            if self.state.timeline.keyframe(id).is_none() {
                return Err(EditorError::InvalidInput(format!("no keyframe {}", id.0)));
            }
        }
        let from = self.state.timeline.loop_keyframe();
        if from != id {
            self.execute(EditorCommand::LoopKeyframe { from, to: id })?;
        }
        Ok(())
    }

    // ---- Pose ----

    /// Set a channel of the selected part. When a keyframe is selected the
    /// value is recorded as its target.
    pub fn set_pose(&mut self, channel: PoseChannel, value: Vec3) -> Result<()> {
        let Some(part) = self.state.selection.part.clone() else {
            return Ok(());
        };
        if value.iter().any(|v| !v.is_finite()) {
            tracing::warn!("Rejected non-finite {} for {part}", channel.name());
            return Err(EditorError::InvalidInput(format!("non-finite {}", channel.name())));
        }
        let Some(current) = self.state.rig.current(&part) else {
            return Ok(());
        };

        let keyframe = self.state.selection.keyframe.filter(|id| self.state.timeline.keyframe(*id).is_some());
        let previous_target = keyframe
            .and_then(|id| self.state.timeline.keyframe(id))
            .and_then(|kf| kf.targets(channel).get(&part).copied());

        self.execute(EditorCommand::SetPose {
            part,
            channel,
            keyframe,
            from: channel.read(&current),
            to: value,
            previous_target,
        })
    }

    /// Set one axis of the selected part
    pub fn set_axis(&mut self, channel: PoseChannel, axis: Axis, value: f64) -> Result<()> {
        let Some(mut current) = self.state.selected_value(channel) else {
            return Ok(());
        };
        current[axis.index()] = value;
        self.set_pose(channel, current)
    }

    /// Set one axis from raw text input
    pub fn set_axis_text(&mut self, channel: PoseChannel, axis: Axis, text: &str) -> Result<()> {
        match parse_axis_value(text) {
            Some(value) => self.set_axis(channel, axis, value),
            None => {
                tracing::warn!("Rejected {} input {text:?}", channel.name());
                Err(EditorError::InvalidInput(format!("not a number: {text:?}")))
            }
        }
    }

    /// Move one axis of the selected part by `steps` nudge steps
    pub fn nudge(&mut self, channel: PoseChannel, axis: Axis, steps: f64) -> Result<()> {
        let Some(current) = self.state.selected_value(channel) else {
            return Ok(());
        };
        let value = current[axis.index()] + steps * self.settings.nudge_step;
        self.set_axis(channel, axis, value)
    }

    /// Current pose of every part, for the renderer
    pub fn pose_snapshot(&self) -> PoseSnapshot {
        self.state.rig.snapshot()
    }

    // ---- Progression curve of the selected keyframe ----

    /// Add a point to the selected keyframe's curve
    pub fn add_progression_point(&mut self, x: f64, y: f64) -> Result<Option<PointId>> {
        let Some(id) = self.state.selection.keyframe else {
            return Ok(None);
        };
        reject_non_finite("progression point", &[x, y])?;
        let Some(kf) = self.state.timeline.keyframe_mut(id) else {
            return Ok(None);
        };

        let curve = &mut kf.progression;
        let point_id = curve.add_point(x, y)?;
        let index = curve.points().len() - 1;
        let point = curve.points()[index];
        curve.ensure_sorted();
        self.commit(EditorCommand::AddPoint {
            keyframe: id,
            index,
            point,
        });
        Ok(Some(point_id))
    }

    /// Move a point of the selected keyframe's curve
    pub fn move_progression_point(&mut self, point: PointId, x: f64, y: f64) -> Result<()> {
        let Some(kf) = self.state.selected_keyframe() else {
            return Ok(());
        };
        reject_non_finite("progression point", &[x, y])?;
        let keyframe = kf.id;
        let Some(current) = kf.progression.point(point).copied() else {
            return Err(EditorError::InvalidInput(format!("no progression point {}", point.0)));
        };

        self.execute(EditorCommand::MovePoint {
            keyframe,
            id: point,
            from: (current.x, current.y),
            to: (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)),
        })
    }

    /// Remove a point from the selected keyframe's curve
    pub fn remove_progression_point(&mut self, point: PointId) -> Result<()> {
        let Some(id) = self.state.selection.keyframe else {
            return Ok(());
        };
        let Some(kf) = self.state.timeline.keyframe_mut(id) else {
            return Ok(());
        };

        let (index, point) = kf.progression.remove_point(point)?;
        kf.progression.ensure_sorted();
        self.commit(EditorCommand::RemovePoint {
            keyframe: id,
            index,
            point,
        });
        Ok(())
    }

    // ---- Selection and tools ----

    /// Select a part by name, or clear the part selection
    pub fn select_part(&mut self, name: Option<&str>) -> Result<()> {
        let to = name.map(|n| self.state.rig.resolve_part(n)).transpose()?;
        let from = self.state.selection.part.clone();
        if from != to {
            self.execute(EditorCommand::SelectPart { from, to })?;
        }
        Ok(())
    }

    /// Select a keyframe, or clear the keyframe selection
    pub fn select_keyframe(&mut self, id: Option<KeyframeId>) -> Result<()> {
        if let Some(id) = id {
            if self.state.timeline.keyframe(id).is_none() {
                return Err(EditorError::InvalidInput(format!("no keyframe {}", id.0)));
            }
        }
        let from = self.state.selection.keyframe;
        if from != id {
            self.execute(EditorCommand::SelectKeyframe { from, to: id })?;
        }
        Ok(())
    }

    /// Change the gizmo mode
    pub fn set_tool(&mut self, tool: TransformTool) -> Result<()> {
        let from = self.state.tool;
        if from != tool {
            self.execute(EditorCommand::SetTool { from, to: tool })?;
        }
        Ok(())
    }

    /// Change the gizmo space
    pub fn set_space(&mut self, space: GizmoSpace) -> Result<()> {
        let from = self.state.space;
        if from != space {
            self.execute(EditorCommand::SetSpace { from, to: space })?;
        }
        Ok(())
    }

    /// Toggle looping
    pub fn set_looping(&mut self, looping: bool) -> Result<()> {
        let from = self.state.timeline.looping;
        if from != looping {
            self.execute(EditorCommand::SetLooping { from, to: looping })?;
        }
        Ok(())
    }

    /// Toggle inertia
    pub fn set_inertia(&mut self, inertia: bool) -> Result<()> {
        let from = self.state.timeline.inertia;
        if from != inertia {
            self.execute(EditorCommand::SetInertia { from, to: inertia })?;
        }
        Ok(())
    }

    // ---- Undo / redo ----

    /// Undo the last command. Returns whether anything was undone.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(command) = self.history.undo() else {
            return Ok(false);
        };
        tracing::debug!("Undo: {}", command.description());
        command.revert(&mut self.state)?;
        self.dirty = true;
        Ok(true)
    }

    /// Redo the last undone command. Returns whether anything was redone.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(command) = self.history.redo() else {
            return Ok(false);
        };
        tracing::debug!("Redo: {}", command.description());
        command.apply(&mut self.state)?;
        self.dirty = true;
        Ok(true)
    }

    /// History statistics
    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    // ---- Playback ----

    /// Render step: advance playback by `delta_ticks` while playing, then
    /// pose the rig from rest at the playhead. The pose is resolved while
    /// paused too, so edits to the timeline show on the next frame.
    pub fn tick(&mut self, delta_ticks: f64) {
        if self.busy {
            return;
        }
        let state = &mut self.state;
        if state.timeline.clock.playing {
            state.timeline.animate(delta_ticks);
            state.rig.reset_to_rest();
            state.timeline.resolve_pose(&mut state.rig);
        } else {
            let ticks = state.timeline.clock.ticks;
            state.timeline.scrub(ticks, &mut state.rig);
        }
    }

    /// Start playback
    pub fn play(&mut self) {
        if !self.busy {
            self.state.timeline.clock.play();
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.busy {
            self.state.timeline.clock.pause();
        }
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        if !self.busy {
            self.state.timeline.clock.toggle_playback();
        }
    }

    /// Set the playback speed multiplier
    pub fn set_speed(&mut self, speed: f64) {
        if !self.busy {
            self.state.timeline.clock.set_speed(speed);
        }
    }

    /// Move the playhead and show the pose at that time
    pub fn seek(&mut self, ticks: f64) {
        if self.busy {
            return;
        }
        let state = &mut self.state;
        state.timeline.clock.seek(ticks);
        let ticks = state.timeline.clock.ticks;
        state.timeline.scrub(ticks, &mut state.rig);
    }

    /// Rewind and put every part at rest
    pub fn reset_keyframes(&mut self) {
        if self.busy {
            return;
        }
        let state = &mut self.state;
        state.timeline.reset_animations(&mut state.rig);
    }

    // ---- Files ----

    /// Encode the animation
    pub fn save_animation(&mut self) -> Result<Vec<u8>> {
        let state = &mut self.state;
        Ok(codec::encode(&mut state.timeline, &state.rig)?)
    }

    /// Replace the animation with a decoded one. On error nothing changes.
    pub fn load_animation(&mut self, bytes: &[u8]) -> Result<()> {
        let mut timeline = codec::decode(bytes, &self.state.rig)?;
        timeline.default_duration = self.settings.default_keyframe_duration;
        timeline.clock.set_speed(self.settings.playback_speed);
        // Playback toggles belong to the session, not the file
        timeline.looping = self.state.timeline.looping;
        timeline.inertia = self.state.timeline.inertia;

        tracing::info!("Loaded animation with {} keyframes", timeline.len());
        self.state.timeline = timeline;
        self.state.selection.keyframe = None;
        self.state.rig.reset_to_rest();
        self.history.clear();
        self.dirty = false;
        Ok(())
    }

    /// Save the animation to a `.dca` file
    pub fn save_animation_file(&mut self, path: &Path) -> Result<()> {
        let bytes = self.save_animation()?;
        std::fs::write(path, bytes)?;
        tracing::info!("Saved animation to {}", path.display());
        self.dirty = false;
        Ok(())
    }

    /// Load the animation from a `.dca` file
    pub fn load_animation_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.load_animation(&bytes)
    }

    // ---- Export ----

    /// Bake the animation into event snapshots
    pub fn bake(&mut self) -> Result<BakedAnimation> {
        let state = &mut self.state;
        Ok(export::bake(&mut state.timeline, &state.rig)?)
    }

    /// Generate the runtime procedure for the animation
    pub fn export_procedure(&mut self, name: &str) -> Result<String> {
        let baked = self.bake()?;
        let exporter = ProcedureExporter::new(format!("Animation Studio v{}", env!("CARGO_PKG_VERSION")))
            .with_decimals(self.settings.export_decimals);
        let text = exporter.procedure(name, &baked)?;
        tracing::info!("Exported procedure for {name} ({} snapshots)", baked.events.len());
        Ok(text)
    }

    /// Baked snapshots as pretty JSON
    pub fn export_json(&mut self) -> Result<String> {
        let baked = self.bake()?;
        Ok(serde_json::to_string_pretty(&baked)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animstudio_sequencer::{AnimationError, SortState};
    use approx::assert_relative_eq;

    fn context() -> EditorContext {
        let rig = Rig::new("test")
            .with_part("head", [0.0; 3], [0.0; 3])
            .unwrap()
            .with_part("tail", [0.0; 3], [0.0, 0.0, -1.0])
            .unwrap();
        EditorContext::new(rig, EditorSettings::default())
    }

    #[test]
    fn test_parse_axis_value() {
        assert_eq!(parse_axis_value(" 12.5 "), Some(12.5));
        assert_eq!(parse_axis_value("-3"), Some(-3.0));
        assert_eq!(parse_axis_value("abc"), None);
        assert_eq!(parse_axis_value("NaN"), None);
        assert_eq!(parse_axis_value("inf"), None);
    }

    #[test]
    fn test_no_selection_operations_are_noops() {
        let mut ctx = context();
        ctx.delete_selected_keyframe();
        ctx.set_duration(3.0).unwrap();
        ctx.set_pose(PoseChannel::Rotation, [1.0; 3]).unwrap();
        assert_eq!(ctx.add_progression_point(0.5, 0.5).unwrap(), None);
        assert!(!ctx.history.can_undo());
    }

    #[test]
    fn test_pose_edit_records_into_selected_keyframe() {
        let mut ctx = context();
        ctx.select_part(Some("head")).unwrap();
        let id = ctx.add_keyframe().unwrap();
        assert_eq!(ctx.state.selection.keyframe, Some(id));

        ctx.set_axis(PoseChannel::Rotation, Axis::Y, 90.0).unwrap();
        let head = ctx.state.rig.resolve_part("head").unwrap();
        assert_eq!(ctx.state.timeline.keyframe(id).unwrap().rotation(&head), Some([0.0, 90.0, 0.0]));

        ctx.seek(2.5);
        assert_eq!(ctx.pose_snapshot().get(&head).unwrap().rotation, [0.0, 45.0, 0.0]);
    }

    #[test]
    fn test_set_duration_keeps_end() {
        let mut ctx = context();
        ctx.seek(4.0);
        ctx.add_keyframe().unwrap();

        ctx.set_duration(3.0).unwrap();
        let kf = ctx.state.selected_keyframe().unwrap();
        assert_eq!(kf.start_time(), 6.0);
        assert_eq!(kf.end_time(), 9.0);

        let err = ctx.set_duration(20.0).unwrap_err();
        assert!(matches!(err, EditorError::Animation(AnimationError::InvalidMutation(_))));
        assert_eq!(ctx.state.selected_keyframe().unwrap().duration(), 3.0);
    }

    #[test]
    fn test_text_input_is_validated() {
        let mut ctx = context();
        ctx.select_part(Some("tail")).unwrap();
        assert!(ctx.set_axis_text(PoseChannel::Position, Axis::X, "oops").is_err());
        assert_eq!(ctx.history.stats().undo_count, 1);

        ctx.set_axis_text(PoseChannel::Position, Axis::X, "2").unwrap();
        ctx.nudge(PoseChannel::Position, Axis::X, 1.0).unwrap();
        let tail = ctx.state.rig.resolve_part("tail").unwrap();
        assert_relative_eq!(ctx.state.rig.current(&tail).unwrap().position[0], 2.1);
    }

    #[test]
    fn test_unknown_part_selection_rejected() {
        let mut ctx = context();
        let err = ctx.select_part(Some("wing")).unwrap_err();
        assert!(matches!(err, EditorError::Animation(AnimationError::UnknownPart(_))));
        assert_eq!(ctx.state.selection.part, None);
    }

    #[test]
    fn test_progression_point_undo() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        let point = ctx.add_progression_point(0.5, 0.8).unwrap().unwrap();
        ctx.move_progression_point(point, 0.25, 0.5).unwrap();
        ctx.remove_progression_point(point).unwrap();

        let endpoint = ctx.state.selected_keyframe().unwrap().progression.points()[0].id;
        assert!(ctx.remove_progression_point(endpoint).is_err());

        ctx.undo().unwrap();
        ctx.undo().unwrap();
        let kf = ctx.state.selected_keyframe().unwrap();
        let restored = kf.progression.point(point).unwrap();
        assert_eq!((restored.x, restored.y), (0.5, 0.8));
    }

    #[test]
    fn test_tick_plays_and_loops() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        ctx.set_looping(true).unwrap();
        ctx.play();
        ctx.tick(4.0);
        assert_relative_eq!(ctx.state.timeline.clock.ticks, 4.0);
        ctx.tick(2.0);
        assert_eq!(ctx.state.timeline.clock.ticks, 0.0);
        assert!(ctx.state.timeline.clock.playing);

        ctx.tick(1.5);
        ctx.pause();
        ctx.tick(1.0);
        assert_relative_eq!(ctx.state.timeline.clock.ticks, 1.5);
    }

    #[test]
    fn test_paused_tick_shows_retimed_pose() {
        let mut ctx = context();
        ctx.select_part(Some("head")).unwrap();
        ctx.add_keyframe().unwrap();
        ctx.set_axis(PoseChannel::Rotation, Axis::Y, 90.0).unwrap();
        let head = ctx.state.rig.resolve_part("head").unwrap();
        ctx.seek(2.5);
        assert_eq!(ctx.pose_snapshot().get(&head).unwrap().rotation, [0.0, 45.0, 0.0]);

        ctx.set_start_time(2.5).unwrap();
        ctx.tick(0.016);
        assert_eq!(ctx.pose_snapshot().get(&head).unwrap().rotation, [0.0; 3]);
        assert_eq!(ctx.state.timeline.clock.ticks, 2.5);

        ctx.undo().unwrap();
        ctx.tick(0.016);
        assert_eq!(ctx.pose_snapshot().get(&head).unwrap().rotation, [0.0, 45.0, 0.0]);
    }

    #[test]
    fn test_non_finite_progression_point_rejected() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        let undo_count = ctx.history.stats().undo_count;

        let err = ctx.add_progression_point(f64::NAN, 0.5).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
        let point = ctx.add_progression_point(0.5, 0.5).unwrap().unwrap();
        assert!(ctx.move_progression_point(point, 0.5, f64::INFINITY).is_err());
        assert_eq!(ctx.history.stats().undo_count, undo_count + 1);

        // Whatever was accepted can be saved and loaded back
        let bytes = ctx.save_animation().unwrap();
        ctx.load_animation(&bytes).unwrap();
        assert_eq!(ctx.save_animation().unwrap(), bytes);
    }

    #[test]
    fn test_curve_edits_leave_points_sorted() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        ctx.add_progression_point(0.8, 0.9).unwrap();
        let early = ctx.add_progression_point(0.2, 0.1).unwrap().unwrap();
        ctx.move_progression_point(early, 0.9, 0.95).unwrap();

        let curve = &ctx.state.selected_keyframe().unwrap().progression;
        assert_eq!(curve.sort_state(), SortState::Clean);
        let xs: Vec<f64> = curve.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.8, 0.9, 1.0]);

        ctx.undo().unwrap();
        let curve = &ctx.state.selected_keyframe().unwrap().progression;
        assert_eq!(curve.sort_state(), SortState::Clean);
        assert_eq!(curve.points()[1].id, early);
    }

    #[test]
    fn test_load_keeps_playback_toggles() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        let bytes = ctx.save_animation().unwrap();

        ctx.set_looping(true).unwrap();
        ctx.set_inertia(true).unwrap();
        ctx.load_animation(&bytes).unwrap();
        assert!(ctx.state.timeline.looping);
        assert!(ctx.state.timeline.inertia);
        assert_eq!(ctx.state.timeline.len(), 1);
    }

    #[test]
    fn test_load_failure_leaves_timeline_untouched() {
        let mut ctx = context();
        ctx.add_keyframe().unwrap();
        let before = ctx.state.clone();

        let mut bytes = ctx.save_animation().unwrap();
        bytes[3] = 99;
        assert!(ctx.load_animation(&bytes).is_err());
        assert_eq!(ctx.state, before);
        assert!(ctx.history.can_undo());
    }

    #[test]
    fn test_export_without_keyframes_fails() {
        let mut ctx = context();
        let err = ctx.export_procedure("idle").unwrap_err();
        assert!(matches!(err, EditorError::Animation(AnimationError::NoAnimationLoaded)));
    }
}
