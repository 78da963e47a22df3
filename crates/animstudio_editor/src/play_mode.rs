// SPDX-License-Identifier: MIT OR Apache-2.0
//! Batch frame export.
//!
//! This module handles:
//! - Holding the editor busy while frames are rendered
//! - Clock and pose backup and restoration
//! - Feeding posed frames to a capture sink

use crate::context::EditorContext;
use crate::error::{EditorError, Result};
use animstudio_sequencer::{AnimationError, PoseProvider, PoseSnapshot, Rig};
use std::ops::{Deref, DerefMut};

/// Receives rendered frames (GIF capture and the like)
pub trait FrameSink {
    /// Take the frame at `ticks`, shown for `delay` seconds
    fn add_frame(&mut self, ticks: f64, pose: &PoseSnapshot, delay: f64) -> Result<()>;
}

/// One captured frame
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Animation time of the frame, in ticks
    pub ticks: f64,
    /// Pose of every part
    pub pose: PoseSnapshot,
    /// Display time in seconds
    pub delay: f64,
}

/// Sink that keeps every frame in memory
#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// Frames in capture order
    pub frames: Vec<CapturedFrame>,
}

impl FrameSink for FrameBuffer {
    fn add_frame(&mut self, ticks: f64, pose: &PoseSnapshot, delay: f64) -> Result<()> {
        self.frames.push(CapturedFrame {
            ticks,
            pose: pose.clone(),
            delay,
        });
        Ok(())
    }
}

/// Holds the context busy; restores clock and pose when dropped
pub struct BusyScope<'a> {
    context: &'a mut EditorContext,
    ticks: f64,
    playing: bool,
    pose: Rig,
}

impl<'a> BusyScope<'a> {
    /// Mark the context busy and remember what to restore
    pub fn enter(context: &'a mut EditorContext) -> Self {
        let clock = context.state.timeline.clock;
        let pose = context.state.rig.clone();
        context.busy = true;
        tracing::debug!("Entered busy scope at tick {}", clock.ticks);
        Self {
            context,
            ticks: clock.ticks,
            playing: clock.playing,
            pose,
        }
    }
}

impl Deref for BusyScope<'_> {
    type Target = EditorContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for BusyScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for BusyScope<'_> {
    fn drop(&mut self) {
        let clock = &mut self.context.state.timeline.clock;
        clock.ticks = self.ticks;
        clock.playing = self.playing;
        std::mem::swap(&mut self.context.state.rig, &mut self.pose);
        self.context.busy = false;
        tracing::debug!("Left busy scope, clock restored to tick {}", self.ticks);
    }
}

/// Time range an export covers: one pass, or one loop cycle when looping
pub fn frame_range(context: &mut EditorContext) -> Result<(f64, f64)> {
    let timeline = &mut context.state.timeline;
    if timeline.is_empty() {
        return Err(AnimationError::NoAnimationLoaded.into());
    }
    let end = timeline.total_time();
    let start = if timeline.looping { timeline.loop_offset().min(end) } else { 0.0 };
    Ok((start, end))
}

/// Number of frames an export of `start..end` at `fps` produces
pub fn frame_count(start: f64, end: f64, fps: f64) -> usize {
    ((end - start) * fps).ceil().max(1.0) as usize
}

/// Render every frame of the animation at `fps` into `sink`.
///
/// `progress` is called with (frames done, frame count) after each frame.
/// Returns the number of frames written.
pub fn export_frames(
    context: &mut EditorContext,
    fps: f64,
    sink: &mut dyn FrameSink,
    mut progress: impl FnMut(usize, usize),
) -> Result<usize> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(EditorError::InvalidInput(format!("frames per second must be > 0, got {fps}")));
    }
    let (start, end) = frame_range(context)?;
    let delay = 1.0 / fps;
    let count = frame_count(start, end, fps);
    tracing::info!("Exporting {count} frames at {fps} fps ({start}..{end})");

    let mut scope = BusyScope::enter(context);
    for i in 0..count {
        let ticks = start + i as f64 * delay;
        let state = &mut scope.state;
        state.timeline.scrub(ticks, &mut state.rig);
        sink.add_frame(ticks, &state.rig.snapshot(), delay)?;
        progress(i + 1, count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditorSettings;
    use animstudio_sequencer::PoseChannel;

    fn context() -> EditorContext {
        let rig = Rig::new("test").with_part("head", [0.0; 3], [0.0; 3]).unwrap();
        let mut ctx = EditorContext::new(rig, EditorSettings::default());
        ctx.select_part(Some("head")).unwrap();
        ctx.add_keyframe().unwrap();
        ctx.set_pose(PoseChannel::Rotation, [0.0, 0.0, 50.0]).unwrap();
        ctx
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn add_frame(&mut self, ticks: f64, _pose: &PoseSnapshot, _delay: f64) -> Result<()> {
            if ticks >= 2.0 {
                return Err(EditorError::FrameSink("disk full".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_export_frames_covers_animation() {
        let mut ctx = context();
        let mut buffer = FrameBuffer::default();
        let mut calls = Vec::new();

        let count = export_frames(&mut ctx, 2.0, &mut buffer, |done, total| calls.push((done, total))).unwrap();
        assert_eq!(count, 10);
        assert_eq!(buffer.frames.len(), 10);
        assert_eq!(calls.last(), Some(&(10, 10)));
        assert_eq!(buffer.frames[0].delay, 0.5);
        assert_eq!(buffer.frames[5].ticks, 2.5);

        let rotation = buffer.frames[5].pose.get_by_name("head").unwrap().rotation;
        assert_eq!(rotation, [0.0, 0.0, 25.0]);
    }

    #[test]
    fn test_busy_scope_restores_on_error() {
        let mut ctx = context();
        ctx.state.timeline.clock.seek(1.5);
        ctx.play();
        let before = ctx.pose_snapshot();

        let err = export_frames(&mut ctx, 1.0, &mut FailingSink, |_, _| {}).unwrap_err();
        assert!(matches!(err, EditorError::FrameSink(_)));
        assert!(!ctx.is_busy());
        assert_eq!(ctx.state.timeline.clock.ticks, 1.5);
        assert!(ctx.state.timeline.clock.playing);
        assert_eq!(ctx.pose_snapshot(), before);
    }

    #[test]
    fn test_busy_context_ignores_clock_mutators() {
        let mut ctx = context();
        let mut scope = BusyScope::enter(&mut ctx);
        assert!(scope.is_busy());
        scope.play();
        scope.seek(3.0);
        scope.tick(1.0);
        assert!(!scope.state.timeline.clock.playing);
        assert_eq!(scope.state.timeline.clock.ticks, 0.0);
        drop(scope);
        assert!(!ctx.is_busy());
    }

    #[test]
    fn test_export_without_keyframes_fails() {
        let rig = Rig::new("test").with_part("head", [0.0; 3], [0.0; 3]).unwrap();
        let mut ctx = EditorContext::new(rig, EditorSettings::default());
        let mut buffer = FrameBuffer::default();

        let err = export_frames(&mut ctx, 10.0, &mut buffer, |_, _| {}).unwrap_err();
        assert!(matches!(err, EditorError::Animation(AnimationError::NoAnimationLoaded)));
        assert!(buffer.frames.is_empty());
        assert!(export_frames(&mut ctx, 0.0, &mut buffer, |_, _| {}).is_err());
    }

    #[test]
    fn test_looping_export_starts_at_loop_point() {
        let mut ctx = context();
        let first = ctx.state.selection.keyframe.unwrap();
        ctx.seek(5.0);
        ctx.add_keyframe().unwrap();
        ctx.set_loop_keyframe(Some(first)).unwrap();
        ctx.set_looping(true).unwrap();

        assert_eq!(frame_range(&mut ctx).unwrap(), (5.0, 10.0));
        assert_eq!(frame_count(5.0, 10.0, 4.0), 20);
    }
}
