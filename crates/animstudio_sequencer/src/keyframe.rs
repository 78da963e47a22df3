// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the sequencer.
//!
//! A keyframe is a timed interval. At creation it snapshots the pose of every
//! part (the baseline); edits made while it is selected record the target
//! pose each moving part reaches at the end of the interval.

use crate::error::{AnimationError, Result};
use crate::pose::{PartName, PoseChannel, PoseProvider, PoseSnapshot, Vec3};
use crate::progression::ProgressionCurve;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Duration given to keyframes created from the editor
pub const DEFAULT_KEYFRAME_DURATION: f64 = 5.0;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation, exact at `t == 0` and `t == 1`
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a * (1.0 - t) + b * t
    }

    /// Interpolate each axis
    pub fn lerp_vec3(a: Vec3, b: Vec3, t: f64) -> Vec3 {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Sinusoidal ease-in/out used for inertia
    pub fn inertia(t: f64) -> f64 {
        (std::f64::consts::PI * (t - 0.5)).sin() * 0.5 + 0.5
    }
}

/// A timed interval of per-part pose targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Start of the interval, in ticks
    start_time: f64,
    /// Length of the interval, in ticks
    duration: f64,
    /// Rotation each moving part reaches at the end of the interval
    pub rotation_map: IndexMap<PartName, Vec3>,
    /// Position each moving part reaches at the end of the interval
    pub position_map: IndexMap<PartName, Vec3>,
    /// Rotation of every part when the keyframe was created
    pub from_rotation_map: IndexMap<PartName, Vec3>,
    /// Position of every part when the keyframe was created
    pub from_position_map: IndexMap<PartName, Vec3>,
    /// Easing applied over the interval
    pub progression: ProgressionCurve,
}

impl Keyframe {
    /// Create a keyframe with empty maps and an identity curve
    pub fn new(start_time: f64, duration: f64) -> Result<Self> {
        validate_timing(start_time, duration)?;
        Ok(Self {
            id: KeyframeId::new(),
            start_time,
            duration,
            rotation_map: IndexMap::new(),
            position_map: IndexMap::new(),
            from_rotation_map: IndexMap::new(),
            from_position_map: IndexMap::new(),
            progression: ProgressionCurve::linear(),
        })
    }

    /// Create a keyframe whose baseline is the current pose of every part
    pub fn capture(start_time: f64, duration: f64, pose: &dyn PoseProvider) -> Result<Self> {
        let mut keyframe = Self::new(start_time, duration)?;
        keyframe.set_baseline(&pose.snapshot());
        Ok(keyframe)
    }

    /// Replace the baseline with a snapshot
    pub fn set_baseline(&mut self, snapshot: &PoseSnapshot) {
        self.from_rotation_map = snapshot.iter().map(|(p, t)| (p.clone(), t.rotation)).collect();
        self.from_position_map = snapshot.iter().map(|(p, t)| (p.clone(), t.position)).collect();
    }

    /// Start of the interval
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Length of the interval
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// End of the interval
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Change start and duration together
    pub fn set_timing(&mut self, start_time: f64, duration: f64) -> Result<()> {
        validate_timing(start_time, duration)?;
        self.start_time = start_time;
        self.duration = duration;
        Ok(())
    }

    /// Target map for a channel
    pub fn targets(&self, channel: PoseChannel) -> &IndexMap<PartName, Vec3> {
        match channel {
            PoseChannel::Rotation => &self.rotation_map,
            PoseChannel::Position => &self.position_map,
        }
    }

    /// Baseline map for a channel
    pub fn baselines(&self, channel: PoseChannel) -> &IndexMap<PartName, Vec3> {
        match channel {
            PoseChannel::Rotation => &self.from_rotation_map,
            PoseChannel::Position => &self.from_position_map,
        }
    }

    fn targets_mut(&mut self, channel: PoseChannel) -> &mut IndexMap<PartName, Vec3> {
        match channel {
            PoseChannel::Rotation => &mut self.rotation_map,
            PoseChannel::Position => &mut self.position_map,
        }
    }

    /// End-of-interval value of a part, falling back to its baseline
    pub fn value(&self, channel: PoseChannel, part: &PartName) -> Option<Vec3> {
        self.targets(channel)
            .get(part)
            .or_else(|| self.baselines(channel).get(part))
            .copied()
    }

    /// End-of-interval rotation of a part, falling back to its baseline
    pub fn rotation(&self, part: &PartName) -> Option<Vec3> {
        self.value(PoseChannel::Rotation, part)
    }

    /// End-of-interval position of a part, falling back to its baseline
    pub fn position(&self, part: &PartName) -> Option<Vec3> {
        self.value(PoseChannel::Position, part)
    }

    /// Record a target, returning the previous one
    pub fn set_target(&mut self, channel: PoseChannel, part: PartName, value: Vec3) -> Option<Vec3> {
        self.targets_mut(channel).insert(part, value)
    }

    /// Drop a target, keeping the order of the others
    pub fn clear_target(&mut self, channel: PoseChannel, part: &PartName) -> Option<Vec3> {
        self.targets_mut(channel).shift_remove(part)
    }

    /// Record a rotation target
    pub fn set_rotation(&mut self, part: PartName, rotation: Vec3) -> Option<Vec3> {
        self.set_target(PoseChannel::Rotation, part, rotation)
    }

    /// Record a position target
    pub fn set_position(&mut self, part: PartName, position: Vec3) -> Option<Vec3> {
        self.set_target(PoseChannel::Position, part, position)
    }

    /// Drop a rotation target
    pub fn clear_rotation(&mut self, part: &PartName) -> Option<Vec3> {
        self.clear_target(PoseChannel::Rotation, part)
    }

    /// Drop a position target
    pub fn clear_position(&mut self, part: &PartName) -> Option<Vec3> {
        self.clear_target(PoseChannel::Position, part)
    }

    /// Linear progress through the interval, clamped to [0, 1]
    pub fn progress(&self, at_time: f64) -> f64 {
        ((at_time - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased progress through the interval
    pub fn eased_progress(&self, at_time: f64, force_absolute: bool, inertia: bool) -> f64 {
        let eased = self.progression.evaluate(self.progress(at_time));
        if inertia && !force_absolute {
            Interpolation::inertia(eased)
        } else {
            eased
        }
    }

    /// Write the interpolated pose of every part this keyframe moves
    pub fn apply(&self, at_time: f64, force_absolute: bool, inertia: bool, pose: &mut dyn PoseProvider) {
        let t = self.eased_progress(at_time, force_absolute, inertia);

        for channel in [PoseChannel::Rotation, PoseChannel::Position] {
            for (part, target) in self.targets(channel) {
                let from = match self.baselines(channel).get(part) {
                    Some(from) => *from,
                    None => match pose.rest(part) {
                        Some(rest) => channel.read(&rest),
                        None => continue,
                    },
                };
                pose.set_channel(part, channel, Interpolation::lerp_vec3(from, *target, t));
            }
        }
    }
}

fn validate_timing(start_time: f64, duration: f64) -> Result<()> {
    if !start_time.is_finite() || start_time < 0.0 {
        return Err(AnimationError::invalid(format!("start time must be >= 0, got {start_time}")));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AnimationError::invalid(format!("duration must be > 0, got {duration}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Rig;
    use approx::assert_relative_eq;

    fn rig() -> Rig {
        Rig::new("test")
            .with_part("head", [0.0, 0.0, 0.0], [0.0, 0.0, 0.0])
            .unwrap()
            .with_part("tail", [0.0, 0.0, 0.0], [0.0, 0.0, 0.0])
            .unwrap()
    }

    #[test]
    fn test_capture_snapshots_every_part() {
        let mut rig = rig();
        let tail = rig.resolve_part("tail").unwrap();
        rig.set_rotation(&tail, [5.0, 0.0, 0.0]);

        let kf = Keyframe::capture(2.0, DEFAULT_KEYFRAME_DURATION, &rig).unwrap();
        assert_eq!(kf.from_rotation_map.len(), 2);
        assert_eq!(kf.from_rotation_map[&tail], [5.0, 0.0, 0.0]);
        assert!(kf.rotation_map.is_empty());
        assert_eq!(kf.end_time(), 7.0);
    }

    #[test]
    fn test_invalid_timing_rejected() {
        assert!(matches!(Keyframe::new(0.0, 0.0), Err(AnimationError::InvalidMutation(_))));
        assert!(Keyframe::new(-1.0, 1.0).is_err());
        assert!(Keyframe::new(0.0, f64::NAN).is_err());

        let mut kf = Keyframe::new(0.0, 1.0).unwrap();
        assert!(kf.set_timing(1.0, -2.0).is_err());
        assert_eq!(kf.duration(), 1.0);
    }

    #[test]
    fn test_apply_interpolates_from_baseline() {
        let mut rig = rig();
        let head = rig.resolve_part("head").unwrap();
        let mut kf = Keyframe::capture(0.0, 10.0, &rig).unwrap();
        kf.set_rotation(head.clone(), [0.0, 90.0, 0.0]);

        kf.apply(5.0, false, false, &mut rig);
        assert_relative_eq!(rig.current(&head).unwrap().rotation[1], 45.0);

        kf.apply(20.0, false, false, &mut rig);
        assert_eq!(rig.current(&head).unwrap().rotation, [0.0, 90.0, 0.0]);
    }

    #[test]
    fn test_apply_leaves_unlisted_parts() {
        let mut rig = rig();
        let head = rig.resolve_part("head").unwrap();
        let tail = rig.resolve_part("tail").unwrap();
        let mut kf = Keyframe::capture(0.0, 1.0, &rig).unwrap();
        kf.set_position(head, [1.0, 1.0, 1.0]);

        rig.set_position(&tail, [3.0, 3.0, 3.0]);
        kf.apply(1.0, true, false, &mut rig);
        assert_eq!(rig.current(&tail).unwrap().position, [3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_inertia_only_without_force_absolute() {
        let rig = rig();
        let mut kf = Keyframe::capture(0.0, 4.0, &rig).unwrap();
        kf.progression.add_point(0.5, 0.5).unwrap();

        assert_relative_eq!(kf.eased_progress(1.0, false, true), Interpolation::inertia(0.25));
        assert_relative_eq!(kf.eased_progress(1.0, true, true), 0.25);
        assert_relative_eq!(kf.eased_progress(2.0, false, true), 0.5);
    }

    #[test]
    fn test_getters_fall_back_to_baseline() {
        let rig = rig();
        let head = rig.resolve_part("head").unwrap();
        let mut kf = Keyframe::capture(0.0, 1.0, &rig).unwrap();
        assert_eq!(kf.rotation(&head), Some([0.0, 0.0, 0.0]));

        kf.set_rotation(head.clone(), [1.0, 2.0, 3.0]);
        assert_eq!(kf.rotation(&head), Some([1.0, 2.0, 3.0]));
        assert_eq!(kf.clear_target(PoseChannel::Rotation, &head), Some([1.0, 2.0, 3.0]));
        assert_eq!(kf.rotation(&head), Some([0.0, 0.0, 0.0]));
    }
}
