// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline of keyframes and its playback clock.

use crate::derived::Derived;
use crate::error::{AnimationError, Result};
use crate::keyframe::{Keyframe, KeyframeId, DEFAULT_KEYFRAME_DURATION};
use crate::pose::PoseProvider;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Playback clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackClock {
    /// Current playback time, in ticks
    pub ticks: f64,
    /// Playback speed multiplier
    pub speed: f64,
    /// Whether the clock advances on [`Timeline::animate`]
    pub playing: bool,
}

impl PlaybackClock {
    /// Create a stopped clock at tick 0
    pub fn new() -> Self {
        Self {
            ticks: 0.0,
            speed: 1.0,
            playing: false,
        }
    }

    /// Play from current position
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        self.playing = !self.playing;
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.playing = false;
        self.ticks = 0.0;
    }

    /// Seek to specific time
    pub fn seek(&mut self, ticks: f64) {
        if ticks.is_finite() {
            self.ticks = ticks.max(0.0);
        }
    }

    /// Set the speed multiplier. Non-finite or negative values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed >= 0.0 {
            self.speed = speed;
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering and extent derived from the keyframe set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineIndex {
    /// Keyframe IDs by ascending start time; ties keep insertion order
    pub order: Vec<KeyframeId>,
    /// Latest keyframe end
    pub total_time: f64,
}

impl TimelineIndex {
    /// Build the index for a keyframe set
    pub fn build(keyframes: &IndexMap<KeyframeId, Keyframe>) -> Self {
        let mut sorted: Vec<&Keyframe> = keyframes.values().collect();
        sorted.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));

        Self {
            order: sorted.iter().map(|k| k.id).collect(),
            total_time: sorted.iter().map(|k| k.end_time()).fold(0.0, f64::max),
        }
    }
}

/// An animation: keyframes plus playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Keyframes in insertion order
    keyframes: IndexMap<KeyframeId, Keyframe>,
    #[serde(skip)]
    index: Derived<TimelineIndex>,
    /// Whether playback wraps back to the loop point
    pub looping: bool,
    /// Keyframe whose end is where looped playback re-enters
    loop_keyframe: Option<KeyframeId>,
    /// Ease parts through interval boundaries instead of snapping
    pub inertia: bool,
    /// Playback clock
    pub clock: PlaybackClock,
    /// Duration of keyframes made by [`create_keyframe`](Self::create_keyframe)
    pub default_duration: f64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            keyframes: IndexMap::new(),
            index: Derived::Dirty,
            looping: false,
            loop_keyframe: None,
            inertia: false,
            clock: PlaybackClock::new(),
            default_duration: DEFAULT_KEYFRAME_DURATION,
        }
    }

    /// Invalidate the derived ordering and total time
    pub fn keyframes_dirty(&mut self) {
        self.index.invalidate();
    }

    /// Whether derived state is waiting for a recompute
    pub fn is_dirty(&self) -> bool {
        self.index.is_dirty()
    }

    /// Recompute derived state if it was invalidated. Progression curves
    /// left unordered by edits are sorted here too.
    pub fn refresh(&mut self) -> &TimelineIndex {
        if self.index.is_dirty() {
            for keyframe in self.keyframes.values_mut() {
                keyframe.progression.ensure_sorted();
            }
        }
        let keyframes = &self.keyframes;
        self.index.get_or_update(|| TimelineIndex::build(keyframes))
    }

    /// Keyframe IDs by ascending start time
    pub fn sorted_ids(&mut self) -> Vec<KeyframeId> {
        self.refresh().order.clone()
    }

    /// Keyframes by ascending start time
    pub fn sorted_keyframes(&mut self) -> Vec<&Keyframe> {
        self.refresh();
        let this = &*self;
        this.index
            .get()
            .map(|index| index.order.iter().filter_map(|id| this.keyframes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Latest keyframe end
    pub fn total_time(&mut self) -> f64 {
        self.refresh().total_time
    }

    /// Keyframes in insertion order
    pub fn keyframes(&self) -> impl Iterator<Item = &Keyframe> {
        self.keyframes.values()
    }

    /// Get a keyframe
    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.get(&id)
    }

    /// Get a mutable keyframe. Invalidates derived state.
    pub fn keyframe_mut(&mut self, id: KeyframeId) -> Option<&mut Keyframe> {
        self.index.invalidate();
        self.keyframes.get_mut(&id)
    }

    /// Insertion index of a keyframe
    pub fn position_of(&self, id: KeyframeId) -> Option<usize> {
        self.keyframes.get_index_of(&id)
    }

    /// Keyframe count
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether there are no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Capture a keyframe at the playhead from the current pose
    pub fn create_keyframe(&self, pose: &dyn PoseProvider) -> Result<Keyframe> {
        Keyframe::capture(self.clock.ticks, self.default_duration, pose)
    }

    /// Append a keyframe
    pub fn insert_keyframe(&mut self, keyframe: Keyframe) -> KeyframeId {
        let id = keyframe.id;
        self.keyframes.insert(id, keyframe);
        self.index.invalidate();
        id
    }

    /// Insert a keyframe at an insertion index (clamped to the end)
    pub fn insert_keyframe_at(&mut self, index: usize, keyframe: Keyframe) -> KeyframeId {
        let id = keyframe.id;
        let index = index.min(self.keyframes.len());
        self.keyframes.shift_insert(index, id, keyframe);
        self.index.invalidate();
        id
    }

    /// Remove a keyframe, returning its insertion index
    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Option<(usize, Keyframe)> {
        let (index, _, keyframe) = self.keyframes.shift_remove_full(&id)?;
        self.index.invalidate();
        Some((index, keyframe))
    }

    /// Replace every keyframe
    pub fn replace_keyframes(&mut self, keyframes: impl IntoIterator<Item = Keyframe>) {
        self.keyframes = keyframes.into_iter().map(|k| (k.id, k)).collect();
        self.loop_keyframe = self.loop_keyframe.filter(|id| self.keyframes.contains_key(id));
        self.index.invalidate();
    }

    /// Change start and duration of a keyframe
    pub fn retime_keyframe(&mut self, id: KeyframeId, start_time: f64, duration: f64) -> Result<()> {
        let keyframe = self
            .keyframe_mut(id)
            .ok_or_else(|| AnimationError::invalid(format!("no keyframe {:?}", id.0)))?;
        keyframe.set_timing(start_time, duration)
    }

    /// The designated loop keyframe
    pub fn loop_keyframe(&self) -> Option<KeyframeId> {
        self.loop_keyframe
    }

    /// Designate the loop keyframe
    pub fn set_loop_keyframe(&mut self, id: Option<KeyframeId>) {
        self.loop_keyframe = id;
    }

    /// Where looped playback re-enters the timeline
    pub fn loop_offset(&self) -> f64 {
        self.loop_keyframe
            .and_then(|id| self.keyframes.get(&id))
            .map(Keyframe::end_time)
            .unwrap_or(0.0)
    }

    /// Advance the clock while playing
    pub fn animate(&mut self, delta_ticks: f64) {
        if !self.clock.playing || !delta_ticks.is_finite() {
            return;
        }

        self.clock.ticks += delta_ticks * self.clock.speed;
        let total = self.total_time();
        if self.clock.ticks <= total {
            return;
        }

        if self.looping {
            self.clock.ticks = self.loop_offset();
        } else {
            self.clock.ticks = total;
            self.clock.playing = false;
        }
    }

    /// Apply every started keyframe at the clock time
    pub fn resolve_pose(&mut self, pose: &mut dyn PoseProvider) {
        let ticks = self.clock.ticks;
        self.resolve_pose_at(ticks, false, pose);
    }

    /// Apply, in start order, every keyframe that has started by `ticks`.
    /// Later keyframes override earlier ones for the parts they move.
    pub fn resolve_pose_at(&mut self, ticks: f64, force_absolute: bool, pose: &mut dyn PoseProvider) {
        let inertia = self.inertia;
        for keyframe in self.sorted_keyframes() {
            if keyframe.start_time() > ticks {
                break;
            }
            keyframe.apply(ticks, force_absolute, inertia, pose);
        }
    }

    /// Pose at `ticks` starting from rest, independent of the current pose
    pub fn scrub(&mut self, ticks: f64, pose: &mut dyn PoseProvider) {
        pose.reset_to_rest();
        self.resolve_pose_at(ticks, true, pose);
    }

    /// Put every part at rest and rewind
    pub fn reset_animations(&mut self, pose: &mut dyn PoseProvider) {
        pose.reset_to_rest();
        self.clock.ticks = 0.0;
    }

    /// Every distinct keyframe start and end, ascending
    pub fn event_times(&mut self) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .sorted_keyframes()
            .iter()
            .flat_map(|k| [k.start_time(), k.end_time()])
            .collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

// Derived state is a cache and takes no part in equality
impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        self.keyframes == other.keyframes
            && self.looping == other.looping
            && self.loop_keyframe == other.loop_keyframe
            && self.inertia == other.inertia
            && self.clock == other.clock
            && self.default_duration == other.default_duration
    }
}
