// SPDX-License-Identifier: MIT OR Apache-2.0
//! Baked snapshots and procedure export.
//!
//! The runtime side plays animations from a generated procedure instead of
//! the keyframe data. Baking samples the pose at every distinct keyframe
//! start and end; the procedure then blends between consecutive snapshots.

use crate::error::{AnimationError, Result};
use crate::pose::{PoseProvider, PoseSnapshot, Rig};
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Pose at one event time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedEvent {
    /// Event time, in ticks
    pub time: f64,
    /// Pose of every part at that time
    pub pose: PoseSnapshot,
}

/// An animation flattened to event snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedAnimation {
    /// Latest keyframe end
    pub total_time: f64,
    /// Playback speed multiplier at bake time
    pub speed: f64,
    /// Whether the animation loops
    pub looping: bool,
    /// Snapshots by ascending time
    pub events: Vec<BakedEvent>,
}

/// Sample the timeline at every distinct event time.
///
/// Sampling runs on a scratch copy of the model, so the live pose is left alone.
pub fn bake(timeline: &mut Timeline, model: &dyn PoseProvider) -> Result<BakedAnimation> {
    if timeline.is_empty() {
        return Err(AnimationError::NoAnimationLoaded);
    }

    let mut scratch = Rig::at_rest_of(model);
    let events = timeline
        .event_times()
        .into_iter()
        .map(|time| {
            timeline.scrub(time, &mut scratch);
            BakedEvent {
                time,
                pose: scratch.snapshot(),
            }
        })
        .collect();

    Ok(BakedAnimation {
        total_time: timeline.total_time(),
        speed: timeline.clock.speed,
        looping: timeline.looping,
        events,
    })
}

/// Writes a baked animation as a runtime procedure
#[derive(Debug, Clone)]
pub struct ProcedureExporter {
    /// Decimal places kept for transform values
    pub decimals: u32,
    /// Tool version stamped in the header comment
    pub generator: String,
}

impl ProcedureExporter {
    /// Create an exporter
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            decimals: 3,
            generator: generator.into(),
        }
    }

    /// Set the number of decimal places
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimals as i32);
        (value * scale).round() / scale
    }

    /// Generate the procedure for an animation called `name`
    pub fn procedure(&self, name: &str, baked: &BakedAnimation) -> Result<String> {
        let mut out = String::new();
        self.write_to(&mut out, name, baked)?;
        Ok(out)
    }

    /// Write the procedure for an animation called `name` into `out`
    pub fn write_to(&self, out: &mut impl Write, name: &str, baked: &BakedAnimation) -> Result<()> {
        if baked.events.len() < 2 {
            return Err(AnimationError::NoAnimationLoaded);
        }
        let method = method_suffix(name);
        self.write_procedure(out, name, &method, baked)?;
        Ok(())
    }

    fn write_procedure(
        &self,
        out: &mut impl Write,
        name: &str,
        method: &str,
        baked: &BakedAnimation,
    ) -> std::fmt::Result {
        let events = &baked.events;
        let last_segment = events.len() - 2;

        writeln!(out, "/**")?;
        writeln!(out, " * Play the animation {{@code {name}}}, which is {} ticks long", baked.total_time)?;
        writeln!(out, " * @param entry The entry to run the animation on")?;
        writeln!(out, " * @param ticksDone ticks since the animation started; need not start at 0")?;
        writeln!(out, " * Generated by {}", self.generator)?;
        writeln!(out, " */")?;
        writeln!(out, "private void playAnimation{method}(AnimatedEntityEntry entry, float ticksDone) {{")?;
        writeln!(out, "    ticksDone *= {}F;", self.round(baked.speed))?;
        if baked.looping {
            writeln!(out, "    ticksDone %= {}F;", self.round(baked.total_time))?;
        }

        writeln!(out)?;
        writeln!(out, "    int snapshotID;")?;
        for (i, next) in events.iter().skip(1).take(last_segment).enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            writeln!(out, "    {keyword}(ticksDone < {}F) snapshotID = {i};", self.round(next.time))?;
        }
        if last_segment == 0 {
            writeln!(out, "    snapshotID = 0;")?;
        } else {
            writeln!(out, "    else snapshotID = {last_segment};")?;
        }
        writeln!(out, "    entry.ensureSnapshot(\"{name}\", snapshotID);")?;

        for (i, pair) in events.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            writeln!(out)?;
            writeln!(out, "    if (ticksDone > {}F) {{", self.round(from.time))?;
            writeln!(
                out,
                "        float percentage = (ticksDone - {}F) / {}F;",
                self.round(from.time),
                self.round(to.time - from.time)
            )?;
            writeln!(out, "        if (percentage > 1F) percentage = 1F;")?;

            for (part, transform) in to.pose.iter() {
                // Parts that did not move since the previous snapshot are skipped
                if i > 0 && from.pose.get(part) == Some(transform) {
                    continue;
                }
                let [px, py, pz] = transform.position.map(|v| self.round(v));
                let [rx, ry, rz] = transform.rotation.map(|v| self.round(v.to_radians()));
                writeln!(
                    out,
                    "        entry.setTransforms(this.{part}, {px}F, {py}F, {pz}F, {rx}F, {ry}F, {rz}F, percentage);"
                )?;
            }
            writeln!(out, "    }}")?;
        }

        writeln!(out, "}}")
    }
}

/// `walk cycle` -> `WalkCycle`
fn method_suffix(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}
