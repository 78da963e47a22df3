// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary `.dca` animation format.
//!
//! All numbers are big-endian. Version 3 layout:
//!
//! ```text
//! version: u32
//! keyframe_count: u32
//! per keyframe (ascending start time):
//!     start_time: f64, duration: f64
//!     rotation delta block
//!     position delta block
//!     point_count: u32, then x: f64, y: f64 per point (x order)
//! delta block:
//!     changed_count: u32
//!     per part: name (u32 byte length + UTF-8), dx: f64, dy: f64, dz: f64
//! ```
//!
//! A part is written only when its target differs from the keyframe baseline
//! by more than [`FUZZY_EPSILON`](crate::pose::FUZZY_EPSILON). The stored delta is relative to the part's
//! REST value, not the baseline. Files depend on this, so it stays.
//!
//! Version 1 has only the rotation block and version 2 adds the position
//! block; neither stores progression points.

use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::pose::{fuzzy_eq3, PartName, PoseChannel, PoseProvider, Rig, Vec3};
use crate::progression::ProgressionCurve;
use crate::timeline::Timeline;
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use indexmap::IndexMap;
use std::io::{self, Cursor, Read};

/// Version written by [`encode`]
pub const DCA_VERSION: u32 = 3;

/// File extension for animation files
pub const DCA_EXTENSION: &str = "dca";

/// Which blocks a format version carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    positions: bool,
    progression: bool,
}

impl Layout {
    fn for_version(version: u32) -> Result<Self> {
        match version {
            1 => Ok(Self { positions: false, progression: false }),
            2 => Ok(Self { positions: true, progression: false }),
            3 => Ok(Self { positions: true, progression: true }),
            other => Err(AnimationError::malformed(format!(
                "unsupported version {other} (newest supported is {DCA_VERSION})"
            ))),
        }
    }
}

fn io_error(err: io::Error) -> AnimationError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => AnimationError::malformed("unexpected end of buffer"),
        _ => AnimationError::malformed(err.to_string()),
    }
}

fn count(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| AnimationError::invalid(format!("too many {what} to encode")))
}

/// Encode a timeline. `model` supplies the rest pose deltas are taken against.
pub fn encode(timeline: &mut Timeline, model: &dyn PoseProvider) -> Result<Vec<u8>> {
    let keyframes = timeline.sorted_keyframes();
    let mut out = Vec::new();

    out.write_u32::<BE>(DCA_VERSION).map_err(io_error)?;
    out.write_u32::<BE>(count(keyframes.len(), "keyframes")?).map_err(io_error)?;

    for keyframe in keyframes {
        out.write_f64::<BE>(keyframe.start_time()).map_err(io_error)?;
        out.write_f64::<BE>(keyframe.duration()).map_err(io_error)?;
        write_delta_block(&mut out, keyframe, PoseChannel::Rotation, model)?;
        write_delta_block(&mut out, keyframe, PoseChannel::Position, model)?;

        let points = keyframe.progression.sorted_points();
        out.write_u32::<BE>(count(points.len(), "progression points")?).map_err(io_error)?;
        for point in points {
            out.write_f64::<BE>(point.x).map_err(io_error)?;
            out.write_f64::<BE>(point.y).map_err(io_error)?;
        }
    }

    Ok(out)
}

fn write_delta_block(
    out: &mut Vec<u8>,
    keyframe: &Keyframe,
    channel: PoseChannel,
    model: &dyn PoseProvider,
) -> Result<()> {
    let mut changed = Vec::new();
    for (part, target) in keyframe.targets(channel) {
        let rest = model
            .rest(part)
            .map(|t| channel.read(&t))
            .ok_or_else(|| AnimationError::UnknownPart(part.to_string()))?;
        let baseline = keyframe.baselines(channel).get(part).copied().unwrap_or(rest);
        if !fuzzy_eq3(*target, baseline) {
            changed.push((part, *target, rest));
        }
    }

    out.write_u32::<BE>(count(changed.len(), "parts")?).map_err(io_error)?;
    for (part, target, rest) in changed {
        let name = part.as_str().as_bytes();
        out.write_u32::<BE>(count(name.len(), "name bytes")?).map_err(io_error)?;
        out.extend_from_slice(name);
        for axis in 0..3 {
            out.write_f64::<BE>(target[axis] - rest[axis]).map_err(io_error)?;
        }
    }
    Ok(())
}

/// A keyframe as stored, before its baseline is rebuilt
struct StoredKeyframe {
    start_time: f64,
    duration: f64,
    rotations: IndexMap<PartName, Vec3>,
    positions: IndexMap<PartName, Vec3>,
    progression: ProgressionCurve,
}

/// Decode a timeline.
///
/// `model` is only read: baselines are rebuilt on a scratch copy of its rest
/// pose. On error nothing is returned, so a caller can keep its current
/// timeline.
pub fn decode(bytes: &[u8], model: &dyn PoseProvider) -> Result<Timeline> {
    let mut reader = Cursor::new(bytes);
    let version = reader.read_u32::<BE>().map_err(io_error)?;
    let layout = Layout::for_version(version)?;
    let keyframe_count = reader.read_u32::<BE>().map_err(io_error)? as usize;

    // Every keyframe takes at least 16 bytes, so a huge count fails fast
    let mut stored = Vec::with_capacity(keyframe_count.min(bytes.len() / 16));
    for _ in 0..keyframe_count {
        stored.push(read_keyframe(&mut reader, layout, model)?);
    }

    if reader.position() != bytes.len() as u64 {
        return Err(AnimationError::malformed(format!(
            "{} trailing bytes",
            bytes.len() as u64 - reader.position()
        )));
    }

    rebuild(stored, model)
}

fn read_keyframe(
    reader: &mut Cursor<&[u8]>,
    layout: Layout,
    model: &dyn PoseProvider,
) -> Result<StoredKeyframe> {
    let start_time = reader.read_f64::<BE>().map_err(io_error)?;
    let duration = reader.read_f64::<BE>().map_err(io_error)?;
    if !start_time.is_finite() || start_time < 0.0 {
        return Err(AnimationError::malformed(format!("invalid start time {start_time}")));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AnimationError::malformed(format!("invalid duration {duration}")));
    }

    let rotations = read_delta_block(reader, PoseChannel::Rotation, model)?;
    let positions = if layout.positions {
        read_delta_block(reader, PoseChannel::Position, model)?
    } else {
        IndexMap::new()
    };

    let progression = if layout.progression {
        let point_count = reader.read_u32::<BE>().map_err(io_error)? as usize;
        let remaining = reader.get_ref().len().saturating_sub(reader.position() as usize);
        let mut coordinates = Vec::with_capacity(point_count.min(remaining / 16));
        for _ in 0..point_count {
            let x = reader.read_f64::<BE>().map_err(io_error)?;
            let y = reader.read_f64::<BE>().map_err(io_error)?;
            coordinates.push((x, y));
        }
        ProgressionCurve::from_coordinates(&coordinates)?
    } else {
        ProgressionCurve::linear()
    };

    Ok(StoredKeyframe {
        start_time,
        duration,
        rotations,
        positions,
        progression,
    })
}

fn read_delta_block(
    reader: &mut Cursor<&[u8]>,
    channel: PoseChannel,
    model: &dyn PoseProvider,
) -> Result<IndexMap<PartName, Vec3>> {
    let changed = reader.read_u32::<BE>().map_err(io_error)?;
    let mut targets = IndexMap::new();

    for _ in 0..changed {
        let name = read_string(reader)?;
        let part = model
            .resolve_part(&name)
            .map_err(|_| AnimationError::malformed(format!("unknown part '{name}'")))?;
        let rest = model
            .rest(&part)
            .map(|t| channel.read(&t))
            .ok_or_else(|| AnimationError::malformed(format!("unknown part '{name}'")))?;

        let mut target = [0.0; 3];
        for (axis, value) in target.iter_mut().enumerate() {
            *value = reader.read_f64::<BE>().map_err(io_error)? + rest[axis];
        }
        if target.iter().any(|v| !v.is_finite()) {
            return Err(AnimationError::malformed(format!("non-finite {} for '{name}'", channel.name())));
        }
        targets.insert(part, target);
    }

    Ok(targets)
}

fn read_string(reader: &mut Cursor<&[u8]>) -> Result<String> {
    let len = reader.read_u32::<BE>().map_err(io_error)? as usize;
    let remaining = reader.get_ref().len().saturating_sub(reader.position() as usize);
    if len > remaining {
        return Err(AnimationError::malformed("unexpected end of buffer"));
    }
    let mut buffer = vec![0; len];
    reader.read_exact(&mut buffer).map_err(io_error)?;
    String::from_utf8(buffer).map_err(|_| AnimationError::malformed("part name is not UTF-8"))
}

/// Rebuild baselines by replaying keyframes in time order, capturing the
/// pose at each start the same way the editor does when a keyframe is added.
fn rebuild(stored: Vec<StoredKeyframe>, model: &dyn PoseProvider) -> Result<Timeline> {
    let mut scratch = Rig::at_rest_of(model);
    let mut replay = Timeline::new();

    let mut order: Vec<usize> = (0..stored.len()).collect();
    order.sort_by(|&a, &b| stored[a].start_time.total_cmp(&stored[b].start_time));

    let mut slots: Vec<Option<Keyframe>> = stored.iter().map(|_| None).collect();
    let mut stored: Vec<Option<StoredKeyframe>> = stored.into_iter().map(Some).collect();

    for index in order {
        let Some(entry) = stored[index].take() else {
            continue;
        };
        replay.scrub(entry.start_time, &mut scratch);

        let mut keyframe = Keyframe::new(entry.start_time, entry.duration)
            .map_err(|err| AnimationError::malformed(err.to_string()))?;
        keyframe.set_baseline(&scratch.snapshot());
        keyframe.rotation_map = entry.rotations;
        keyframe.position_map = entry.positions;
        keyframe.progression = entry.progression;

        replay.insert_keyframe(keyframe.clone());
        slots[index] = Some(keyframe);
    }

    let mut timeline = Timeline::new();
    timeline.replace_keyframes(slots.into_iter().flatten());
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rig() -> Rig {
        Rig::new("raptor")
            .with_part("head", [10.0, 0.0, 0.0], [0.0, 4.0, 2.0])
            .unwrap()
            .with_part("tail", [0.0, 0.0, 0.0], [0.0, 2.0, -3.0])
            .unwrap()
            .with_part("jaw", [0.0, 0.0, 0.0], [0.0, 0.0, 1.0])
            .unwrap()
    }

    fn sample_timeline(rig: &mut Rig) -> Timeline {
        let head = rig.resolve_part("head").unwrap();
        let tail = rig.resolve_part("tail").unwrap();
        let mut timeline = Timeline::new();

        let mut first = timeline.create_keyframe(rig).unwrap();
        first.set_rotation(head.clone(), [40.0, 0.0, 0.0]);
        first.set_position(tail.clone(), [0.0, 2.5, -3.0]);
        first.progression.add_point(0.75, 0.25).unwrap();
        timeline.insert_keyframe(first);

        timeline.clock.seek(5.0);
        timeline.scrub(5.0, rig);
        let mut second = timeline.create_keyframe(rig).unwrap();
        second.set_rotation(head, [-20.0, 15.0, 0.0]);
        // Unchanged from the baseline, so it is compacted away
        second.set_rotation(tail, [0.0, 0.0, 0.0]);
        timeline.insert_keyframe(second);

        rig.reset_to_rest();
        timeline
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let mut rig = rig();
        let mut timeline = sample_timeline(&mut rig);

        let bytes = encode(&mut timeline, &rig).unwrap();
        let mut decoded = decode(&bytes, &rig).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(encode(&mut decoded, &rig).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rebuilds_targets_and_baselines() {
        let mut rig = rig();
        let head = rig.resolve_part("head").unwrap();
        let tail = rig.resolve_part("tail").unwrap();
        let mut timeline = sample_timeline(&mut rig);

        let bytes = encode(&mut timeline, &rig).unwrap();
        let mut decoded = decode(&bytes, &rig).unwrap();
        let sorted = decoded.sorted_keyframes();

        assert_eq!(sorted[0].rotation_map[&head], [40.0, 0.0, 0.0]);
        assert_eq!(sorted[0].position_map[&tail], [0.0, 2.5, -3.0]);
        assert_eq!(sorted[0].from_rotation_map[&head], [10.0, 0.0, 0.0]);
        assert_eq!(sorted[0].progression.points().len(), 3);

        // Second baseline is the pose at the end of the first keyframe
        assert_eq!(sorted[1].from_rotation_map[&head], [40.0, 0.0, 0.0]);
        assert_eq!(sorted[1].from_position_map[&tail], [0.0, 2.5, -3.0]);
        assert!(!sorted[1].rotation_map.contains_key(&tail));
    }

    #[test]
    fn test_deltas_are_against_rest_pose() {
        let mut rig = rig();
        let mut timeline = sample_timeline(&mut rig);
        let bytes = encode(&mut timeline, &rig).unwrap();

        let mut reader = Cursor::new(&bytes[..]);
        assert_eq!(reader.read_u32::<BE>().unwrap(), DCA_VERSION);
        assert_eq!(reader.read_u32::<BE>().unwrap(), 2);
        assert_eq!(reader.read_f64::<BE>().unwrap(), 0.0);
        assert_eq!(reader.read_f64::<BE>().unwrap(), 5.0);
        assert_eq!(reader.read_u32::<BE>().unwrap(), 1);
        assert_eq!(read_string(&mut reader).unwrap(), "head");
        // 40 target - 10 rest
        assert_relative_eq!(reader.read_f64::<BE>().unwrap(), 30.0);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let rig = rig();
        let mut bytes = Vec::new();
        bytes.write_u32::<BE>(99).unwrap();
        bytes.write_u32::<BE>(0).unwrap();

        assert!(matches!(decode(&bytes, &rig), Err(AnimationError::MalformedFile(_))));
        bytes[3] = 0;
        assert!(matches!(decode(&bytes, &rig), Err(AnimationError::MalformedFile(_))));
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let mut rig = rig();
        let mut timeline = sample_timeline(&mut rig);
        let bytes = encode(&mut timeline, &rig).unwrap();

        for len in [0, 3, 8, 20, bytes.len() - 1] {
            let result = decode(&bytes[..len], &rig);
            assert!(matches!(result, Err(AnimationError::MalformedFile(_))), "len {len}");
        }

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(decode(&longer, &rig).is_err());
    }

    #[test]
    fn test_unknown_part_rejected() {
        let mut rig = rig();
        let mut timeline = sample_timeline(&mut rig);
        let bytes = encode(&mut timeline, &rig).unwrap();

        let other = Rig::new("other")
            .with_part("tail", [0.0; 3], [0.0; 3])
            .unwrap();
        assert!(matches!(decode(&bytes, &other), Err(AnimationError::MalformedFile(_))));
    }

    #[test]
    fn test_decode_version_two_uses_linear_curve() {
        let rig = rig();
        let mut bytes = Vec::new();
        bytes.write_u32::<BE>(2).unwrap();
        bytes.write_u32::<BE>(1).unwrap();
        bytes.write_f64::<BE>(1.0).unwrap();
        bytes.write_f64::<BE>(4.0).unwrap();
        bytes.write_u32::<BE>(0).unwrap();
        bytes.write_u32::<BE>(1).unwrap();
        bytes.write_u32::<BE>(3).unwrap();
        bytes.extend_from_slice(b"jaw");
        for delta in [0.0, -0.5, 0.0] {
            bytes.write_f64::<BE>(delta).unwrap();
        }

        let mut decoded = decode(&bytes, &rig).unwrap();
        let jaw = rig.resolve_part("jaw").unwrap();
        let kf = decoded.sorted_keyframes()[0];
        assert_eq!(kf.position_map[&jaw], [0.0, -0.5, 1.0]);
        assert_eq!(kf.progression, ProgressionCurve::linear());
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let rig = rig();
        let mut bytes = Vec::new();
        bytes.write_u32::<BE>(1).unwrap();
        bytes.write_u32::<BE>(1).unwrap();
        bytes.write_f64::<BE>(0.0).unwrap();
        bytes.write_f64::<BE>(0.0).unwrap();
        bytes.write_u32::<BE>(0).unwrap();
        assert!(matches!(decode(&bytes, &rig), Err(AnimationError::MalformedFile(_))));
    }
}
