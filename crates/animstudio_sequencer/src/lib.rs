// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe timeline and interpolation engine for Animation Studio.
//!
//! This crate provides the animation core:
//! - Named rigid parts and the pose provider seam
//! - Keyframes with per-part targets and progression curves
//! - Timeline playback, scrubbing and looping
//! - The `.dca` binary codec
//! - Baked snapshot and procedure export
//!
//! ## Architecture
//!
//! The engine is built on:
//! - Insertion-ordered maps keyed by validated part names
//! - Derived state (sort order, total time) held as `Clean | Dirty`
//! - Pose writes through [`PoseProvider`], never a scene graph

pub mod codec;
pub mod derived;
pub mod error;
pub mod export;
pub mod keyframe;
pub mod pose;
pub mod progression;
pub mod timeline;

pub use codec::{decode, encode, DCA_EXTENSION, DCA_VERSION};
pub use derived::Derived;
pub use error::{AnimationError, Result};
pub use export::{bake, BakedAnimation, BakedEvent, ProcedureExporter};
pub use keyframe::{Interpolation, Keyframe, KeyframeId, DEFAULT_KEYFRAME_DURATION};
pub use pose::{
    fuzzy_eq3, PartDescription, PartName, PartTransform, PoseChannel, PoseProvider, PoseSnapshot,
    Rig, RigDescription, RigPart, Vec3, FUZZY_EPSILON,
};
pub use progression::{PointId, ProgressionCurve, ProgressionPoint, SortState};
pub use timeline::{PlaybackClock, Timeline, TimelineIndex};
