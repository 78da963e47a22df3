// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model parts, pose snapshots and the pose provider seam.
//!
//! The engine never touches a scene graph directly. Everything it needs from
//! the loaded model goes through [`PoseProvider`]:
//! - enumerate parts by name
//! - read the rest pose used as the delta baseline
//! - read and write the current local rotation and position
//! - reset every part to rest
//!
//! [`Rig`] is the in-memory implementation used by the editor and by tests.

use crate::error::{AnimationError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three axis values (degrees for rotations, model units for positions)
pub type Vec3 = [f64; 3];

/// Tolerance used when deciding whether two values differ
pub const FUZZY_EPSILON: f64 = 0.001;

/// Whether every axis of `a` is within [`FUZZY_EPSILON`] of `b`
pub fn fuzzy_eq3(a: Vec3, b: Vec3) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= FUZZY_EPSILON)
}

/// Name of a rigid part, validated against a loaded model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartName(String);

impl PartName {
    /// Create a part name. Empty names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AnimationError::UnknownPart(name));
        }
        Ok(Self(name))
    }

    /// The raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rotation and position of one part
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartTransform {
    /// Rotation in degrees (x, y, z)
    pub rotation: Vec3,
    /// Position (x, y, z)
    pub position: Vec3,
}

impl PartTransform {
    /// Create a transform
    pub fn new(rotation: Vec3, position: Vec3) -> Self {
        Self { rotation, position }
    }
}

/// Which half of a part transform an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoseChannel {
    /// Rotation in degrees
    Rotation,
    /// Position
    Position,
}

impl PoseChannel {
    /// Read this channel from a transform
    pub fn read(self, transform: &PartTransform) -> Vec3 {
        match self {
            Self::Rotation => transform.rotation,
            Self::Position => transform.position,
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::Position => "position",
        }
    }
}

/// Pose of every part at one instant, in model order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSnapshot {
    parts: IndexMap<PartName, PartTransform>,
}

impl PoseSnapshot {
    /// Transform of a part
    pub fn get(&self, part: &PartName) -> Option<&PartTransform> {
        self.parts.get(part)
    }

    /// Transform of a part by raw name
    pub fn get_by_name(&self, name: &str) -> Option<&PartTransform> {
        self.parts.iter().find(|(p, _)| p.as_str() == name).map(|(_, t)| t)
    }

    /// All parts in model order
    pub fn iter(&self) -> impl Iterator<Item = (&PartName, &PartTransform)> {
        self.parts.iter()
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl FromIterator<(PartName, PartTransform)> for PoseSnapshot {
    fn from_iter<I: IntoIterator<Item = (PartName, PartTransform)>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

/// Access to the parts of a loaded model
pub trait PoseProvider {
    /// Every part, in model order
    fn part_names(&self) -> Vec<PartName>;

    /// Rest pose of a part
    fn rest(&self, part: &PartName) -> Option<PartTransform>;

    /// Current local pose of a part
    fn current(&self, part: &PartName) -> Option<PartTransform>;

    /// Set the current rotation of a part (degrees)
    fn set_rotation(&mut self, part: &PartName, rotation: Vec3);

    /// Set the current position of a part
    fn set_position(&mut self, part: &PartName, position: Vec3);

    /// Put every part back to its rest pose
    fn reset_to_rest(&mut self);

    /// Validate a raw part name against the model
    fn resolve_part(&self, name: &str) -> Result<PartName> {
        let part = PartName::new(name)?;
        if self.rest(&part).is_some() {
            Ok(part)
        } else {
            Err(AnimationError::UnknownPart(name.to_string()))
        }
    }

    /// Current pose of every part
    fn snapshot(&self) -> PoseSnapshot {
        self.part_names()
            .into_iter()
            .filter_map(|part| self.current(&part).map(|t| (part, t)))
            .collect()
    }

    /// Write one channel of a part
    fn set_channel(&mut self, part: &PartName, channel: PoseChannel, value: Vec3) {
        match channel {
            PoseChannel::Rotation => self.set_rotation(part, value),
            PoseChannel::Position => self.set_position(part, value),
        }
    }
}

/// One part of a [`Rig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigPart {
    /// Rest pose from the source model
    pub rest: PartTransform,
    /// Current pose
    pub current: PartTransform,
}

/// In-memory model: named rigid parts with rest and current pose
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rig {
    /// Model name
    pub name: String,
    parts: IndexMap<PartName, RigPart>,
}

impl Rig {
    /// Create an empty rig
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: IndexMap::new(),
        }
    }

    /// Add a part at rest. Duplicate names are rejected.
    pub fn add_part(&mut self, name: &str, rest: PartTransform) -> Result<PartName> {
        let part = PartName::new(name)?;
        if self.parts.contains_key(&part) {
            return Err(AnimationError::invalid(format!("duplicate part '{name}'")));
        }
        self.parts.insert(part.clone(), RigPart { rest, current: rest });
        Ok(part)
    }

    /// Builder form of [`Rig::add_part`]
    pub fn with_part(mut self, name: &str, rotation: Vec3, position: Vec3) -> Result<Self> {
        self.add_part(name, PartTransform::new(rotation, position))?;
        Ok(self)
    }

    /// Build a rig from a description (usually loaded from RON)
    pub fn from_description(description: &RigDescription) -> Result<Self> {
        let mut rig = Self::new(description.name.clone());
        for part in &description.parts {
            rig.add_part(&part.name, PartTransform::new(part.rotation, part.position))?;
        }
        Ok(rig)
    }

    /// A rig at rest with the same parts and rest pose as `provider`
    pub fn at_rest_of(provider: &dyn PoseProvider) -> Self {
        let mut rig = Self::new("scratch");
        for part in provider.part_names() {
            if let Some(rest) = provider.rest(&part) {
                rig.parts.insert(part, RigPart { rest, current: rest });
            }
        }
        rig
    }

    /// Number of parts
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

impl PoseProvider for Rig {
    fn part_names(&self) -> Vec<PartName> {
        self.parts.keys().cloned().collect()
    }

    fn rest(&self, part: &PartName) -> Option<PartTransform> {
        self.parts.get(part).map(|p| p.rest)
    }

    fn current(&self, part: &PartName) -> Option<PartTransform> {
        self.parts.get(part).map(|p| p.current)
    }

    fn set_rotation(&mut self, part: &PartName, rotation: Vec3) {
        if let Some(p) = self.parts.get_mut(part) {
            p.current.rotation = rotation;
        }
    }

    fn set_position(&mut self, part: &PartName, position: Vec3) {
        if let Some(p) = self.parts.get_mut(part) {
            p.current.position = position;
        }
    }

    fn reset_to_rest(&mut self) {
        for p in self.parts.values_mut() {
            p.current = p.rest;
        }
    }
}

/// Serializable model description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigDescription {
    /// Model name
    pub name: String,
    /// Parts in model order
    pub parts: Vec<PartDescription>,
}

/// Serializable rest pose of one part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDescription {
    /// Unique part name
    pub name: String,
    /// Rest rotation in degrees
    #[serde(default)]
    pub rotation: Vec3,
    /// Rest position
    #[serde(default)]
    pub position: Vec3,
}
