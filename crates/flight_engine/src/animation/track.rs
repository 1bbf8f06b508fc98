//! Keyframe tracks and per-bone channels
//!
//! Keys are kept sorted by time. Sampling finds the bracketing pair with a
//! binary search, then blends: linear for vectors, shortest-arc slerp for
//! rotations. Times before the first key or after the last clamp to that key.

use crate::foundation::math::{utils, Mat4, Pose, Quat, Vec3};

use super::AnimationError;

/// Blend between two keyframe values
pub trait Interpolate: Clone {
    /// Value at fraction `t` in `[0, 1]` from `self` to `other`
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        utils::lerp_vec3(self, other, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        utils::slerp_shortest(self, other, t)
    }
}

/// A value at a point in clip time (ticks)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    /// Clip time in ticks
    pub time: f32,
    /// Sampled value
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a keyframe
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Position key
pub type KeyPosition = Keyframe<Vec3>;
/// Rotation key
pub type KeyRotation = Keyframe<Quat>;
/// Scale key
pub type KeyScale = Keyframe<Vec3>;

/// Time-sorted list of keyframes for one property
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T: Interpolate> Track<T> {
    /// Build a track, rejecting non-finite or out-of-order key times
    pub fn new(keys: Vec<Keyframe<T>>) -> Result<Self, AnimationError> {
        if keys.iter().any(|key| !key.time.is_finite()) {
            return Err(AnimationError::InvalidKeyTime);
        }
        if keys.windows(2).any(|pair| pair[1].time < pair[0].time) {
            return Err(AnimationError::UnsortedKeys);
        }
        Ok(Self { keys })
    }

    /// Keyframes in time order
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Whether the track has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the last key at or before `time`, `None` when empty
    pub fn key_index(&self, time: f32) -> Option<usize> {
        if self.keys.is_empty() {
            return None;
        }
        // First key strictly after `time`, minus one
        let after = self.keys.partition_point(|key| key.time <= time);
        Some(after.saturating_sub(1))
    }

    /// Value at `time`, or `fallback` for an empty track
    pub fn sample(&self, time: f32, fallback: T) -> T {
        let Some(index) = self.key_index(time) else {
            return fallback;
        };
        let current = &self.keys[index];
        let Some(next) = self.keys.get(index + 1) else {
            return current.value.clone();
        };

        let span = next.time - current.time;
        let factor = if span > 0.0 { (time - current.time) / span } else { 0.0 };
        if factor <= 0.0 {
            // Exactly on a key, or before the first one
            return current.value.clone();
        }
        current.value.interpolate(&next.value, factor.min(1.0))
    }
}

/// Position, rotation and scale tracks that drive one named node
#[derive(Debug, Clone, PartialEq)]
pub struct BoneChannel {
    name: String,
    positions: Track<Vec3>,
    rotations: Track<Quat>,
    scales: Track<Vec3>,
}

impl BoneChannel {
    /// Channel with no keys; every sample is the node's bind pose
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: Track::default(),
            rotations: Track::default(),
            scales: Track::default(),
        }
    }

    /// Builder pattern: position keys
    pub fn with_positions(mut self, keys: Vec<KeyPosition>) -> Result<Self, AnimationError> {
        self.positions = Track::new(keys).map_err(|e| e.in_channel(&self.name))?;
        Ok(self)
    }

    /// Builder pattern: rotation keys
    pub fn with_rotations(mut self, keys: Vec<KeyRotation>) -> Result<Self, AnimationError> {
        self.rotations = Track::new(keys).map_err(|e| e.in_channel(&self.name))?;
        Ok(self)
    }

    /// Builder pattern: scale keys
    pub fn with_scales(mut self, keys: Vec<KeyScale>) -> Result<Self, AnimationError> {
        self.scales = Track::new(keys).map_err(|e| e.in_channel(&self.name))?;
        Ok(self)
    }

    /// Name of the node this channel animates
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position track
    pub fn positions(&self) -> &Track<Vec3> {
        &self.positions
    }

    /// Rotation track
    pub fn rotations(&self) -> &Track<Quat> {
        &self.rotations
    }

    /// Scale track
    pub fn scales(&self) -> &Track<Vec3> {
        &self.scales
    }

    /// Sample all three tracks; a track without keys keeps the `bind` component
    pub fn sample_pose(&self, time: f32, bind: &Pose) -> Pose {
        Pose {
            position: self.positions.sample(time, bind.position),
            rotation: self.rotations.sample(time, bind.rotation),
            scale: self.scales.sample(time, bind.scale),
        }
    }

    /// Local transform `T * R * S` at `time`
    pub fn local_transform(&self, time: f32, bind: &Pose) -> Mat4 {
        self.sample_pose(time, bind).to_matrix()
    }
}
