//! Skeletal animation: bone registry, keyframe tracks, clips and playback
//!
//! Data flows one way. The model registers its bones, a clip binds keyframe
//! channels to the model's node hierarchy, and an [`Animator`] samples the
//! clip every frame into a flat array of skinning matrices indexed by bone id.

pub mod animator;
pub mod clip;
pub mod skeleton;
pub mod track;

pub use animator::{Animator, AnimatorState};
pub use clip::{Animation, AnimationNode};
pub use skeleton::{BoneInfo, BoneInfoMap};
pub use track::{BoneChannel, Interpolate, KeyPosition, KeyRotation, KeyScale, Keyframe, Track};

use thiserror::Error;

/// Errors raised while building tracks and clips
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Keyframe time is NaN or infinite
    #[error("Keyframe time is not finite")]
    InvalidKeyTime,

    /// Keyframes are not in ascending time order
    #[error("Keyframes are not sorted by time")]
    UnsortedKeys,

    /// A track of the named channel was rejected
    #[error("Channel '{channel}': {source}")]
    BadChannel {
        /// Channel name
        channel: String,
        /// Track failure
        #[source]
        source: Box<AnimationError>,
    },

    /// A bone the model skins against has no node in the clip hierarchy
    #[error("Clip '{clip}' has no node for bone '{bone}'")]
    MissingBone {
        /// Clip name
        clip: String,
        /// Bone name
        bone: String,
    },

    /// Clip length is zero, negative or not finite
    #[error("Clip '{clip}' has invalid duration {duration}")]
    InvalidDuration {
        /// Clip name
        clip: String,
        /// Duration in ticks
        duration: f32,
    },

    /// More bones than the skinning shader has slots for
    #[error("Clip '{clip}' needs {count} bones, limit is {max}")]
    TooManyBones {
        /// Clip name
        clip: String,
        /// Bones needed
        count: usize,
        /// Configured limit
        max: usize,
    },
}

impl AnimationError {
    /// Attach the channel name to a track error
    pub fn in_channel(self, channel: &str) -> Self {
        Self::BadChannel {
            channel: channel.to_string(),
            source: Box::new(self),
        }
    }
}
