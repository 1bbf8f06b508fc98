//! Bone registry shared by model loading and animation clips

use std::collections::HashMap;

use crate::foundation::math::Mat4;

/// Dense id and inverse bind matrix of one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfo {
    /// Slot in the final bone matrix array
    pub id: usize,
    /// Inverse bind pose: model space to bone space
    pub offset: Mat4,
}

/// Bone name to [`BoneInfo`] map with ids handed out in first-encounter order
#[derive(Debug, Clone, Default)]
pub struct BoneInfoMap {
    bones: HashMap<String, BoneInfo>,
}

impl BoneInfoMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bone, returning its id
    ///
    /// A name seen before keeps its id and its first offset.
    pub fn register(&mut self, name: &str, offset: Mat4) -> usize {
        if let Some(info) = self.bones.get(name) {
            return info.id;
        }
        let id = self.bones.len();
        self.bones.insert(name.to_string(), BoneInfo { id, offset });
        id
    }

    /// Look up a bone by name
    pub fn get(&self, name: &str) -> Option<&BoneInfo> {
        self.bones.get(name)
    }

    /// Whether the bone is registered
    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    /// Number of registered bones, which is also the next free id
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether no bone was registered
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Iterate over `(name, info)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoneInfo)> {
        self.bones.iter().map(|(name, info)| (name.as_str(), info))
    }
}
