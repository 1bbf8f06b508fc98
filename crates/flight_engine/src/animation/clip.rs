//! Animation clips: a node hierarchy plus per-node keyframe channels

use std::collections::{HashMap, HashSet};

use crate::assets::Model;
use crate::core::AnimationConfig;
use crate::foundation::math::{Mat4, Pose};

use super::skeleton::BoneInfoMap;
use super::track::BoneChannel;
use super::AnimationError;

/// Node of the imported scene hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationNode {
    /// Node name, matched against bone and channel names
    pub name: String,
    /// Bind-relative local transform, used for the node itself when no
    /// channel drives it and per component when a channel leaves one unkeyed
    pub transformation: Mat4,
    /// Child nodes
    pub children: Vec<AnimationNode>,
}

impl AnimationNode {
    /// Leaf node
    pub fn new(name: impl Into<String>, transformation: Mat4) -> Self {
        Self {
            name: name.into(),
            transformation,
            children: Vec::new(),
        }
    }

    /// Builder pattern: append a child
    pub fn with_child(mut self, child: AnimationNode) -> Self {
        self.children.push(child);
        self
    }

    fn collect_names<'a>(&'a self, names: &mut HashSet<&'a str>) {
        names.insert(&self.name);
        for child in &self.children {
            child.collect_names(names);
        }
    }
}

/// Hierarchy node flattened in pre-order, with its lookups resolved once
#[derive(Debug, Clone)]
pub(crate) struct ResolvedNode {
    pub(crate) parent: Option<usize>,
    pub(crate) transformation: Mat4,
    /// `transformation` split up, for channels that leave a component unkeyed
    pub(crate) bind: Pose,
    pub(crate) channel: Option<usize>,
    /// Bone slot and inverse bind matrix
    pub(crate) bone: Option<(usize, Mat4)>,
}

/// Immutable clip shared by every animator that plays it
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    duration: f32,
    ticks_per_second: f32,
    root: AnimationNode,
    channels: Vec<BoneChannel>,
    bone_info: BoneInfoMap,
    nodes: Vec<ResolvedNode>,
}

impl Animation {
    /// Bind a clip to the model whose bones it drives
    ///
    /// Channels naming bones the model never registered get fresh ids after
    /// the model's own. Every model bone must exist as a hierarchy node.
    ///
    /// # Arguments
    /// * `duration` - Clip length in ticks
    /// * `ticks_per_second` - Playback rate; `0` selects the configured default
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        ticks_per_second: f32,
        root: AnimationNode,
        channels: Vec<BoneChannel>,
        model: &Model,
        config: &AnimationConfig,
    ) -> Result<Self, AnimationError> {
        let name = name.into();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(AnimationError::InvalidDuration { clip: name, duration });
        }
        let ticks_per_second = if ticks_per_second > 0.0 && ticks_per_second.is_finite() {
            ticks_per_second
        } else {
            config.default_ticks_per_second
        };

        let mut bone_info = model.bone_info().clone();
        for channel in &channels {
            if !bone_info.contains(channel.name()) {
                let id = bone_info.register(channel.name(), Mat4::identity());
                log::debug!("Clip '{}': channel '{}' added as bone {}", name, channel.name(), id);
            }
        }
        if bone_info.len() > config.max_bones {
            return Err(AnimationError::TooManyBones {
                clip: name,
                count: bone_info.len(),
                max: config.max_bones,
            });
        }

        let mut node_names = HashSet::new();
        root.collect_names(&mut node_names);
        let mut missing: Vec<&str> = model
            .bone_info()
            .iter()
            .map(|(bone, _)| bone)
            .filter(|bone| !node_names.contains(bone))
            .collect();
        missing.sort_unstable();
        if let Some(bone) = missing.first() {
            return Err(AnimationError::MissingBone {
                clip: name,
                bone: (*bone).to_string(),
            });
        }

        let nodes = Self::flatten(&root, &channels, &bone_info);
        log::info!(
            "Clip '{}': {} ticks at {} ticks/s, {} nodes, {} bones",
            name,
            duration,
            ticks_per_second,
            nodes.len(),
            bone_info.len()
        );

        Ok(Self {
            name,
            duration,
            ticks_per_second,
            root,
            channels,
            bone_info,
            nodes,
        })
    }

    fn flatten(root: &AnimationNode, channels: &[BoneChannel], bone_info: &BoneInfoMap) -> Vec<ResolvedNode> {
        let channel_index: HashMap<&str, usize> = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| (channel.name(), index))
            .collect();

        let mut nodes = Vec::new();
        let mut stack: Vec<(&AnimationNode, Option<usize>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(ResolvedNode {
                parent,
                transformation: node.transformation,
                bind: Pose::from_matrix(&node.transformation),
                channel: channel_index.get(node.name.as_str()).copied(),
                bone: bone_info.get(&node.name).map(|info| (info.id, info.offset)),
            });
            // Reversed so the first child is visited first
            stack.extend(node.children.iter().rev().map(|child| (child, Some(index))));
        }
        nodes
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in ticks
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Playback rate
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    /// Root of the node hierarchy
    pub fn root(&self) -> &AnimationNode {
        &self.root
    }

    /// Keyframe channels
    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    /// Channel driving the named node
    pub fn find_channel(&self, name: &str) -> Option<&BoneChannel> {
        self.channels.iter().find(|channel| channel.name() == name)
    }

    /// Bones of the model plus any added by channels
    pub fn bone_info(&self) -> &BoneInfoMap {
        &self.bone_info
    }

    /// Length of the final bone matrix array
    pub fn bone_count(&self) -> usize {
        self.bone_info.len()
    }

    #[cfg(test)]
    pub(crate) fn resolved_nodes(&self) -> &[ResolvedNode] {
        &self.nodes
    }

    /// Write `global * offset` for every bone at clip time `time` (ticks)
    ///
    /// `globals` is scratch space reused across calls.
    pub(crate) fn evaluate(&self, time: f32, globals: &mut Vec<Mat4>, out: &mut [Mat4]) {
        globals.clear();
        for node in &self.nodes {
            let local = match node.channel {
                Some(channel) => self.channels[channel].local_transform(time, &node.bind),
                None => node.transformation,
            };
            // Pre-order: a parent always precedes its children
            let global = match node.parent {
                Some(parent) => globals[parent] * local,
                None => local,
            };
            if let Some((id, offset)) = node.bone {
                debug_assert!(id < out.len(), "bone id {id} outside {} slots", out.len());
                if let Some(slot) = out.get_mut(id) {
                    *slot = global * offset;
                }
            }
            globals.push(global);
        }
    }
}
