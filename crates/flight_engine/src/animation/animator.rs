//! Clip playback producing the per-frame skinning matrices

use std::sync::Arc;

use crate::foundation::math::Mat4;

use super::clip::Animation;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimatorState {
    /// No clip bound, matrices hold their last values
    #[default]
    Idle,
    /// Clip bound and looping
    Playing,
}

/// Loops one clip and exposes the resulting bone matrices
#[derive(Debug, Clone, Default)]
pub struct Animator {
    clip: Option<Arc<Animation>>,
    current_time: f32,
    final_bone_matrices: Vec<Mat4>,
    globals: Vec<Mat4>,
}

impl Animator {
    /// Idle animator with no matrices
    pub fn new() -> Self {
        Self::default()
    }

    /// Animator already playing `clip` from time zero
    pub fn with_clip(clip: Arc<Animation>) -> Self {
        let mut animator = Self::new();
        animator.play(clip);
        animator
    }

    /// Bind `clip`, rewind to zero and evaluate the first pose
    pub fn play(&mut self, clip: Arc<Animation>) {
        log::debug!("Animator: playing '{}' ({} bones)", clip.name(), clip.bone_count());
        self.final_bone_matrices = vec![Mat4::identity(); clip.bone_count()];
        self.current_time = 0.0;
        self.clip = Some(clip);
        self.evaluate();
    }

    /// Unbind the clip; the last pose stays in the output
    pub fn stop(&mut self) {
        self.clip = None;
        self.current_time = 0.0;
    }

    /// Advance by `delta_time` seconds, wrap at the clip length, re-evaluate
    pub fn update(&mut self, delta_time: f32) {
        let Some(clip) = &self.clip else {
            return;
        };
        if !delta_time.is_finite() {
            log::warn!("Animator: ignoring non-finite delta {delta_time}");
            return;
        }
        let time = (self.current_time + clip.ticks_per_second() * delta_time).rem_euclid(clip.duration());
        // rem_euclid rounds tiny negative sums up to the divisor itself
        self.current_time = if time < clip.duration() { time } else { 0.0 };
        self.evaluate();
    }

    fn evaluate(&mut self) {
        if let Some(clip) = &self.clip {
            clip.evaluate(self.current_time, &mut self.globals, &mut self.final_bone_matrices);
        }
    }

    /// Playback state
    pub fn state(&self) -> AnimatorState {
        if self.clip.is_some() {
            AnimatorState::Playing
        } else {
            AnimatorState::Idle
        }
    }

    /// Bound clip
    pub fn clip(&self) -> Option<&Arc<Animation>> {
        self.clip.as_ref()
    }

    /// Clip time in ticks, always in `[0, duration)`
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Skinning matrices indexed by bone id
    pub fn final_bone_matrices(&self) -> &[Mat4] {
        &self.final_bone_matrices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationNode, BoneChannel, Keyframe};
    use crate::assets::{BoneInfluence, MeshSource, Model, ModelHandle, VertexWeight};
    use crate::core::AnimationConfig;
    use crate::foundation::math::{Quat, Vec3};
    use approx::assert_relative_eq;

    fn offset(x: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(-x, 0.0, 0.0))
    }

    fn model() -> Model {
        let source = MeshSource::cuboid(Vec3::new(1.0, 1.0, 1.0))
            .with_bone(BoneInfluence {
                name: "body".to_string(),
                offset: offset(0.0),
                weights: vec![VertexWeight { vertex_id: 0, weight: 1.0 }],
            })
            .with_bone(BoneInfluence {
                name: "wing".to_string(),
                offset: offset(2.0),
                weights: vec![VertexWeight { vertex_id: 1, weight: 1.0 }],
            });
        Model::from_meshes(ModelHandle(1), "bird", vec![source]).unwrap()
    }

    fn body_bind() -> Mat4 {
        Mat4::new_translation(&Vec3::new(0.0, 1.0, 0.0))
    }

    fn wing_bind() -> Mat4 {
        Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0))
    }

    /// Wing rotates a half turn about X over 10 ticks at 10 ticks/s
    fn flap() -> Arc<Animation> {
        let root = AnimationNode::new("Scene", Mat4::identity()).with_child(
            AnimationNode::new("body", body_bind()).with_child(AnimationNode::new("wing", wing_bind())),
        );
        let wing = BoneChannel::new("wing")
            .with_positions(vec![Keyframe::new(0.0, Vec3::new(2.0, 0.0, 0.0))])
            .unwrap()
            .with_rotations(vec![
                Keyframe::new(0.0, Quat::identity()),
                Keyframe::new(10.0, Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2)),
            ])
            .unwrap();
        let clip = Animation::new("flap", 10.0, 10.0, root, vec![wing], &model(), &AnimationConfig::default());
        Arc::new(clip.unwrap())
    }

    #[test]
    fn test_idle_until_played() {
        let mut animator = Animator::new();
        assert_eq!(animator.state(), AnimatorState::Idle);
        animator.update(1.0);
        assert!(animator.final_bone_matrices().is_empty());

        animator.play(flap());
        assert_eq!(animator.state(), AnimatorState::Playing);
        assert_eq!(animator.final_bone_matrices().len(), 2);

        animator.stop();
        assert_eq!(animator.state(), AnimatorState::Idle);
        assert_eq!(animator.final_bone_matrices().len(), 2);
    }

    #[test]
    fn test_time_zero_is_bind_pose_times_offset() {
        let animator = Animator::with_clip(flap());
        let matrices = animator.final_bone_matrices();

        assert_relative_eq!(matrices[0], body_bind() * offset(0.0), epsilon = 1e-6);
        assert_relative_eq!(matrices[1], body_bind() * wing_bind() * offset(2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_time_wraps_at_duration() {
        let mut animator = Animator::with_clip(flap());
        animator.update(0.4);
        assert_relative_eq!(animator.current_time(), 4.0, epsilon = 1e-5);
        animator.update(0.8);
        assert_relative_eq!(animator.current_time(), 2.0, epsilon = 1e-4);
        assert!(animator.current_time() < flap().duration());
    }

    #[test]
    fn test_channel_drives_child_bone() {
        let mut animator = Animator::with_clip(flap());
        animator.update(0.5);

        let expected = body_bind()
            * Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0))
            * Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_4).to_homogeneous()
            * offset(2.0);
        assert_relative_eq!(animator.final_bone_matrices()[1], expected, epsilon = 1e-5);
        // Body has no channel and keeps its bind transform
        assert_relative_eq!(animator.final_bone_matrices()[0], body_bind() * offset(0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_time_stays_below_duration() {
        let mut animator = Animator::with_clip(flap());
        // A tiny negative step would round up to the clip length
        animator.update(-1.0e-9);
        assert!(animator.current_time() >= 0.0);
        assert!(animator.current_time() < flap().duration());

        animator.update(0.3);
        let before = animator.current_time();
        animator.update(f32::NAN);
        assert_eq!(animator.current_time(), before);
        assert!(animator.final_bone_matrices().iter().all(|m| m.iter().all(|c| c.is_finite())));
    }
}
