//! Procedural corridor world: track segments, rocks and the bird
//!
//! Stands in for the asset import pipeline. Everything is built from
//! cuboids so the demo runs without any files on disk.

use std::sync::Arc;

use flight_engine::animation::{Animation, AnimationNode, BoneChannel, Keyframe};
use flight_engine::assets::{BoneInfluence, MeshSource, Model, ModelHandle, VertexWeight};
use flight_engine::core::AnimationConfig;
use flight_engine::foundation::math::{Mat4, Quat, Vec3};
use flight_engine::scene::{BoundingKind, EntityId, SceneGraph};
use flight_engine::EngineError;
use rand::Rng;

/// Backend handle of the corridor marker
pub const CORRIDOR: ModelHandle = ModelHandle(1);
/// Backend handle of a track segment
pub const SEGMENT: ModelHandle = ModelHandle(2);
/// Backend handle of a rock
pub const ROCK: ModelHandle = ModelHandle(3);
/// Backend handle of the bird
pub const BIRD: ModelHandle = ModelHandle(4);

/// Number of track segments
pub const SEGMENT_COUNT: u16 = 12;
/// Distance between segment centers along -Z
pub const SEGMENT_SPACING: f32 = 4.0;

/// Entities the application registers with the engine
pub struct CorridorWorld {
    /// Corridor root
    pub corridor: EntityId,
    /// Segments the bird must stay inside
    pub segments: Vec<EntityId>,
    /// Decoration outside the track
    pub rocks: Vec<EntityId>,
    /// Player entity
    pub bird: EntityId,
    /// Wing flap clip bound to the bird
    pub flap: Arc<Animation>,
}

fn cuboid_model(handle: ModelHandle, name: &str, half_extents: Vec3) -> Result<Arc<Model>, EngineError> {
    Ok(Arc::new(Model::from_meshes(handle, name, vec![MeshSource::cuboid(half_extents)])?))
}

/// Build the corridor, scatter `rock_count` rocks and spawn the bird
pub fn build(
    scene: &mut SceneGraph,
    rng: &mut impl Rng,
    rock_count: usize,
    animation: &AnimationConfig,
) -> Result<CorridorWorld, EngineError> {
    let marker = cuboid_model(CORRIDOR, "corridor", Vec3::new(0.25, 0.25, 0.25))?;
    let segment = cuboid_model(SEGMENT, "segment", Vec3::new(2.0, 2.0, SEGMENT_SPACING * 0.5))?;
    let rock = cuboid_model(ROCK, "rock", Vec3::new(0.5, 0.5, 0.5))?;

    let corridor = scene.spawn(marker)?;
    let mut segments = Vec::with_capacity(usize::from(SEGMENT_COUNT));
    for i in 0..SEGMENT_COUNT {
        let id = scene.add_child(corridor, Arc::clone(&segment))?;
        scene.set_local_position(id, Vec3::new(0.0, -1.0, -SEGMENT_SPACING * f32::from(i)))?;
        segments.push(id);
    }

    let depth = SEGMENT_SPACING * f32::from(SEGMENT_COUNT);
    let mut rocks = Vec::with_capacity(rock_count);
    for _ in 0..rock_count {
        let side: f32 = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        let position = Vec3::new(
            side * rng.gen_range(4.0_f32..9.0),
            rng.gen_range(-3.0..3.0),
            -rng.gen_range(0.0..depth),
        );
        let id = scene.add_child_with(corridor, Arc::clone(&rock), BoundingKind::Sphere)?;
        scene.set_local_position(id, position)?;
        scene.set_local_rotation(id, Vec3::new(0.0, rng.gen_range(0.0..360.0), 0.0))?;
        scene.set_local_scale(id, Vec3::repeat(rng.gen_range(0.5..2.0)))?;
        rocks.push(id);
    }

    let bird_model = Arc::new(bird_model()?);
    let flap = Arc::new(flap_clip(&bird_model, animation)?);
    let bird = scene.spawn(bird_model)?;

    log::info!(
        "Corridor built: {} segments, {} rocks, {} entities",
        segments.len(),
        rocks.len(),
        scene.len()
    );
    Ok(CorridorWorld {
        corridor,
        segments,
        rocks,
        bird,
        flap,
    })
}

/// Body plus two wings, each wing skinning the outer vertices of its side
fn bird_model() -> Result<Model, EngineError> {
    let body = MeshSource::cuboid(Vec3::new(1.0, 0.6, 2.0)).with_bone(BoneInfluence {
        name: "body".to_string(),
        offset: Mat4::identity(),
        weights: (0..8).map(|vertex_id| VertexWeight { vertex_id, weight: 1.0 }).collect(),
    });

    let wing = |name: &str, shoulder_x: f32| {
        let mut source = MeshSource::cuboid(Vec3::new(1.5, 0.1, 0.8));
        for vertex in &mut source.vertices {
            vertex.position[0] += shoulder_x + shoulder_x.signum() * 1.5;
        }
        // Vertices on the shoulder side stay with the body
        let (inner, outer): (Vec<usize>, Vec<usize>) =
            (0..source.vertices.len()).partition(|&i| source.vertices[i].position[0].abs() < shoulder_x.abs() + 1.5);
        source
            .with_bone(BoneInfluence {
                name: "body".to_string(),
                offset: Mat4::identity(),
                weights: inner.into_iter().map(|vertex_id| VertexWeight { vertex_id, weight: 1.0 }).collect(),
            })
            .with_bone(BoneInfluence {
                name: name.to_string(),
                offset: Mat4::new_translation(&Vec3::new(-shoulder_x, 0.0, 0.0)),
                weights: outer.into_iter().map(|vertex_id| VertexWeight { vertex_id, weight: 1.0 }).collect(),
            })
    };

    Ok(Model::from_meshes(
        BIRD,
        "bird",
        vec![body, wing("wing.L", -1.0), wing("wing.R", 1.0)],
    )?)
}

/// One full wing beat over 24 ticks
fn flap_clip(model: &Model, config: &AnimationConfig) -> Result<Animation, EngineError> {
    let shoulder = |x: f32| Mat4::new_translation(&Vec3::new(x, 0.0, 0.0));
    let root = AnimationNode::new("Armature", Mat4::identity()).with_child(
        AnimationNode::new("body", Mat4::identity())
            .with_child(AnimationNode::new("wing.L", shoulder(-1.0)))
            .with_child(AnimationNode::new("wing.R", shoulder(1.0))),
    );

    // Wings only rotate; the shoulder offset comes from the hierarchy
    let wing = |name: &str, sign: f32| -> Result<BoneChannel, EngineError> {
        let stroke = |angle: f32| Quat::from_axis_angle(&Vec3::z_axis(), sign * angle);
        Ok(BoneChannel::new(name).with_rotations(vec![
            Keyframe::new(0.0, stroke(0.5)),
            Keyframe::new(12.0, stroke(-0.7)),
            Keyframe::new(24.0, stroke(0.5)),
        ])?)
    };
    let body = BoneChannel::new("body").with_positions(vec![
        Keyframe::new(0.0, Vec3::zeros()),
        Keyframe::new(12.0, Vec3::new(0.0, 0.2, 0.0)),
        Keyframe::new(24.0, Vec3::zeros()),
    ])?;

    let channels = vec![body, wing("wing.L", -1.0)?, wing("wing.R", 1.0)?];
    Ok(Animation::new("flap", 24.0, 24.0, root, channels, model, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_world_layout() {
        let mut scene = SceneGraph::new();
        let mut rng = StdRng::seed_from_u64(7);
        let world = build(&mut scene, &mut rng, 10, &AnimationConfig::default()).unwrap();

        assert_eq!(world.segments.len(), usize::from(SEGMENT_COUNT));
        assert_eq!(world.rocks.len(), 10);
        assert_eq!(scene.len(), 1 + usize::from(SEGMENT_COUNT) + 10 + 1);
        assert_eq!(scene.children(world.corridor).unwrap().len(), usize::from(SEGMENT_COUNT) + 10);
        assert_eq!(world.flap.bone_count(), 3);
    }
}
