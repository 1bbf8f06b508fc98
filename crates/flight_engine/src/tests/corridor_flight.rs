//! Corridor scene driven through the engine: hierarchy, culling and track contact

use std::sync::Arc;

use approx::assert_relative_eq;

use crate::assets::{MeshSource, Model, ModelHandle};
use crate::core::EngineConfig;
use crate::foundation::math::{RawMat4, Vec3};
use crate::game::{FrameInput, GameState, InputActions};
use crate::render::{BackendResult, RenderBackend};
use crate::scene::EntityId;
use crate::Engine;

#[derive(Default)]
struct FrameLog {
    draws: Vec<ModelHandle>,
    frames: usize,
}

impl RenderBackend for FrameLog {
    fn begin_frame(&mut self, _view: &RawMat4, _projection: &RawMat4) -> BackendResult<()> {
        self.draws.clear();
        Ok(())
    }

    fn draw_model(&mut self, model: ModelHandle, _model_matrix: &RawMat4) -> BackendResult<()> {
        self.draws.push(model);
        Ok(())
    }

    fn upload_bone_matrices(&mut self, _model: ModelHandle, _matrices: &[RawMat4]) -> BackendResult<()> {
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.frames += 1;
        Ok(())
    }
}

const MARKER: ModelHandle = ModelHandle(1);
const SEGMENT: ModelHandle = ModelHandle(2);
const BIRD: ModelHandle = ModelHandle(3);

fn cube(handle: ModelHandle, name: &str, half: f32) -> Arc<Model> {
    let source = MeshSource::cuboid(Vec3::new(half, half, half));
    Arc::new(Model::from_meshes(handle, name, vec![source]).unwrap())
}

/// Marker root at the origin with five segments every 5 units down -Z
fn corridor(engine: &mut Engine) -> (EntityId, Vec<EntityId>) {
    let segment = cube(SEGMENT, "segment", 2.0);
    let scene = engine.scene_mut();
    let root = scene.spawn(cube(MARKER, "marker", 0.5)).unwrap();
    let segments = (0..5u8)
        .map(|i| {
            let id = scene.add_child(root, Arc::clone(&segment)).unwrap();
            scene.set_local_position(id, Vec3::new(0.0, 0.0, -5.0 * f32::from(i))).unwrap();
            id
        })
        .collect();
    (root, segments)
}

#[test]
fn test_far_segments_are_culled() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    corridor(&mut engine);
    engine.finish_loading();

    let mut backend = FrameLog::default();
    let report = engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();

    // Camera at z = 3 looking down -Z with the far plane at z = -7
    assert_eq!(report.counters.total, 6);
    assert_eq!(report.counters.displayed, 3);
    assert_eq!(backend.draws, vec![MARKER, SEGMENT, SEGMENT]);
}

#[test]
fn test_moving_the_root_moves_every_segment() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let (root, segments) = corridor(&mut engine);
    engine.finish_loading();
    let mut backend = FrameLog::default();
    engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();

    engine.scene_mut().set_local_position(root, Vec3::new(0.0, 0.0, 20.0)).unwrap();
    let report = engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();

    // Only the last segment is back in front of the camera
    let last = engine.scene().transform(segments[4]).unwrap().global_position();
    assert_relative_eq!(last, Vec3::zeros(), epsilon = 1e-6);
    assert_eq!(report.counters.displayed, 1);
    assert_eq!(backend.draws, vec![SEGMENT]);
}

#[test]
fn test_flying_out_of_the_corridor() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let (_, segments) = corridor(&mut engine);
    for &segment in &segments {
        engine.add_track(segment).unwrap();
    }
    let bird = engine.scene_mut().spawn(cube(BIRD, "bird", 1.0)).unwrap();
    engine.set_player(bird).unwrap();
    engine.finish_loading();

    let mut backend = FrameLog::default();
    let report = engine.tick(0.016, &FrameInput::from_actions(InputActions::ENTER), &mut backend).unwrap();
    assert_eq!(report.state, GameState::Active);
    assert!(report.collided);
    assert_eq!(report.score, 1);

    // Right by 20 * 0.2 = 4 leaves the segment, the wall pushes back left
    let report = engine.tick(0.2, &FrameInput::from_actions(InputActions::MOVE_RIGHT), &mut backend).unwrap();
    assert!(!report.collided);
    assert_eq!(report.health, 2);
    assert_eq!(report.score, 1);
    assert!(engine.context().camera.position.x < 0.0);

    let report = engine.tick(0.016, &FrameInput::from_actions(InputActions::PAUSE), &mut backend).unwrap();
    assert_eq!(report.state, GameState::Paused);
    assert_eq!(backend.frames, 3);
}
