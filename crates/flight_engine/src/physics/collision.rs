//! Axis-aligned overlap tests between scene entities
//!
//! Both boxes are rebuilt in world space from the entities' current model
//! matrices, so the graph must be updated before testing.

use crate::foundation::math::Vec3;
use crate::scene::{Aabb, EntityId, SceneError, SceneGraph};

/// Per-axis gap between two boxes: `|c_a - c_b| - (e_a + e_b) / 2`
///
/// A positive component is a separating axis.
pub fn aabb_separation(a: &Aabb, b: &Aabb) -> Vec3 {
    (a.center - b.center).abs() - (a.extents + b.extents) * 0.5
}

/// Overlap unless some axis shows a strictly positive gap
///
/// A gap of exactly zero counts as touching.
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    !aabb_separation(a, b).iter().any(|&gap| gap > 0.0)
}

/// Whether the global boxes of two entities overlap
pub fn check_collision(scene: &SceneGraph, a: EntityId, b: EntityId) -> Result<bool, SceneError> {
    let box_a = scene.global_aabb(a)?;
    let box_b = scene.global_aabb(b)?;
    Ok(aabb_overlap(&box_a, &box_b))
}

/// Candidates whose global box overlaps the subject's, in input order
pub fn colliding_entities(
    scene: &SceneGraph,
    subject: EntityId,
    candidates: impl IntoIterator<Item = EntityId>,
) -> Result<Vec<EntityId>, SceneError> {
    let subject_box = scene.global_aabb(subject)?;
    let mut hits = Vec::new();
    for candidate in candidates {
        if candidate == subject {
            continue;
        }
        if aabb_overlap(&subject_box, &scene.global_aabb(candidate)?) {
            hits.push(candidate);
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MeshSource, Model, ModelHandle};
    use std::sync::Arc;

    fn unit_box(center: Vec3) -> Aabb {
        Aabb::new(center, Vec3::new(1.0, 1.0, 1.0))
    }

    fn scene_with(positions: &[Vec3]) -> (SceneGraph, Vec<EntityId>) {
        let model = Arc::new(
            Model::from_meshes(ModelHandle(1), "cube", vec![MeshSource::cuboid(Vec3::new(1.0, 1.0, 1.0))]).unwrap(),
        );
        let mut scene = SceneGraph::new();
        let ids = positions
            .iter()
            .map(|&position| {
                let id = scene.spawn(Arc::clone(&model)).unwrap();
                scene.set_local_position(id, position).unwrap();
                id
            })
            .collect();
        scene.update_all();
        (scene, ids)
    }

    #[test]
    fn test_separated_on_x_then_touching() {
        let (mut scene, ids) = scene_with(&[Vec3::zeros(), Vec3::new(1.5, 0.0, 0.0)]);
        // Gap 1.5 - 1.0 = 0.5
        assert!(!check_collision(&scene, ids[0], ids[1]).unwrap());

        scene.set_local_position(ids[1], Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.update_all();
        // Gap exactly zero is a collision
        assert!(check_collision(&scene, ids[0], ids[1]).unwrap());
    }

    #[test]
    fn test_collision_is_symmetric() {
        let cases = [
            (unit_box(Vec3::zeros()), unit_box(Vec3::new(0.5, 0.9, -0.3))),
            (unit_box(Vec3::zeros()), unit_box(Vec3::new(0.0, 3.0, 0.0))),
            (Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.5, 0.5)), unit_box(Vec3::zeros())),
        ];
        for (a, b) in &cases {
            assert_eq!(aabb_overlap(a, b), aabb_overlap(b, a));
        }

        let (scene, ids) = scene_with(&[Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0)]);
        assert_eq!(
            check_collision(&scene, ids[0], ids[1]).unwrap(),
            check_collision(&scene, ids[1], ids[0]).unwrap()
        );
    }

    #[test]
    fn test_identical_centers_always_collide() {
        let center = Vec3::new(3.0, -2.0, 7.0);
        let tiny = Aabb::new(center, Vec3::new(0.001, 0.001, 0.001));
        let huge = Aabb::new(center, Vec3::new(100.0, 0.5, 20.0));
        assert!(aabb_overlap(&tiny, &huge));
        assert!(aabb_overlap(&tiny, &tiny));
    }

    #[test]
    fn test_any_positive_axis_separates() {
        let a = unit_box(Vec3::zeros());
        assert!(!aabb_overlap(&a, &unit_box(Vec3::new(0.0, 0.0, -1.01))));
        assert!(aabb_overlap(&a, &unit_box(Vec3::new(0.2, -0.99, 0.4))));
    }

    #[test]
    fn test_colliding_entities_filters_candidates() {
        let (scene, ids) = scene_with(&[
            Vec3::zeros(),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, -0.8, 0.0),
        ]);
        let hits = colliding_entities(&scene, ids[0], ids.iter().copied()).unwrap();
        assert_eq!(hits, vec![ids[1], ids[3]]);
    }
}
