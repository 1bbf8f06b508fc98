//! Entity hierarchy stored in a slotmap arena
//!
//! Each entity owns a shared model, a [`Transform`] and a local-space
//! [`BoundingVolume`] generated once from the model's vertices. Ownership runs
//! downward through child id lists; the upward link is a plain parent id.
//!
//! Transform mutation goes through the graph so that every ancestor of a
//! changed entity is flagged as having a dirty descendant. The lazy update can
//! then skip clean subtrees without missing a dirty grandchild.

use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::assets::Model;
use crate::foundation::math::{Mat4Ext, Vec3};
use crate::render::RenderBackend;

use super::bounds::{Aabb, BoundingKind, BoundingVolume};
use super::error::SceneError;
use super::frustum::Frustum;
use super::transform::Transform;

new_key_type! {
    /// Stable handle to an entity in a [`SceneGraph`]
    pub struct EntityId;
}

/// Visible and visited entity counts from one draw traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCounters {
    /// Entities that passed the frustum test and were drawn
    pub displayed: u32,
    /// Entities visited
    pub total: u32,
}

impl DrawCounters {
    /// Zero both counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Entities skipped by culling
    pub fn culled(&self) -> u32 {
        self.total - self.displayed
    }
}

#[derive(Debug, Clone)]
struct Entity {
    model: Arc<Model>,
    transform: Transform,
    bounds: BoundingVolume,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    /// Some descendant has a dirty transform
    dirty_descendant: bool,
}

/// Arena-backed scene graph
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    entities: SlotMap<EntityId, Entity>,
    roots: Vec<EntityId>,
}

impl SceneGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root entity bounded by an AABB
    pub fn spawn(&mut self, model: Arc<Model>) -> Result<EntityId, SceneError> {
        self.spawn_with(model, BoundingKind::Aabb)
    }

    /// Create a root entity with the requested bounding volume
    pub fn spawn_with(&mut self, model: Arc<Model>, kind: BoundingKind) -> Result<EntityId, SceneError> {
        let entity = Self::build_entity(model, kind, None)?;
        let id = self.entities.insert(entity);
        self.roots.push(id);
        log::trace!("Spawned root entity {:?}", id);
        Ok(id)
    }

    /// Create an entity owned by `parent`, bounded by an AABB
    pub fn add_child(&mut self, parent: EntityId, model: Arc<Model>) -> Result<EntityId, SceneError> {
        self.add_child_with(parent, model, BoundingKind::Aabb)
    }

    /// Create an entity owned by `parent` with the requested bounding volume
    pub fn add_child_with(
        &mut self,
        parent: EntityId,
        model: Arc<Model>,
        kind: BoundingKind,
    ) -> Result<EntityId, SceneError> {
        if !self.entities.contains_key(parent) {
            return Err(SceneError::UnknownEntity(parent));
        }
        let entity = Self::build_entity(model, kind, Some(parent))?;
        let id = self.entities.insert(entity);
        if let Some(node) = self.entities.get_mut(parent) {
            node.children.push(id);
        }
        // The new child starts dirty
        self.mark_ancestors(id);
        log::trace!("Spawned entity {:?} under {:?}", id, parent);
        Ok(id)
    }

    fn build_entity(model: Arc<Model>, kind: BoundingKind, parent: Option<EntityId>) -> Result<Entity, SceneError> {
        let bounds =
            BoundingVolume::from_points(kind, model.vertex_positions()).map_err(|source| SceneError::Geometry {
                model: model.name().to_string(),
                source,
            })?;
        Ok(Entity {
            model,
            transform: Transform::new(),
            bounds,
            parent,
            children: Vec::new(),
            dirty_descendant: false,
        })
    }

    /// Remove an entity and its whole subtree, returning how many were removed
    pub fn despawn(&mut self, id: EntityId) -> Result<usize, SceneError> {
        let parent = self.node(id)?.parent;
        match parent.and_then(|parent| self.entities.get_mut(parent)) {
            Some(parent_node) => parent_node.children.retain(|&child| child != id),
            None => self.roots.retain(|&root| root != id),
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entity) = self.entities.remove(current) {
                stack.extend(entity.children);
                removed += 1;
            }
        }
        log::trace!("Despawned {:?} and {} descendant(s)", id, removed - 1);
        Ok(removed)
    }

    fn node(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.entities.get(id).ok_or(SceneError::UnknownEntity(id))
    }

    fn node_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.entities.get_mut(id).ok_or(SceneError::UnknownEntity(id))
    }

    /// Flag every ancestor of `id` as having a dirty descendant
    fn mark_ancestors(&mut self, id: EntityId) {
        let mut current = self.entities.get(id).and_then(|node| node.parent);
        while let Some(ancestor) = current {
            let Some(node) = self.entities.get_mut(ancestor) else {
                break;
            };
            if node.dirty_descendant {
                // Everything above is already flagged
                break;
            }
            node.dirty_descendant = true;
            current = node.parent;
        }
    }

    fn mutate_transform(&mut self, id: EntityId, f: impl FnOnce(&mut Transform)) -> Result<(), SceneError> {
        f(&mut self.node_mut(id)?.transform);
        self.mark_ancestors(id);
        Ok(())
    }

    /// Set local position
    pub fn set_local_position(&mut self, id: EntityId, position: Vec3) -> Result<(), SceneError> {
        self.mutate_transform(id, |t| t.set_local_position(position))
    }

    /// Set local Euler rotation in degrees
    pub fn set_local_rotation(&mut self, id: EntityId, euler_degrees: Vec3) -> Result<(), SceneError> {
        self.mutate_transform(id, |t| t.set_local_rotation(euler_degrees))
    }

    /// Set local scale
    pub fn set_local_scale(&mut self, id: EntityId, scale: Vec3) -> Result<(), SceneError> {
        self.mutate_transform(id, |t| t.set_local_scale(scale))
    }

    /// Set local position and a uniform scale
    pub fn loc_and_scale(&mut self, id: EntityId, position: Vec3, uniform_scale: f32) -> Result<(), SceneError> {
        self.mutate_transform(id, |t| t.loc_and_scale(position, uniform_scale))
    }

    /// Lazy update: recompute dirty entities of the subtree, skip clean branches
    ///
    /// Assumes the ancestors of `id` are up to date.
    pub fn update_self_and_child(&mut self, id: EntityId) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        if node.transform.is_dirty() {
            return self.force_update_self_and_child(id);
        }
        if !node.dirty_descendant {
            return Ok(());
        }
        node.dirty_descendant = false;
        let children = node.children.clone();
        for child in children {
            self.update_self_and_child(child)?;
        }
        Ok(())
    }

    /// Lazy update from every root
    pub fn update_all(&mut self) {
        for root in self.roots.clone() {
            // Roots come from the arena itself, so they always resolve
            let result = self.update_self_and_child(root);
            debug_assert!(result.is_ok(), "stale root {root:?}");
        }
    }

    /// Recompute the global matrix of `id` and of every descendant
    pub fn force_update_self_and_child(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.node(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let parent_matrix = self
                .entities
                .get(current)
                .and_then(|node| node.parent)
                .and_then(|parent| self.entities.get(parent))
                .map(|parent| *parent.transform.model_matrix());

            let Some(node) = self.entities.get_mut(current) else {
                continue;
            };
            match parent_matrix {
                Some(parent) => node.transform.compute_model_matrix_with_parent(&parent),
                None => node.transform.compute_model_matrix(),
            }
            node.dirty_descendant = false;
            // Pre-order: parents are computed before their children
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Cull-and-draw traversal in pre-order
    ///
    /// Every entity is visited and counted; only those whose bounding volume
    /// touches the frustum are drawn. Children are visited even when their
    /// parent is culled.
    pub fn draw_self_and_child(
        &self,
        id: EntityId,
        frustum: &Frustum,
        backend: &mut dyn RenderBackend,
        counters: &mut DrawCounters,
    ) -> Result<(), SceneError> {
        self.node(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.entities.get(current) else {
                continue;
            };
            debug_assert!(!node.transform.is_dirty(), "drawing {current:?} with a stale matrix");

            if node.bounds.is_on_frustum(frustum, &node.transform) {
                backend.draw_model(node.model.handle(), &node.transform.model_matrix().to_raw())?;
                counters.displayed += 1;
            } else {
                log::trace!("Culled {:?} ({})", current, node.model.name());
            }
            counters.total += 1;
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Entities whose bounding volume touches the frustum, in pre-order
    pub fn visible_entities(&self, frustum: &Frustum) -> Vec<EntityId> {
        let mut visible = Vec::new();
        let mut stack: Vec<EntityId> = self.roots.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let Some(node) = self.entities.get(current) else {
                continue;
            };
            if node.bounds.is_on_frustum(frustum, &node.transform) {
                visible.push(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        visible
    }

    /// World-space box around the entity, rebuilt from its current matrix
    pub fn global_aabb(&self, id: EntityId) -> Result<Aabb, SceneError> {
        let node = self.node(id)?;
        Ok(node.bounds.local_aabb().to_global(&node.transform))
    }

    /// Parent id, `None` for a root
    pub fn parent(&self, id: EntityId) -> Result<Option<EntityId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    /// Child ids in insertion order
    pub fn children(&self, id: EntityId) -> Result<&[EntityId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    /// Root ids in insertion order
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Transform of an entity
    pub fn transform(&self, id: EntityId) -> Result<&Transform, SceneError> {
        Ok(&self.node(id)?.transform)
    }

    /// Local-space bounding volume
    pub fn bounding_volume(&self, id: EntityId) -> Result<&BoundingVolume, SceneError> {
        Ok(&self.node(id)?.bounds)
    }

    /// Model drawn for the entity
    pub fn model(&self, id: EntityId) -> Result<&Arc<Model>, SceneError> {
        Ok(&self.node(id)?.model)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether the id refers to a live entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MeshSource, ModelHandle};
    use crate::foundation::math::{utils, RawMat4};
    use crate::render::{BackendResult, RenderError};
    use crate::scene::error::GeometryError;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn cube(handle: u64) -> Arc<Model> {
        let source = MeshSource::cuboid(Vec3::new(1.0, 1.0, 1.0));
        Arc::new(Model::from_meshes(ModelHandle(handle), format!("cube{handle}"), vec![source]).unwrap())
    }

    fn frustum() -> Frustum {
        Frustum::from_basis(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::x(),
            Vec3::y(),
            1.0,
            utils::deg_to_rad(90.0),
            0.1,
            10.0,
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingBackend {
        drawn: Vec<ModelHandle>,
        fail_on: Option<ModelHandle>,
    }

    impl RenderBackend for RecordingBackend {
        fn begin_frame(&mut self, _view: &RawMat4, _projection: &RawMat4) -> BackendResult<()> {
            Ok(())
        }

        fn draw_model(&mut self, model: ModelHandle, _model_matrix: &RawMat4) -> BackendResult<()> {
            if self.fail_on == Some(model) {
                return Err(RenderError::UnknownModel(model));
            }
            self.drawn.push(model);
            Ok(())
        }

        fn upload_bone_matrices(&mut self, _model: ModelHandle, _matrices: &[RawMat4]) -> BackendResult<()> {
            Ok(())
        }

        fn end_frame(&mut self) -> BackendResult<()> {
            Ok(())
        }
    }

    /// root -> child -> grandchild, each offset along +X
    fn chain(scene: &mut SceneGraph) -> (EntityId, EntityId, EntityId) {
        let root = scene.spawn(cube(1)).unwrap();
        let child = scene.add_child(root, cube(2)).unwrap();
        let grandchild = scene.add_child(child, cube(3)).unwrap();
        scene.set_local_position(root, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.set_local_position(child, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        scene.set_local_scale(child, Vec3::new(2.0, 2.0, 2.0)).unwrap();
        scene.set_local_position(grandchild, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        (root, child, grandchild)
    }

    #[test]
    fn test_force_update_composes_parent_matrices() {
        let mut scene = SceneGraph::new();
        let (root, child, grandchild) = chain(&mut scene);
        scene.set_local_rotation(child, Vec3::new(0.0, 30.0, 10.0)).unwrap();
        scene.force_update_self_and_child(root).unwrap();

        let root_t = scene.transform(root).unwrap();
        let child_t = scene.transform(child).unwrap();
        let grand_t = scene.transform(grandchild).unwrap();

        assert_relative_eq!(*root_t.model_matrix(), root_t.local_model_matrix(), epsilon = EPSILON);
        assert_relative_eq!(
            *child_t.model_matrix(),
            root_t.model_matrix() * child_t.local_model_matrix(),
            epsilon = EPSILON
        );
        assert_relative_eq!(
            *grand_t.model_matrix(),
            child_t.model_matrix() * grand_t.local_model_matrix(),
            epsilon = EPSILON
        );
        assert!(!root_t.is_dirty() && !child_t.is_dirty() && !grand_t.is_dirty());
    }

    #[test]
    fn test_lazy_update_reaches_dirty_grandchild_under_clean_parents() {
        let mut scene = SceneGraph::new();
        let (root, child, grandchild) = chain(&mut scene);
        scene.update_all();
        assert_relative_eq!(
            scene.transform(grandchild).unwrap().global_position(),
            Vec3::new(1.0 + 2.0 + 6.0, 0.0, 0.0),
            epsilon = EPSILON
        );

        // Only the grandchild changes; root and child stay clean
        scene.set_local_position(grandchild, Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(!scene.transform(root).unwrap().is_dirty());
        assert!(!scene.transform(child).unwrap().is_dirty());

        scene.update_self_and_child(root).unwrap();
        assert!(!scene.transform(grandchild).unwrap().is_dirty());
        assert_relative_eq!(
            scene.transform(grandchild).unwrap().global_position(),
            Vec3::new(3.0, 2.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_lazy_update_skips_clean_subtree() {
        let mut scene = SceneGraph::new();
        let (root, _, grandchild) = chain(&mut scene);
        scene.update_all();
        let before = *scene.transform(grandchild).unwrap().model_matrix();

        scene.update_self_and_child(root).unwrap();
        assert_eq!(*scene.transform(grandchild).unwrap().model_matrix(), before);
    }

    #[test]
    fn test_dirty_parent_refreshes_children() {
        let mut scene = SceneGraph::new();
        let (root, _, grandchild) = chain(&mut scene);
        scene.update_all();

        scene.set_local_position(root, Vec3::new(-1.0, 0.0, 0.0)).unwrap();
        scene.update_all();
        assert_relative_eq!(
            scene.transform(grandchild).unwrap().global_position(),
            Vec3::new(-1.0 + 2.0 + 6.0, 0.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_draw_counts_every_entity_and_draws_visible_ones() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn(cube(1)).unwrap();
        let hidden = scene.add_child(root, cube(2)).unwrap();
        let visible_grandchild = scene.add_child(hidden, cube(3)).unwrap();
        scene.set_local_position(root, Vec3::new(0.0, 0.0, -5.0)).unwrap();
        // Behind the camera
        scene.set_local_position(hidden, Vec3::new(0.0, 0.0, 20.0)).unwrap();
        // Back in front, despite the culled parent
        scene.set_local_position(visible_grandchild, Vec3::new(0.0, 0.0, -20.0)).unwrap();
        scene.update_all();

        let mut backend = RecordingBackend::default();
        let mut counters = DrawCounters::default();
        scene.draw_self_and_child(root, &frustum(), &mut backend, &mut counters).unwrap();

        assert_eq!(counters, DrawCounters { displayed: 2, total: 3 });
        assert_eq!(counters.culled(), 1);
        assert_eq!(backend.drawn, vec![ModelHandle(1), ModelHandle(3)]);
        assert_eq!(scene.visible_entities(&frustum()), vec![root, visible_grandchild]);
    }

    #[test]
    fn test_draw_surfaces_backend_errors() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn(cube(9)).unwrap();
        scene.set_local_position(root, Vec3::new(0.0, 0.0, -5.0)).unwrap();
        scene.update_all();

        let mut backend = RecordingBackend {
            fail_on: Some(ModelHandle(9)),
            ..RecordingBackend::default()
        };
        let result = scene.draw_self_and_child(root, &frustum(), &mut backend, &mut DrawCounters::default());
        assert_eq!(result, Err(SceneError::Render(RenderError::UnknownModel(ModelHandle(9)))));
    }

    #[test]
    fn test_global_aabb_follows_transform() {
        let mut scene = SceneGraph::new();
        let (_, child, _) = chain(&mut scene);
        scene.update_all();

        let aabb = scene.global_aabb(child).unwrap();
        assert_relative_eq!(aabb.center, Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(aabb.extents, Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_despawn_removes_subtree() {
        let mut scene = SceneGraph::new();
        let (root, child, grandchild) = chain(&mut scene);
        let sibling = scene.add_child(root, cube(4)).unwrap();
        assert_eq!(scene.len(), 4);

        assert_eq!(scene.despawn(child).unwrap(), 2);
        assert_eq!(scene.len(), 2);
        assert!(!scene.contains(grandchild));
        assert_eq!(scene.children(root).unwrap(), &[sibling]);
        assert_eq!(scene.transform(child), Err(SceneError::UnknownEntity(child)));

        assert_eq!(scene.despawn(root).unwrap(), 2);
        assert!(scene.is_empty());
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn test_links_and_errors() {
        let mut scene = SceneGraph::new();
        let (root, child, _) = chain(&mut scene);
        assert_eq!(scene.parent(child).unwrap(), Some(root));
        assert_eq!(scene.parent(root).unwrap(), None);
        assert_eq!(scene.roots(), &[root]);
        assert_eq!(scene.model(child).unwrap().handle(), ModelHandle(2));
        assert_eq!(scene.bounding_volume(root).unwrap().kind(), BoundingKind::Aabb);

        scene.despawn(root).unwrap();
        assert_eq!(scene.add_child(root, cube(5)), Err(SceneError::UnknownEntity(root)));
    }

    #[test]
    fn test_model_without_vertices_is_rejected() {
        let empty = Arc::new(
            Model::from_meshes(ModelHandle(8), "hollow", vec![MeshSource::new(Vec::new(), Vec::new())]).unwrap(),
        );
        let mut scene = SceneGraph::new();
        assert_eq!(
            scene.spawn_with(empty, BoundingKind::Sphere),
            Err(SceneError::Geometry {
                model: "hollow".to_string(),
                source: GeometryError::EmptyPointSet,
            })
        );
    }
}
