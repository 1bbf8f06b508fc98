//! Local TRS transform with a cached, dirty-flag gated model matrix
//!
//! The cached matrix is the entity's *global* matrix once the scene graph has
//! propagated it: `parent_global * local`. Setters only touch local state and
//! mark the transform dirty; the matrix is rebuilt by the `compute_*` calls.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Local position, Euler rotation (degrees) and scale plus the cached matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    /// Euler angles in degrees, applied Y then X then Z
    euler_rotation: Vec3,
    scale: Vec3,
    model_matrix: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            euler_rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            model_matrix: Mat4::identity(),
            dirty: true,
        }
    }
}

impl Transform {
    /// Identity transform, dirty until first computed
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_local_position(position);
        self
    }

    /// Builder pattern: set local Euler rotation in degrees
    pub fn with_rotation(mut self, euler_degrees: Vec3) -> Self {
        self.set_local_rotation(euler_degrees);
        self
    }

    /// Builder pattern: set local scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_local_scale(scale);
        self
    }

    /// `T(pos) * R_y * R_x * R_z * S(scale)`
    pub fn local_model_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * Mat4::euler_yxz_degrees(&self.euler_rotation)
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Recompute as a root: global matrix equals the local matrix
    pub fn compute_model_matrix(&mut self) {
        self.model_matrix = self.local_model_matrix();
        self.dirty = false;
    }

    /// Recompute as a child of `parent_global`
    pub fn compute_model_matrix_with_parent(&mut self, parent_global: &Mat4) {
        self.model_matrix = parent_global * self.local_model_matrix();
        self.dirty = false;
    }

    /// Set local position and mark dirty
    pub fn set_local_position(&mut self, position: Vec3) {
        debug_assert!(position.iter().all(|c| c.is_finite()), "non-finite position {position:?}");
        self.position = position;
        self.dirty = true;
    }

    /// Set local Euler rotation in degrees and mark dirty
    pub fn set_local_rotation(&mut self, euler_degrees: Vec3) {
        debug_assert!(euler_degrees.iter().all(|c| c.is_finite()), "non-finite rotation {euler_degrees:?}");
        self.euler_rotation = euler_degrees;
        self.dirty = true;
    }

    /// Set local scale and mark dirty
    pub fn set_local_scale(&mut self, scale: Vec3) {
        debug_assert!(scale.iter().all(|c| c.is_finite()), "non-finite scale {scale:?}");
        self.scale = scale;
        self.dirty = true;
    }

    /// Set position and a uniform scale in one go
    pub fn loc_and_scale(&mut self, position: Vec3, uniform_scale: f32) {
        self.set_local_position(position);
        self.set_local_scale(Vec3::new(uniform_scale, uniform_scale, uniform_scale));
    }

    /// Local position
    pub fn local_position(&self) -> Vec3 {
        self.position
    }

    /// Local Euler rotation in degrees
    pub fn local_rotation(&self) -> Vec3 {
        self.euler_rotation
    }

    /// Local scale
    pub fn local_scale(&self) -> Vec3 {
        self.scale
    }

    /// Cached model matrix (global once propagated)
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    /// Translation column of the model matrix
    pub fn global_position(&self) -> Vec3 {
        self.model_matrix.column3(3)
    }

    /// First basis column (+X)
    pub fn right(&self) -> Vec3 {
        self.model_matrix.column3(0)
    }

    /// Second basis column (+Y)
    pub fn up(&self) -> Vec3 {
        self.model_matrix.column3(1)
    }

    /// Third basis column (+Z)
    pub fn backward(&self) -> Vec3 {
        self.model_matrix.column3(2)
    }

    /// Negated third basis column (-Z)
    pub fn forward(&self) -> Vec3 {
        -self.model_matrix.column3(2)
    }

    /// Lengths of the three basis columns
    pub fn global_scale(&self) -> Vec3 {
        Vec3::new(self.right().norm(), self.up().norm(), self.backward().norm())
    }

    /// Whether local state changed since the matrix was last computed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
