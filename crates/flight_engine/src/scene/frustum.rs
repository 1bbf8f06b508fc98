//! View frustum planes built from camera parameters
//!
//! Planes store an inward-facing unit normal, so a point is inside the frustum
//! when its signed distance to all six planes is non-negative.

use crate::foundation::math::{constants, utils, Vec3};
use crate::render::Camera;

use super::error::GeometryError;

/// Plane defined by a unit normal and its distance from the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::new(0.0, 1.0, 0.0),
            distance: 0.0,
        }
    }
}

impl Plane {
    /// Plane through `point` facing along `normal` (normalized here)
    pub fn new(point: Vec3, normal: Vec3) -> Result<Self, GeometryError> {
        if !utils::is_finite(&point) || !utils::is_finite(&normal) {
            return Err(GeometryError::NonFinite("plane"));
        }
        let normal = normal
            .try_normalize(constants::DEGENERATE_LENGTH)
            .ok_or(GeometryError::DegenerateVector("plane normal"))?;

        Ok(Self {
            normal,
            distance: normal.dot(&point),
        })
    }

    /// Unit normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Distance from the origin along the normal
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Signed distance from plane to point (positive on the normal side)
    pub fn signed_distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Six inward-facing planes of a perspective view volume
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frustum {
    /// Top face
    pub top: Plane,
    /// Bottom face
    pub bottom: Plane,
    /// Right face
    pub right: Plane,
    /// Left face
    pub left: Plane,
    /// Far clip face
    pub far: Plane,
    /// Near clip face
    pub near: Plane,
}

impl Frustum {
    /// Build the frustum of `camera` for one frame
    ///
    /// # Arguments
    /// * `aspect` - Viewport width / height
    /// * `fov_y` - Vertical field of view in radians
    /// * `z_near`, `z_far` - Clip distances along the camera front
    pub fn from_camera(
        camera: &Camera,
        aspect: f32,
        fov_y: f32,
        z_near: f32,
        z_far: f32,
    ) -> Result<Self, GeometryError> {
        Self::from_basis(
            camera.position,
            camera.front,
            camera.right,
            camera.up,
            aspect,
            fov_y,
            z_near,
            z_far,
        )
    }

    /// Build a frustum from an explicit eye position and orthonormal basis
    pub fn from_basis(
        position: Vec3,
        front: Vec3,
        right: Vec3,
        up: Vec3,
        aspect: f32,
        fov_y: f32,
        z_near: f32,
        z_far: f32,
    ) -> Result<Self, GeometryError> {
        if !(z_near > 0.0 && z_far > z_near && z_far.is_finite()) {
            return Err(GeometryError::InvalidProjection(format!(
                "clip distances near = {z_near}, far = {z_far}"
            )));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(GeometryError::InvalidProjection(format!("aspect ratio {aspect}")));
        }
        if !(fov_y > 0.0 && fov_y < constants::PI) {
            return Err(GeometryError::InvalidProjection(format!("vertical fov {fov_y} rad")));
        }
        if !utils::is_finite(&position) {
            return Err(GeometryError::NonFinite("camera position"));
        }

        let front = front
            .try_normalize(constants::DEGENERATE_LENGTH)
            .ok_or(GeometryError::DegenerateVector("camera front"))?;
        let right = right
            .try_normalize(constants::DEGENERATE_LENGTH)
            .ok_or(GeometryError::DegenerateVector("camera right"))?;
        let up = up
            .try_normalize(constants::DEGENERATE_LENGTH)
            .ok_or(GeometryError::DegenerateVector("camera up"))?;

        let half_v_side = z_far * (fov_y * 0.5).tan();
        let half_h_side = half_v_side * aspect;
        let front_mult_far = front * z_far;

        Ok(Self {
            near: Plane::new(position + front * z_near, front)?,
            far: Plane::new(position + front_mult_far, -front)?,
            right: Plane::new(position, up.cross(&(front_mult_far + right * half_h_side)))?,
            left: Plane::new(position, (front_mult_far - right * half_h_side).cross(&up))?,
            top: Plane::new(position, (front_mult_far + up * half_v_side).cross(&right))?,
            bottom: Plane::new(position, right.cross(&(front_mult_far - up * half_v_side)))?,
        })
    }

    /// Planes in culling order: left, right, top, bottom, near, far
    pub fn planes(&self) -> [&Plane; 6] {
        [&self.left, &self.right, &self.top, &self.bottom, &self.near, &self.far]
    }

    /// Whether a point lies inside or on the boundary of every plane
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.planes().iter().all(|plane| plane.signed_distance(point) >= 0.0)
    }
}
