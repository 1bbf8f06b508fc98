//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the handful of helpers the scene and
//! animation code share. All matrices are column-major, right-handed, Y-up.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, Unit, UnitQuaternion, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Column-major matrix as handed to GPU-facing code
pub type RawMat4 = [[f32; 4]; 4];

/// Translation, rotation and scale sampled from an animation channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation component
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Pose {
    /// Identity pose
    pub fn identity() -> Self {
        Self::default()
    }

    /// Convert to a `T * R * S` matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Split a `T * R * S` matrix back into its parts
    ///
    /// Shear is dropped. A collapsed basis column leaves the rotation at identity.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = matrix.column3(3);
        let columns = [matrix.column3(0), matrix.column3(1), matrix.column3(2)];
        let scale = Vec3::new(columns[0].norm(), columns[1].norm(), columns[2].norm());

        let rotation = if scale.iter().all(|s| *s > constants::DEGENERATE_LENGTH) {
            let basis = Mat3::from_columns(&[columns[0] / scale.x, columns[1] / scale.y, columns[2] / scale.z]);
            Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
        } else {
            Quat::identity()
        };
        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Length below which a direction vector is treated as degenerate
    pub const DEGENERATE_LENGTH: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise linear interpolation
    pub fn lerp_vec3(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Spherical interpolation along the shortest arc.
    ///
    /// `b` is negated when the two rotations lie in opposite hemispheres so the
    /// blend never takes the long way round. Nearly parallel inputs fall back
    /// to normalized lerp.
    pub fn slerp_shortest(a: &Quat, b: &Quat, t: f32) -> Quat {
        let b = if a.coords.dot(&b.coords) < 0.0 {
            Quat::new_unchecked(-b.into_inner())
        } else {
            *b
        };

        a.try_slerp(&b, t, 1.0e-6).unwrap_or_else(|| a.nlerp(&b, t))
    }

    /// Whether every component of the vector is finite
    pub fn is_finite(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Rotation from Euler angles in degrees, applied as `R_y * R_x * R_z`
    fn euler_yxz_degrees(euler: &Vec3) -> Mat4;

    /// Create a perspective projection matrix (OpenGL clip conventions)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// First three components of a column
    fn column3(&self, index: usize) -> Vec3;

    /// Transform a point (w = 1) and drop the homogeneous component
    fn transform_point3(&self, point: &Vec3) -> Vec3;

    /// Column-major raw array for GPU-facing code
    fn to_raw(&self) -> RawMat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn euler_yxz_degrees(euler: &Vec3) -> Mat4 {
        Self::rotation_y(utils::deg_to_rad(euler.y))
            * Self::rotation_x(utils::deg_to_rad(euler.x))
            * Self::rotation_z(utils::deg_to_rad(euler.z))
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn column3(&self, index: usize) -> Vec3 {
        self.fixed_view::<3, 1>(0, index).into_owned()
    }

    fn transform_point3(&self, point: &Vec3) -> Vec3 {
        self.transform_point(&Point3::from(*point)).coords
    }

    fn to_raw(&self) -> RawMat4 {
        (*self).into()
    }
}
