//! # Fly Camera
//!
//! Euler-angle camera driven by keyboard and mouse deltas.
//!
//! ## Design Principles
//! - **Plain data**: every field is public so the input step and the frustum
//!   builder can read the basis directly
//! - **Derived basis**: `front`, `right` and `up` are recomputed from yaw and
//!   pitch after every rotation, so they stay orthonormal
//! - **Degrees at the edges**: yaw, pitch and zoom are stored in degrees;
//!   conversion to radians happens when a matrix is built

use crate::core::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Default yaw, looking down -Z
pub const DEFAULT_YAW: f32 = -90.0;
/// Default pitch, level with the horizon
pub const DEFAULT_PITCH: f32 = 0.0;
/// Narrowest field of view reachable by scrolling
pub const MIN_ZOOM: f32 = 1.0;
/// Widest field of view reachable by scrolling
pub const MAX_ZOOM: f32 = 45.0;
/// Pitch limit that keeps the view from flipping over the pole
pub const PITCH_LIMIT: f32 = 89.0;

/// Direction of a keyboard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    /// Along `front`
    Forward,
    /// Against `front`
    Backward,
    /// Against `right`
    Left,
    /// Along `right`
    Right,
    /// Along `up`
    Up,
    /// Against `up`
    Down,
}

impl CameraMovement {
    /// The step that undoes this one
    pub fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Perspective fly camera
///
/// # Coordinate System
/// Right-handed, Y-up. With the default yaw of -90 degrees the camera looks
/// down -Z with +X to its right.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// Unit view direction
    pub front: Vec3,
    /// Unit camera up, orthogonal to `front` and `right`
    pub up: Vec3,
    /// Unit camera right
    pub right: Vec3,
    /// World up used to rebuild the basis
    pub world_up: Vec3,
    /// Heading in degrees
    pub yaw: f32,
    /// Elevation in degrees
    pub pitch: f32,
    /// Units per second for keyboard steps
    pub movement_speed: f32,
    /// Degrees per unit of mouse delta
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::y(), DEFAULT_YAW, DEFAULT_PITCH)
    }
}

impl Camera {
    /// Create a camera at `position` with the given orientation in degrees
    pub fn new(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::new(0.0, 0.0, -1.0),
            up: world_up,
            right: Vec3::x(),
            world_up,
            yaw,
            pitch,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: MAX_ZOOM,
        };
        camera.update_camera_vectors();
        camera
    }

    /// Camera at the configured spawn with the configured input response
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(config.start_position, Vec3::y(), DEFAULT_YAW, DEFAULT_PITCH);
        camera.movement_speed = config.movement_speed;
        camera.mouse_sensitivity = config.mouse_sensitivity;
        camera.zoom = config.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        camera
    }

    /// Camera watching the scene from the configured spy position
    pub fn spy_from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::from_config(config);
        camera.position = config.spy_position;
        camera
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection using `zoom` as the vertical field of view
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective(self.fov_y(), aspect, near, far)
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        utils::deg_to_rad(self.zoom)
    }

    /// Step along one basis vector for `delta_time` seconds
    pub fn process_movement(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let step = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.up,
            CameraMovement::Down => -self.up,
        };
        self.position += step * velocity;
    }

    /// Turn by a mouse delta; pitch is clamped to +/-89 degrees when `constrain_pitch`
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_camera_vectors();
    }

    /// Zoom by a scroll delta, clamped to `[1, 45]` degrees
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn update_camera_vectors(&mut self) {
        let (yaw, pitch) = (utils::deg_to_rad(self.yaw), utils::deg_to_rad(self.pitch));
        let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());

        self.front = front.normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
        debug_assert!(
            approx::relative_eq!(self.front.dot(&self.right), 0.0, epsilon = 1e-4),
            "camera basis lost orthogonality"
        );
    }
}
