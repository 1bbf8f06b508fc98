//! Per-frame player input
//!
//! The window layer polls its devices and hands the frame driver one
//! [`FrameInput`]: the held actions as a flag set plus the mouse deltas.

use crate::foundation::math::Vec2;
use crate::render::{Camera, CameraMovement};

bitflags::bitflags! {
    /// Actions held during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputActions: u32 {
        /// Strafe left
        const MOVE_LEFT = 1 << 0;
        /// Strafe right
        const MOVE_RIGHT = 1 << 1;
        /// Climb
        const MOVE_UP = 1 << 2;
        /// Dive
        const MOVE_DOWN = 1 << 3;
        /// Toggle pause
        const PAUSE = 1 << 4;
        /// Open or leave the menu
        const MENU = 1 << 5;
        /// Confirm, starts a run from the menu or after game over
        const ENTER = 1 << 6;
        /// Ask the window layer to switch fullscreen
        const TOGGLE_FULLSCREEN = 1 << 7;
        /// Close the application
        const QUIT = 1 << 8;
        /// Switch between the player camera and the spy camera
        const TOGGLE_SPY_VIEW = 1 << 9;

        /// Every steering action
        const MOVEMENT = Self::MOVE_LEFT.bits()
            | Self::MOVE_RIGHT.bits()
            | Self::MOVE_UP.bits()
            | Self::MOVE_DOWN.bits();
    }
}

impl InputActions {
    /// Camera steps for the held steering actions, in a fixed order
    pub fn movements(self) -> impl Iterator<Item = CameraMovement> {
        [
            (Self::MOVE_UP, CameraMovement::Up),
            (Self::MOVE_LEFT, CameraMovement::Left),
            (Self::MOVE_DOWN, CameraMovement::Down),
            (Self::MOVE_RIGHT, CameraMovement::Right),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, movement)| movement)
    }
}

/// Everything the window layer collected for one frame
///
/// Steering flags are held for as long as the key is down. The other flags
/// are set only on the frame the key goes down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Held actions
    pub actions: InputActions,
    /// Cursor motion in pixels, y up
    pub mouse_delta: Vec2,
    /// Scroll wheel delta
    pub scroll: f32,
}

impl FrameInput {
    /// Input holding only `actions`
    pub fn from_actions(actions: InputActions) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// Whether `action` is held
    pub fn pressed(&self, action: InputActions) -> bool {
        self.actions.contains(action)
    }

    /// Steer and turn the camera; returns the steps taken this frame
    pub fn apply_to_camera(&self, camera: &mut Camera, delta_time: f32) -> Vec<CameraMovement> {
        let steps: Vec<CameraMovement> = self.actions.movements().collect();
        for &step in &steps {
            camera.process_movement(step, delta_time);
        }
        self.apply_look(camera);
        if self.scroll != 0.0 {
            camera.process_mouse_scroll(self.scroll);
        }
        steps
    }

    /// Turn the camera by the mouse delta only
    pub fn apply_look(&self, camera: &mut Camera) {
        if self.mouse_delta != Vec2::zeros() {
            camera.process_mouse_movement(self.mouse_delta.x, self.mouse_delta.y, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_movements_follow_held_flags() {
        let held = InputActions::MOVE_LEFT | InputActions::MOVE_UP | InputActions::PAUSE;
        let steps: Vec<_> = held.movements().collect();
        assert_eq!(steps, vec![CameraMovement::Up, CameraMovement::Left]);

        assert_eq!(InputActions::PAUSE.movements().count(), 0);
        assert!(InputActions::MOVEMENT.contains(InputActions::MOVE_DOWN));
    }

    #[test]
    fn test_apply_moves_camera_and_reports_steps() {
        let mut camera = Camera::default();
        camera.movement_speed = 1.0;
        let input = FrameInput::from_actions(InputActions::MOVE_RIGHT | InputActions::MOVE_DOWN);

        let steps = input.apply_to_camera(&mut camera, 2.0);
        assert_eq!(steps, vec![CameraMovement::Down, CameraMovement::Right]);
        assert_relative_eq!(camera.position, Vec3::new(2.0, -2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_mouse_and_scroll_turn_and_zoom() {
        let mut camera = Camera::default();
        let input = FrameInput {
            actions: InputActions::empty(),
            mouse_delta: Vec2::new(10.0, 0.0),
            scroll: 5.0,
        };
        input.apply_to_camera(&mut camera, 0.016);

        assert_relative_eq!(camera.yaw, -89.0, epsilon = 1e-5);
        assert_relative_eq!(camera.zoom, 40.0);
        assert_eq!(camera.position, Vec3::zeros());
    }
}
