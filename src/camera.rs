use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::MoveKeys;

/// Free-fly camera state.
///
/// `direction`, `right` and `up` are derived from the two angles and are
/// recomputed by [`CameraState::turn`]. The vertical angle is not clamped, so
/// turning past the poles flips the view. Serialize only, so the basis always
/// comes from [`CameraState::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub position: Vec3,
    pub horizontal: f32,
    pub vertical: f32,
    direction: Vec3,
    right: Vec3,
    up: Vec3,
}

impl CameraState {
    pub fn new(position: Vec3, horizontal: f32, vertical: f32) -> Self {
        let mut state = Self {
            position,
            horizontal,
            vertical,
            direction: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        state.refresh_basis();
        state
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Adds angle deltas (radians) and rebuilds the basis vectors.
    pub fn turn(&mut self, horizontal: f32, vertical: f32) {
        self.horizontal += horizontal;
        self.vertical += vertical;
        self.refresh_basis();
    }

    fn refresh_basis(&mut self) {
        let (h, v) = (self.horizontal, self.vertical);
        self.direction = Vec3::new(v.cos() * h.sin(), v.sin(), v.cos() * h.cos());
        self.right = Vec3::new((h - FRAC_PI_2).sin(), 0.0, (h - FRAC_PI_2).cos());
        self.up = self.right.cross(self.direction);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 3.0, 5.0), PI, 0.0)
    }
}

/// Perspective projection used by the lighting pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect.max(0.01),
            self.near,
            self.far,
        )
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Input consumed by one camera update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    /// Window centre minus cursor position, in pixels.
    pub cursor_delta: Vec2,
    pub keys: MoveKeys,
}

/// Turns cursor deltas and held keys into camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraController {
    /// Translation speed in world units per second.
    pub speed: f32,
    /// Radians per pixel per second of cursor displacement.
    pub mouse_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            speed: 4.0,
            mouse_speed: 0.8,
        }
    }
}

impl CameraController {
    pub fn new(speed: f32, mouse_speed: f32) -> Self {
        Self { speed, mouse_speed }
    }

    /// Advances the camera by one frame of `dt` seconds.
    pub fn update(&self, state: &mut CameraState, input: &CameraInput, dt: f32) {
        let look = input.cursor_delta * self.mouse_speed * dt;
        state.turn(look.x, look.y);

        let step = dt * self.speed;
        let keys = input.keys;
        if keys.forward {
            state.position += state.direction * step;
        }
        if keys.back {
            state.position -= state.direction * step;
        }
        if keys.strafe_right {
            state.position += state.right * step;
        }
        if keys.strafe_left {
            state.position -= state.right * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let state = CameraState::default();
        assert_close(state.direction(), Vec3::new(0.0, 0.0, -1.0));
        assert_close(state.right(), Vec3::new(1.0, 0.0, 0.0));
        assert_close(state.up(), Vec3::Y);
    }

    #[test]
    fn basis_is_orthonormal_from_any_angles() {
        let state = CameraState::new(Vec3::ONE, 1.2, -0.7);
        assert!((state.direction().length() - 1.0).abs() < 1e-5);
        assert!((state.right().length() - 1.0).abs() < 1e-5);
        assert!(state.direction().dot(state.right()).abs() < 1e-5);
        assert_close(state.up(), state.right().cross(state.direction()));
    }

    #[test]
    fn angle_updates_commute() {
        let start = CameraState::default();

        let mut first = start;
        first.turn(0.3, 0.0);
        first.turn(0.0, -0.2);

        let mut second = start;
        second.turn(0.0, -0.2);
        second.turn(0.3, 0.0);

        let mut together = start;
        together.turn(0.3, -0.2);

        assert_eq!(first.horizontal, second.horizontal);
        assert_eq!(first.vertical, second.vertical);
        assert_eq!(first, together);
        assert_eq!(second, together);
    }

    #[test]
    fn cursor_delta_is_scaled_by_time_and_sensitivity() {
        let controller = CameraController::new(4.0, 0.8);
        let mut state = CameraState::new(Vec3::ZERO, 0.0, 0.0);
        let input = CameraInput {
            cursor_delta: Vec2::new(10.0, -5.0),
            keys: MoveKeys::default(),
        };
        controller.update(&mut state, &input, 0.5);
        assert!((state.horizontal - 4.0).abs() < 1e-6);
        assert!((state.vertical + 2.0).abs() < 1e-6);
        assert_eq!(state.position, Vec3::ZERO);
    }

    #[test]
    fn held_keys_translate_without_bounds() {
        let controller = CameraController::new(4.0, 0.8);
        let mut state = CameraState::default();
        let input = CameraInput {
            cursor_delta: Vec2::ZERO,
            keys: MoveKeys {
                forward: true,
                strafe_right: true,
                ..MoveKeys::default()
            },
        };
        controller.update(&mut state, &input, 0.25);
        assert_close(state.position, Vec3::new(1.0, 3.0, 4.0));

        for _ in 0..1000 {
            controller.update(&mut state, &input, 0.25);
        }
        assert!(state.position.z < -900.0);
    }

    #[test]
    fn pitch_is_not_clamped() {
        let mut state = CameraState::default();
        state.turn(0.0, PI);
        // looking past the pole flips the forward vector
        assert_close(state.direction(), Vec3::new(0.0, 0.0, 1.0));
        assert!(state.up().y < 0.0);
    }
}
