use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Keys that move the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKey {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
}

impl MoveKey {
    pub fn from_keycode(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::KeyW => MoveKey::Forward,
            KeyCode::KeyS => MoveKey::Back,
            KeyCode::KeyA => MoveKey::StrafeLeft,
            KeyCode::KeyD => MoveKey::StrafeRight,
            _ => return None,
        })
    }
}

/// Snapshot of the movement keys held during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

/// Tracks the cursor relative to an anchor that is reset every frame.
///
/// The anchor is normally the window centre, where the cursor gets warped back
/// after each sample. When warping is not supported the anchor follows the
/// last sampled position instead.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorTracker {
    anchor: Option<Vec2>,
    position: Option<Vec2>,
}

impl CursorTracker {
    pub fn set_position(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    /// Returns `anchor - position` since the last sample and resets both to
    /// `centre`. Until the cursor has been seen the delta is zero.
    pub fn take_delta(&mut self, centre: Vec2) -> Vec2 {
        let delta = match self.position {
            Some(position) => self.anchor.unwrap_or(centre) - position,
            None => Vec2::ZERO,
        };
        self.anchor = Some(centre);
        self.position = Some(centre);
        delta
    }

    /// Called when the cursor could not be moved back to the centre.
    pub fn rebase_to(&mut self, position: Vec2) {
        self.anchor = Some(position);
        self.position = Some(position);
    }
}

/// Input accumulated between two frames.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<MoveKey>,
    cursor: CursorTracker,
    last_cursor: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: MoveKey) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: MoveKey) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: MoveKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn set_cursor_position(&mut self, position: Vec2) {
        self.last_cursor = Some(position);
        self.cursor.set_position(position);
    }

    pub fn move_keys(&self) -> MoveKeys {
        MoveKeys {
            forward: self.is_key_down(MoveKey::Forward),
            back: self.is_key_down(MoveKey::Back),
            strafe_left: self.is_key_down(MoveKey::StrafeLeft),
            strafe_right: self.is_key_down(MoveKey::StrafeRight),
        }
    }

    pub fn take_cursor_delta(&mut self, centre: Vec2) -> Vec2 {
        self.cursor.take_delta(centre)
    }

    pub fn cursor_warp_failed(&mut self) {
        if let Some(position) = self.last_cursor {
            self.cursor.rebase_to(position);
        }
    }

    /// Drops held keys, used when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_wasd_only() {
        assert_eq!(MoveKey::from_keycode(KeyCode::KeyW), Some(MoveKey::Forward));
        assert_eq!(MoveKey::from_keycode(KeyCode::KeyD), Some(MoveKey::StrafeRight));
        assert_eq!(MoveKey::from_keycode(KeyCode::Space), None);
    }

    #[test]
    fn input_state_tracks_keys() {
        let mut state = InputState::new();
        state.set_key_down(MoveKey::Back);
        assert!(state.move_keys().back);
        state.set_key_up(MoveKey::Back);
        assert_eq!(state.move_keys(), MoveKeys::default());
    }

    #[test]
    fn delta_is_measured_from_centre() {
        let mut state = InputState::new();
        let centre = Vec2::new(400.0, 400.0);
        assert_eq!(state.take_cursor_delta(centre), Vec2::ZERO);

        state.set_cursor_position(Vec2::new(390.0, 420.0));
        assert_eq!(state.take_cursor_delta(centre), Vec2::new(10.0, -20.0));
        // no motion reported since the recentre
        assert_eq!(state.take_cursor_delta(centre), Vec2::ZERO);
    }

    #[test]
    fn failed_warp_rebases_on_cursor() {
        let mut state = InputState::new();
        let centre = Vec2::new(400.0, 400.0);
        state.set_cursor_position(Vec2::new(100.0, 100.0));
        state.take_cursor_delta(centre);
        state.cursor_warp_failed();

        state.set_cursor_position(Vec2::new(110.0, 100.0));
        assert_eq!(state.take_cursor_delta(centre), Vec2::new(-10.0, 0.0));
    }
}
