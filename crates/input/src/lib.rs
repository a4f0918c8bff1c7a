//! Keyboard and mouse input state with pointer-lock tracking.
//!
//! Mouse deltas are accumulated from raw device events and only exposed
//! while the pointer is locked; clicks are one-shot per frame.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
///
/// Events land in pending buffers; [`InputState::begin_frame`] promotes
/// them so every system sees the same snapshot for one frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,
    pending_keys_pressed: HashSet<KeyCode>,
    pending_keys_released: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,
    /// Mouse buttons released this frame.
    mouse_released: HashSet<MouseButton>,
    pending_mouse_pressed: HashSet<MouseButton>,
    pending_mouse_released: HashSet<MouseButton>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated raw motion (drained into `mouse_delta` each frame).
    accumulated_delta: Vec2,

    /// Whether the pointer is captured/locked to the window.
    pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote everything received since the last call into the current
    /// frame's state. Call at the start of each frame, after the event
    /// batch has been delivered and before any system reads input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed = std::mem::take(&mut self.pending_keys_pressed);
        self.keys_released = std::mem::take(&mut self.pending_keys_released);
        self.mouse_pressed = std::mem::take(&mut self.pending_mouse_pressed);
        self.mouse_released = std::mem::take(&mut self.pending_mouse_released);
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.pending_keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.pending_keys_released.insert(key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.pending_mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
                self.pending_mouse_released.insert(button);
            }
        }
    }

    /// Accumulate raw mouse motion. Deltas only reach `mouse_delta` if
    /// the pointer is locked (unlocked motion moves the OS cursor, not
    /// the view).
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.pointer_locked {
            self.accumulated_delta.x += delta.0 as f32;
            self.accumulated_delta.y += delta.1 as f32;
        }
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Check if the pointer is locked.
    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Set pointer lock state (mirrors the window's cursor grab).
    pub fn set_pointer_locked(&mut self, locked: bool) {
        if self.pointer_locked != locked {
            log::info!("Pointer {}", if locked { "locked" } else { "unlocked" });
        }
        self.pointer_locked = locked;
    }

    /// Get movement intent as a normalized vector (WASD).
    ///
    /// +y is forward, +x is strafe right. Normalized so diagonal input
    /// moves at the same speed as axial input.
    pub fn movement_input(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_key_held(KeyCode::KeyW) {
            movement.y += 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) {
            movement.y -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyA) {
            movement.x -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) {
            movement.x += 1.0;
        }

        if movement.length_squared() > 0.0 {
            movement = movement.normalize();
        }

        movement
    }

    /// Check if sprint is held (Shift).
    pub fn is_sprinting(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    /// Check if the interact click fired this frame (left mouse, one-shot).
    pub fn is_click_pressed(&self) -> bool {
        self.mouse_pressed.contains(&MouseButton::Left)
    }

    /// Check if the pointer-lock toggle key was pressed (Q).
    pub fn is_lock_toggle_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::KeyQ)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for &k in keys {
            input.process_keyboard(k, ElementState::Pressed);
        }
        input
    }

    #[test]
    fn movement_intent_is_unit_length_for_all_combos() {
        let keys = [KeyCode::KeyW, KeyCode::KeyS, KeyCode::KeyA, KeyCode::KeyD];
        for mask in 1u32..16 {
            let combo: Vec<KeyCode> = keys
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &k)| k)
                .collect();
            let v = held(&combo).movement_input();
            // Opposite keys cancel; otherwise the intent must be unit length
            if v.length_squared() > 0.0 {
                assert!(
                    (v.length() - 1.0).abs() < 1e-6,
                    "combo {combo:?} produced non-unit intent {v:?}"
                );
            }
        }
    }

    #[test]
    fn opposite_keys_cancel() {
        let v = held(&[KeyCode::KeyW, KeyCode::KeyS]).movement_input();
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn click_is_one_shot_per_frame() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.begin_frame();
        assert!(input.is_click_pressed());
        input.begin_frame();
        // Still held, but no longer "pressed this frame"
        assert!(!input.is_click_pressed());
    }

    #[test]
    fn key_repeat_does_not_refire_pressed() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);
        input.begin_frame();
        assert!(input.is_lock_toggle_pressed());
        // OS key repeat sends Pressed again while held
        input.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);
        input.begin_frame();
        assert!(!input.is_lock_toggle_pressed());
    }

    #[test]
    fn events_reach_the_frame_that_begins_after_them() {
        let mut input = InputState::new();
        input.set_pointer_locked(true);
        // Event batch first, then the frame begins, then systems read
        input.process_mouse_motion((3.0, -2.0));
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::new(3.0, -2.0));
        assert!(input.is_click_pressed());
        // A quiet frame sees a clean slate, not last frame's events
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert!(!input.is_click_pressed());
    }

    #[test]
    fn mouse_motion_ignored_while_unlocked() {
        let mut input = InputState::new();
        input.process_mouse_motion((10.0, 5.0));
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);

        input.set_pointer_locked(true);
        input.process_mouse_motion((10.0, 5.0));
        input.process_mouse_motion((2.0, -1.0));
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::new(12.0, 4.0));
    }
}
