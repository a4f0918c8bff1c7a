//! First-person walking controller.

use glam::Vec3;
use input::InputState;
use renderer::Camera;

use crate::config::GameConfig;

/// Eye height above the floor in world units.
pub const EYE_HEIGHT: f32 = 1.7;

/// Moves the camera on the horizontal plane from WASD intent.
///
/// Look and movement only respond while the pointer is locked; the
/// camera pitch never tilts the walk direction.
#[derive(Debug)]
pub struct FirstPersonController {
    /// Walk speed in units per second.
    pub move_speed: f32,
    /// Multiplier applied while Shift is held.
    pub sprint_multiplier: f32,
}

impl FirstPersonController {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            sprint_multiplier: config.sprint_multiplier,
        }
    }

    /// Apply mouse look and walk movement for this frame.
    pub fn update(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        if !input.is_pointer_locked() {
            return;
        }

        let delta = input.mouse_delta();
        if delta != glam::Vec2::ZERO {
            camera.process_mouse(delta.x, delta.y);
        }

        let intent = input.movement_input();
        if intent == glam::Vec2::ZERO {
            return;
        }

        // Walk on the horizontal plane regardless of pitch
        let yaw = camera.yaw();
        let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
        let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());

        let mut speed = self.move_speed;
        if input.is_sprinting() {
            speed *= self.sprint_multiplier;
        }

        let step = (forward * intent.y + right * intent.x) * speed * dt;
        camera.transform.position += step;
        camera.transform.position.y = EYE_HEIGHT;
    }

    /// Place the camera at a scene spawn point, facing `yaw`.
    pub fn teleport(&self, camera: &mut Camera, position: Vec3, yaw: f32) {
        camera.transform.position = Vec3::new(position.x, EYE_HEIGHT, position.z);
        camera.set_yaw_pitch(yaw, 0.0);
    }
}
