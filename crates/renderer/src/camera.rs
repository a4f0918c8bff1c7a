//! Camera system for the first-person view.

use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat4, Vec3};

/// First-person camera with configurable FOV and clipping planes.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Mouse sensitivity for look controls.
    pub sensitivity: f32,
    /// Current pitch (up/down rotation) in radians.
    pitch: f32,
    /// Current yaw (left/right rotation) in radians.
    yaw: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
            sensitivity: 0.0025,
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Process mouse movement for look controls.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * self.sensitivity;
        self.pitch -= delta_y * self.sensitivity;

        // Clamp pitch to prevent flipping
        let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);

        self.transform.rotation =
            glam::Quat::from_rotation_y(self.yaw) * glam::Quat::from_rotation_x(self.pitch);
    }

    /// Set yaw and pitch directly (in radians) and rebuild rotation.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = pitch.clamp(-max_pitch, max_pitch);
        self.transform.rotation =
            glam::Quat::from_rotation_y(self.yaw) * glam::Quat::from_rotation_x(self.pitch);
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.transform.position;
        let target = eye + self.transform.forward();
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get camera position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Get camera forward direction.
    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Get camera right direction.
    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    /// Get current yaw in radians.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Get current pitch in radians.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

/// Camera uniform data for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
    /// Point light position, w unused.
    pub light_position: [f32; 4],
    /// Point light color, w = intensity.
    pub light_color: [f32; 4],
    /// Ambient color, w unused.
    pub ambient: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0, 0.0, 0.0, 1.0],
            light_position: [0.0, 5.0, 0.0, 0.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.35, 0.35, 0.4, 0.0],
        }
    }

    pub fn update(&mut self, camera: &Camera, light_position: Vec3, light_color: [f32; 4]) {
        self.view_proj = camera.view_projection_matrix().to_cols_array_2d();
        let pos = camera.position();
        self.position = [pos.x, pos.y, pos.z, 1.0];
        self.light_position = [light_position.x, light_position.y, light_position.z, 0.0];
        self.light_color = light_color;
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn pitch_clamps_short_of_vertical() {
        let mut cam = Camera::default();
        // Drag the mouse down hard
        cam.process_mouse(0.0, 100000.0);
        assert!(cam.pitch() > -FRAC_PI_2);
        assert!((cam.pitch() - (-(FRAC_PI_2 - 0.01))).abs() < 1e-5);

        cam.set_yaw_pitch(0.0, 10.0);
        assert!((cam.pitch() - (FRAC_PI_2 - 0.01)).abs() < 1e-5);
    }

    #[test]
    fn yaw_turns_the_forward_vector() {
        let mut cam = Camera::default();
        cam.set_yaw_pitch(FRAC_PI_2, 0.0);
        // +90 degrees yaw swings -Z toward -X
        assert!((cam.forward() - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn level_camera_keeps_forward_horizontal() {
        let mut cam = Camera::default();
        cam.set_yaw_pitch(1.2, 0.0);
        assert!(cam.forward().y.abs() < 1e-6);
    }
}
