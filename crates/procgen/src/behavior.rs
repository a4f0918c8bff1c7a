//! Idle animation behaviors for display shapes.

use crate::primitives::ShapeKind;
use engine_core::{Quat, Transform, Vec3};

/// Per-shape idle animation applied to pedestal display pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeBehavior {
    /// Constant yaw spin at the given radians per second.
    Spin(f32),
    /// Spin in the opposite direction.
    SpinReverse(f32),
    /// Breathe between 90% and 110% of base scale.
    ScalePulse,
    /// Tilt side to side while slowly turning.
    Wobble,
    /// Bob up and down around the rest height.
    VerticalBob,
    /// Cycle the tint through the hue wheel.
    ColorShift,
}

/// Which behavior each shape kind idles with.
pub fn behavior_for(kind: ShapeKind) -> ShapeBehavior {
    match kind {
        ShapeKind::Cube => ShapeBehavior::Spin(0.8),
        ShapeKind::Sphere => ShapeBehavior::ScalePulse,
        ShapeKind::Cone => ShapeBehavior::Wobble,
        ShapeKind::Cylinder => ShapeBehavior::VerticalBob,
        ShapeKind::Torus => ShapeBehavior::SpinReverse(0.8),
        ShapeKind::Tetrahedron => ShapeBehavior::Spin(1.2),
        ShapeKind::Octahedron => ShapeBehavior::ScalePulse,
        ShapeKind::Dodecahedron => ShapeBehavior::Spin(0.6),
        ShapeKind::Icosahedron => ShapeBehavior::VerticalBob,
        ShapeKind::TorusKnot => ShapeBehavior::ColorShift,
    }
}

/// Advance a display transform by one frame of its idle behavior.
///
/// `rest` carries the pedestal position and base scale the animation
/// oscillates around; `elapsed` is absolute time so phase survives
/// uneven frame deltas.
pub fn apply_behavior(
    transform: &mut Transform,
    rest: &Transform,
    behavior: ShapeBehavior,
    dt: f32,
    elapsed: f32,
) {
    match behavior {
        ShapeBehavior::Spin(rate) => transform.rotate_y(rate * dt),
        ShapeBehavior::SpinReverse(rate) => transform.rotate_y(-rate * dt),
        ShapeBehavior::ScalePulse => {
            transform.scale = rest.scale * (1.0 + 0.1 * (elapsed * 2.0).sin());
        }
        ShapeBehavior::Wobble => {
            transform.rotation = Quat::from_rotation_y(elapsed * 0.5)
                * Quat::from_rotation_z(0.2 * (elapsed * 1.5).sin());
        }
        ShapeBehavior::VerticalBob => {
            transform.position =
                rest.position + Vec3::Y * 0.1 * (elapsed * 2.0).sin();
        }
        ShapeBehavior::ColorShift => {
            // Color handled separately; give the knot a slow turn too
            transform.rotate_y(0.4 * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_behavior() {
        for kind in ShapeKind::ALL {
            // Exercise the table; a missing arm would not compile
            let _ = behavior_for(kind);
        }
    }

    #[test]
    fn bob_stays_near_rest_height() {
        let rest = Transform::from_position(Vec3::new(0.0, 1.5, 0.0));
        let mut t = rest;
        for frame in 0..600 {
            let elapsed = frame as f32 / 60.0;
            apply_behavior(&mut t, &rest, ShapeBehavior::VerticalBob, 1.0 / 60.0, elapsed);
            assert!((t.position.y - 1.5).abs() <= 0.1 + 1e-5);
        }
        assert_eq!(t.position.x, 0.0);
    }

    #[test]
    fn pulse_scale_stays_bounded() {
        let rest = Transform::default();
        let mut t = rest;
        for frame in 0..600 {
            let elapsed = frame as f32 / 60.0;
            apply_behavior(&mut t, &rest, ShapeBehavior::ScalePulse, 1.0 / 60.0, elapsed);
            assert!(t.scale.x >= 0.9 - 1e-5 && t.scale.x <= 1.1 + 1e-5);
        }
    }

    #[test]
    fn spin_accumulates_yaw() {
        let rest = Transform::default();
        let mut t = rest;
        for _ in 0..60 {
            apply_behavior(&mut t, &rest, ShapeBehavior::Spin(1.0), 1.0 / 60.0, 0.0);
        }
        // One second at 1 rad/s swings forward away from -Z
        assert!((t.forward() - Vec3::new(0.0, 0.0, -1.0)).length() > 0.5);
    }
}
