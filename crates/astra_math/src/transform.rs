//! Rigid-plus-scale transform with kinematic state.

use glam::{DMat4, DVec3};

use crate::rotation::Rotation;

/// A frame-to-frame transform: translation, rotation, and per-axis scale,
/// plus the linear and angular velocity of the child frame expressed in the
/// parent frame.
///
/// Applying a transform maps child-frame quantities into the parent frame:
/// scale first, then rotation, then translation. Composition `a * b` yields
/// the transform of b's frame expressed in a's parent frame (apply b, then
/// a). Scale components must be nonzero for `inverse()`; inversion is exact
/// for uniform scale (nonuniform scale does not commute with rotation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: Rotation,
    pub scale: DVec3,
    pub velocity: DVec3,
    pub angular_velocity: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: Rotation::IDENTITY,
        scale: DVec3::ONE,
        velocity: DVec3::ZERO,
        angular_velocity: DVec3::ZERO,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: Rotation) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Convert to a 4x4 matrix (translate * rotate * scale).
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(
            self.scale,
            self.rotation.local_to_parent_quat(),
            self.translation,
        )
    }

    /// Map a child-frame point into the parent frame.
    pub fn apply_to_point(&self, point: DVec3) -> DVec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Map a child-frame direction into the parent frame (no translation).
    pub fn apply_to_direction(&self, dir: DVec3) -> DVec3 {
        self.rotation * (self.scale * dir)
    }

    /// Map a child-frame normal into the parent frame (inverse-transpose of
    /// the linear part), unnormalized.
    pub fn apply_to_normal(&self, normal: DVec3) -> DVec3 {
        self.rotation * (normal / self.scale)
    }

    /// Map a child-frame velocity into the parent frame and add the frame's
    /// own velocity.
    pub fn apply_to_velocity(&self, velocity: DVec3) -> DVec3 {
        self.rotation * (self.scale * velocity) + self.velocity
    }

    /// Map a child-frame angular velocity into the parent frame and add the
    /// frame's own angular velocity.
    pub fn apply_to_angular_velocity(&self, angular_velocity: DVec3) -> DVec3 {
        self.rotation * angular_velocity + self.angular_velocity
    }

    /// Velocity of a parent-frame point riding this frame's motion.
    pub fn velocity_of_point(&self, point: DVec3) -> DVec3 {
        self.velocity + self.angular_velocity.cross(point - self.translation)
    }

    /// Velocity of a child-frame point riding this frame's motion.
    pub fn velocity_of_local_point(&self, local_point: DVec3) -> DVec3 {
        self.velocity
            + self
                .angular_velocity
                .cross(self.rotation * (self.scale * local_point))
    }

    /// The inverse transform. Scale components must be nonzero.
    pub fn inverse(&self) -> Transform {
        debug_assert!(
            self.scale.x != 0.0 && self.scale.y != 0.0 && self.scale.z != 0.0,
            "cannot invert a transform with zero scale"
        );
        let inv_scale = DVec3::ONE / self.scale;
        let inv_rotation = self.rotation.inverse();
        Transform {
            translation: -(inv_rotation * (inv_scale * self.translation)),
            rotation: inv_rotation,
            scale: inv_scale,
            velocity: inv_scale
                * (inv_rotation * (self.angular_velocity.cross(self.translation) - self.velocity)),
            angular_velocity: -(inv_rotation * self.angular_velocity),
        }
    }
}

impl std::ops::Mul for Transform {
    type Output = Transform;

    /// Compose: apply `rhs`, then `self`.
    fn mul(self, rhs: Transform) -> Transform {
        let rhs_origin = self.rotation * (self.scale * rhs.translation);
        Transform {
            translation: self.translation + rhs_origin,
            rotation: self.rotation * rhs.rotation,
            scale: self.scale * rhs.scale,
            velocity: self.velocity
                + self.rotation * (self.scale * rhs.velocity)
                + self.angular_velocity.cross(rhs_origin),
            angular_velocity: self.angular_velocity + self.rotation * rhs.angular_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-10;

    fn sample() -> Transform {
        Transform {
            translation: DVec3::new(10.0, -4.0, 2.5),
            rotation: Rotation::from_local_to_parent_axis_angle(DVec3::new(0.2, 1.0, -0.4), 0.83)
                .unwrap(),
            scale: DVec3::splat(2.0),
            velocity: DVec3::new(0.5, 0.0, -1.5),
            angular_velocity: DVec3::new(0.0, 0.1, 0.02),
        }
    }

    #[test]
    fn test_apply_to_point() {
        let t = Transform {
            translation: DVec3::new(1.0, 0.0, 0.0),
            rotation: Rotation::from_local_to_parent_axis_angle(DVec3::Z, FRAC_PI_2).unwrap(),
            ..Transform::IDENTITY
        };
        // X rotates onto Y, then translates.
        let p = t.apply_to_point(DVec3::X);
        assert!((p - DVec3::new(1.0, 1.0, 0.0)).length() <= TOL);
        // Directions ignore translation.
        let d = t.apply_to_direction(DVec3::X);
        assert!((d - DVec3::Y).length() <= TOL);
    }

    #[test]
    fn test_compose_matches_sequential_apply() {
        let a = sample();
        let b = Transform {
            translation: DVec3::new(-2.0, 3.0, 1.0),
            rotation: Rotation::from_local_to_parent_axis_angle(DVec3::X, 0.4).unwrap(),
            scale: DVec3::splat(0.5),
            ..Transform::IDENTITY
        };
        let ab = a * b;
        for p in [DVec3::ZERO, DVec3::X, DVec3::new(1.0, -2.0, 3.0)] {
            let sequential = a.apply_to_point(b.apply_to_point(p));
            let composed = ab.apply_to_point(p);
            assert!((sequential - composed).length() <= TOL * sequential.length().max(1.0));
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = sample();
        let inv = t.inverse();
        for p in [DVec3::ZERO, DVec3::new(5.0, -1.0, 0.25)] {
            let round_trip = inv.apply_to_point(t.apply_to_point(p));
            assert!((round_trip - p).length() <= 1e-9 * p.length().max(1.0));
        }
    }

    #[test]
    fn test_inverse_cancels_kinematics() {
        let t = sample();
        let cancel = t * t.inverse();
        assert!(cancel.translation.length() <= 1e-9);
        assert!(cancel.velocity.length() <= 1e-9);
        assert!(cancel.angular_velocity.length() <= 1e-9);
        assert!((cancel.scale - DVec3::ONE).length() <= 1e-12);
    }

    #[test]
    fn test_composed_velocity_includes_sweep() {
        // A frame spinning about Z carries a child offset along X: the
        // child's origin sweeps in +Y.
        let spinning = Transform {
            angular_velocity: DVec3::new(0.0, 0.0, 1.0),
            ..Transform::IDENTITY
        };
        let offset = Transform::from_translation(DVec3::new(2.0, 0.0, 0.0));
        let composed = spinning * offset;
        assert!((composed.velocity - DVec3::new(0.0, 2.0, 0.0)).length() <= TOL);
    }

    #[test]
    fn test_velocity_of_point() {
        let t = Transform {
            velocity: DVec3::new(1.0, 0.0, 0.0),
            angular_velocity: DVec3::new(0.0, 0.0, 2.0),
            ..Transform::IDENTITY
        };
        let v = t.velocity_of_point(DVec3::new(1.0, 0.0, 0.0));
        assert!((v - DVec3::new(1.0, 2.0, 0.0)).length() <= TOL);
    }

    #[test]
    fn test_normal_transform_under_scale() {
        let t = Transform {
            scale: DVec3::new(2.0, 1.0, 1.0),
            ..Transform::IDENTITY
        };
        // A plane tilted 45 degrees stretched along X: the normal tilts
        // toward Y, opposite to what apply_to_direction would give.
        let n = t.apply_to_normal(DVec3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x);
    }
}
