//! 3D rotation value type backed by an orthonormal matrix.
//!
//! `Rotation` stores the local-to-parent ("active") matrix. Two factory
//! families are exposed: `from_local_to_parent_*` rotates vectors from the
//! local frame into the parent frame, while `from_parent_to_local_*` accepts
//! the transposed convention used by ephemeris frame-transformation
//! matrices. The two forms are matrix-transpose duals of each other.

use std::fmt;
use std::ops::{Mul, MulAssign};

use glam::{DMat3, DQuat, DVec3};
use thiserror::Error;

/// Tolerance on the determinant when accepting a matrix as a rotation.
const DET_EPSILON: f64 = 1e-6;

/// Errors from rotation construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    #[error("matrix is not orthonormal: determinant {det} deviates from 1")]
    NotOrthonormal { det: f64 },

    #[error("rotation axis has zero length")]
    ZeroAxis,

    #[error("invalid Euler sequence {sequence:?}: expected three axis letters from X, Y, Z")]
    InvalidEulerSequence { sequence: String },
}

/// Aerospace-convention ("Shuster") quaternion, vector part first.
///
/// Components are stored (x, y, z, w). For the same physical rotation the
/// matrix built from a Shuster quaternion is the transpose of the matrix
/// built from the Hamilton quaternion with identical components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShusterQuat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl ShusterQuat {
    pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// An orientation in 3D space, represented as an orthonormal 3x3 matrix.
///
/// Immutable value type: every operation returns a new `Rotation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Local-to-parent matrix.
    matrix: DMat3,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        matrix: DMat3::IDENTITY,
    };

    /// Validate a candidate matrix and clean up residual numeric drift.
    fn from_validated(matrix: DMat3) -> Result<Self, RotationError> {
        let det = matrix.determinant();
        if (det - 1.0).abs() > DET_EPSILON {
            return Err(RotationError::NotOrthonormal { det });
        }
        Ok(Self {
            matrix: orthonormalize(matrix),
        })
    }

    /// Build from a local-to-parent (active) rotation matrix.
    pub fn from_local_to_parent_matrix(matrix: DMat3) -> Result<Self, RotationError> {
        Self::from_validated(matrix)
    }

    /// Build from a parent-to-local (passive) transformation matrix.
    pub fn from_parent_to_local_matrix(matrix: DMat3) -> Result<Self, RotationError> {
        Self::from_validated(matrix.transpose())
    }

    /// Build from a Hamilton quaternion in the local-to-parent interpretation.
    pub fn from_local_to_parent_quat(quat: DQuat) -> Self {
        Self {
            matrix: DMat3::from_quat(quat.normalize()),
        }
    }

    /// Build from a Hamilton quaternion in the parent-to-local interpretation.
    pub fn from_parent_to_local_quat(quat: DQuat) -> Self {
        Self {
            matrix: DMat3::from_quat(quat.normalize()).transpose(),
        }
    }

    /// Build from a Shuster quaternion in the local-to-parent interpretation.
    pub fn from_local_to_parent_shuster(quat: ShusterQuat) -> Self {
        let q = DQuat::from_xyzw(quat.x, quat.y, quat.z, quat.w).normalize();
        Self {
            matrix: DMat3::from_quat(q).transpose(),
        }
    }

    /// Build from a Shuster quaternion in the parent-to-local interpretation.
    pub fn from_parent_to_local_shuster(quat: ShusterQuat) -> Self {
        let q = DQuat::from_xyzw(quat.x, quat.y, quat.z, quat.w).normalize();
        Self {
            matrix: DMat3::from_quat(q),
        }
    }

    /// Build from an axis and angle (radians), local-to-parent.
    pub fn from_local_to_parent_axis_angle(axis: DVec3, angle: f64) -> Result<Self, RotationError> {
        if axis.length_squared() <= f64::EPSILON {
            return Err(RotationError::ZeroAxis);
        }
        Ok(Self {
            matrix: DMat3::from_axis_angle(axis.normalize(), angle),
        })
    }

    /// Build from an axis and angle (radians), parent-to-local.
    pub fn from_parent_to_local_axis_angle(axis: DVec3, angle: f64) -> Result<Self, RotationError> {
        Self::from_local_to_parent_axis_angle(axis, angle).map(|r| r.inverse())
    }

    /// Build from three Euler angles about fixed (extrinsic) axes.
    ///
    /// The sequence string names the axes in application order, e.g. `"XYZ"`
    /// applies the first angle about X, then the second about Y, then the
    /// third about Z, all about the parent frame's axes.
    pub fn extrinsic_euler(
        angle1: f64,
        angle2: f64,
        angle3: f64,
        sequence: &str,
    ) -> Result<Self, RotationError> {
        let axes = parse_sequence(sequence)?;
        // Fixed-axis application order: the third rotation acts last.
        Ok(Self {
            matrix: basic_rotation(axes[2], angle3)
                * basic_rotation(axes[1], angle2)
                * basic_rotation(axes[0], angle1),
        })
    }

    /// Build from three Euler angles about body-fixed (intrinsic) axes.
    pub fn intrinsic_euler(
        angle1: f64,
        angle2: f64,
        angle3: f64,
        sequence: &str,
    ) -> Result<Self, RotationError> {
        let axes = parse_sequence(sequence)?;
        Ok(Self {
            matrix: basic_rotation(axes[0], angle1)
                * basic_rotation(axes[1], angle2)
                * basic_rotation(axes[2], angle3),
        })
    }

    /// Build from three basis vectors (the columns of the matrix).
    pub fn from_basis_vectors(
        x_axis: DVec3,
        y_axis: DVec3,
        z_axis: DVec3,
    ) -> Result<Self, RotationError> {
        Self::from_validated(DMat3::from_cols(x_axis, y_axis, z_axis))
    }

    /// The inverse rotation (transpose of the matrix).
    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }

    pub fn local_to_parent_matrix(&self) -> DMat3 {
        self.matrix
    }

    pub fn parent_to_local_matrix(&self) -> DMat3 {
        self.matrix.transpose()
    }

    /// Hamilton quaternion, local-to-parent interpretation.
    pub fn local_to_parent_quat(&self) -> DQuat {
        DQuat::from_mat3(&self.matrix)
    }

    /// Hamilton quaternion, parent-to-local interpretation.
    pub fn parent_to_local_quat(&self) -> DQuat {
        DQuat::from_mat3(&self.matrix.transpose())
    }

    /// Shuster quaternion, local-to-parent interpretation.
    pub fn local_to_parent_shuster(&self) -> ShusterQuat {
        let q = self.parent_to_local_quat();
        ShusterQuat::from_xyzw(q.x, q.y, q.z, q.w)
    }

    /// Shuster quaternion, parent-to-local interpretation.
    pub fn parent_to_local_shuster(&self) -> ShusterQuat {
        let q = self.local_to_parent_quat();
        ShusterQuat::from_xyzw(q.x, q.y, q.z, q.w)
    }

    /// First column: the local X axis expressed in the parent frame.
    pub fn x_axis(&self) -> DVec3 {
        self.matrix.x_axis
    }

    /// Second column: the local Y axis expressed in the parent frame.
    pub fn y_axis(&self) -> DVec3 {
        self.matrix.y_axis
    }

    /// Third column: the local Z axis expressed in the parent frame.
    pub fn z_axis(&self) -> DVec3 {
        self.matrix.z_axis
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    fn mul(self, rhs: Rotation) -> Rotation {
        Rotation {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

impl MulAssign for Rotation {
    fn mul_assign(&mut self, rhs: Rotation) {
        self.matrix = self.matrix * rhs.matrix;
    }
}

impl Mul<DVec3> for Rotation {
    type Output = DVec3;

    fn mul(self, rhs: DVec3) -> DVec3 {
        self.matrix * rhs
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.matrix;
        write!(
            f,
            "[[{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}]]",
            m.x_axis.x,
            m.y_axis.x,
            m.z_axis.x,
            m.x_axis.y,
            m.y_axis.y,
            m.z_axis.y,
            m.x_axis.z,
            m.y_axis.z,
            m.z_axis.z,
        )
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

fn basic_rotation(axis: Axis, angle: f64) -> DMat3 {
    match axis {
        Axis::X => DMat3::from_rotation_x(angle),
        Axis::Y => DMat3::from_rotation_y(angle),
        Axis::Z => DMat3::from_rotation_z(angle),
    }
}

fn parse_sequence(sequence: &str) -> Result<[Axis; 3], RotationError> {
    let invalid = || RotationError::InvalidEulerSequence {
        sequence: sequence.to_string(),
    };
    let mut axes = [Axis::X; 3];
    let mut chars = sequence.chars();
    for slot in axes.iter_mut() {
        *slot = match chars.next().ok_or_else(invalid)? {
            'X' | 'x' => Axis::X,
            'Y' | 'y' => Axis::Y,
            'Z' | 'z' => Axis::Z,
            _ => return Err(invalid()),
        };
    }
    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok(axes)
}

/// Gram-Schmidt re-orthonormalization of a near-rotation matrix.
fn orthonormalize(m: DMat3) -> DMat3 {
    let x = m.x_axis.normalize();
    let y = (m.y_axis - x * m.y_axis.dot(x)).normalize();
    let z = x.cross(y);
    DMat3::from_cols(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6};

    const TOL: f64 = 1e-10;

    fn test_vectors() -> Vec<DVec3> {
        vec![
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(-0.3, 0.77, -5.1),
        ]
    }

    fn sample_rotations() -> Vec<Rotation> {
        vec![
            Rotation::IDENTITY,
            Rotation::from_local_to_parent_axis_angle(DVec3::X, FRAC_PI_2).unwrap(),
            Rotation::from_local_to_parent_axis_angle(DVec3::new(1.0, 1.0, 0.0), FRAC_PI_3)
                .unwrap(),
            Rotation::extrinsic_euler(FRAC_PI_6, FRAC_PI_4, -FRAC_PI_3, "ZYX").unwrap(),
            Rotation::from_local_to_parent_quat(DQuat::from_xyzw(0.1, -0.2, 0.3, 0.9)),
        ]
    }

    #[test]
    fn test_inverse_round_trip() {
        for r in sample_rotations() {
            let round_trip = r * r.inverse();
            for v in test_vectors() {
                assert!((round_trip * v - v).length() <= TOL * v.length().max(1.0));
            }
        }
    }

    #[test]
    fn test_composition_associative() {
        let rs = sample_rotations();
        let (a, b, c) = (rs[1], rs[2], rs[3]);
        for v in test_vectors() {
            let left = ((a * b) * c) * v;
            let right = (a * (b * c)) * v;
            assert!((left - right).length() <= TOL * v.length().max(1.0));
        }
    }

    #[test]
    fn test_isometry() {
        let v1 = DVec3::new(1.0, 2.0, 3.0);
        let v2 = DVec3::new(-0.5, 0.25, 4.0);
        for r in sample_rotations() {
            assert!(((r * v1).length() - v1.length()).abs() <= TOL);
            assert!(((r * v1).dot(r * v2) - v1.dot(v2)).abs() <= TOL * v1.length() * v2.length());
        }
    }

    #[test]
    fn test_quaternion_round_trip() {
        for r in sample_rotations() {
            let from_quat = Rotation::from_local_to_parent_quat(r.local_to_parent_quat());
            let from_shuster = Rotation::from_local_to_parent_shuster(r.local_to_parent_shuster());
            for v in test_vectors() {
                assert!((from_quat * v - r * v).length() <= TOL * v.length().max(1.0));
                assert!((from_shuster * v - r * v).length() <= TOL * v.length().max(1.0));
            }
        }
    }

    #[test]
    fn test_parent_to_local_is_transpose_dual() {
        let r = Rotation::from_local_to_parent_axis_angle(DVec3::Z, FRAC_PI_4).unwrap();
        let dual = Rotation::from_parent_to_local_matrix(r.local_to_parent_matrix()).unwrap();
        for v in test_vectors() {
            assert!((dual * v - r.inverse() * v).length() <= TOL * v.length().max(1.0));
        }
    }

    #[test]
    fn test_axis_accessors_are_columns() {
        let r = Rotation::from_local_to_parent_axis_angle(DVec3::Z, FRAC_PI_2).unwrap();
        // Rotating X by 90 degrees about Z lands on Y.
        assert!((r.x_axis() - DVec3::Y).length() <= TOL);
        assert!((r.y_axis() + DVec3::X).length() <= TOL);
        assert!((r.z_axis() - DVec3::Z).length() <= TOL);
    }

    #[test]
    fn test_extrinsic_matches_reversed_intrinsic() {
        let (a1, a2, a3) = (0.3, -0.7, 1.1);
        let ext = Rotation::extrinsic_euler(a1, a2, a3, "XYZ").unwrap();
        let int = Rotation::intrinsic_euler(a3, a2, a1, "ZYX").unwrap();
        for v in test_vectors() {
            assert!((ext * v - int * v).length() <= TOL * v.length().max(1.0));
        }
    }

    #[test]
    fn test_euler_single_axis_matches_axis_angle() {
        let euler = Rotation::extrinsic_euler(FRAC_PI_3, 0.0, 0.0, "YXZ").unwrap();
        let axis = Rotation::from_local_to_parent_axis_angle(DVec3::Y, FRAC_PI_3).unwrap();
        for v in test_vectors() {
            assert!((euler * v - axis * v).length() <= TOL * v.length().max(1.0));
        }
    }

    #[test]
    fn test_non_orthonormal_matrix_rejected() {
        let scaled = DMat3::from_diagonal(DVec3::new(2.0, 1.0, 1.0));
        match Rotation::from_local_to_parent_matrix(scaled) {
            Err(RotationError::NotOrthonormal { det }) => assert!((det - 2.0).abs() < 1e-12),
            other => panic!("expected NotOrthonormal, got {other:?}"),
        }
    }

    #[test]
    fn test_small_drift_is_orthonormalized() {
        let drift = 1e-8;
        let m = DMat3::from_cols(
            DVec3::new(1.0, drift, 0.0),
            DVec3::new(0.0, 1.0, drift),
            DVec3::new(drift, 0.0, 1.0),
        );
        let r = Rotation::from_local_to_parent_matrix(m).unwrap();
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert!(((r * v).length() - v.length()).abs() <= TOL);
    }

    #[test]
    fn test_zero_axis_rejected() {
        assert_eq!(
            Rotation::from_local_to_parent_axis_angle(DVec3::ZERO, 1.0),
            Err(RotationError::ZeroAxis)
        );
    }

    #[test]
    fn test_invalid_sequence_rejected() {
        assert!(matches!(
            Rotation::extrinsic_euler(0.1, 0.2, 0.3, "XYW"),
            Err(RotationError::InvalidEulerSequence { .. })
        ));
        assert!(matches!(
            Rotation::extrinsic_euler(0.1, 0.2, 0.3, "XY"),
            Err(RotationError::InvalidEulerSequence { .. })
        ));
        assert!(matches!(
            Rotation::extrinsic_euler(0.1, 0.2, 0.3, "XYZX"),
            Err(RotationError::InvalidEulerSequence { .. })
        ));
    }

    #[test]
    fn test_basis_vector_construction() {
        let r = Rotation::from_basis_vectors(DVec3::Y, DVec3::NEG_X, DVec3::Z).unwrap();
        assert!((r * DVec3::X - DVec3::Y).length() <= TOL);
    }
}
