//! Math value types for the astra rendering workspace.
//!
//! Scene-scale geometry (positions, velocities, frame rotations) uses f64
//! throughout; shading-scale geometry (directions, normals, colors) uses f32.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod rotation;
mod transform;

pub use aabb::Aabb;
pub use rotation::{Rotation, RotationError, ShusterQuat};
pub use transform::Transform;
