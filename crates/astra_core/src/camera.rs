//! Pinhole camera model with optional lens distortion.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Brown-Conrady radial and tangential lens distortion, applied to
/// normalized image-plane coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrownDistortion {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
}

impl BrownDistortion {
    pub fn distort(&self, p: DVec2) -> DVec2 {
        let r2 = p.length_squared();
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let tangential = DVec2::new(
            2.0 * self.p1 * p.x * p.y + self.p2 * (r2 + 2.0 * p.x * p.x),
            self.p1 * (r2 + 2.0 * p.y * p.y) + 2.0 * self.p2 * p.x * p.y,
        );
        p * radial + tangential
    }
}

/// Pinhole camera intrinsics.
///
/// Camera space is +Z forward, +X right, +Y down; pixel (0, 0) is the
/// top-left corner. Focal lengths and principal point are in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    pub width: usize,
    pub height: usize,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub distortion: Option<BrownDistortion>,
}

impl CameraModel {
    /// Create a camera with square pixels, the principal point at the image
    /// center, and no distortion.
    pub fn new(width: usize, height: usize, focal_length_px: f64) -> Self {
        Self {
            width,
            height,
            fx: focal_length_px,
            fy: focal_length_px,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
            distortion: None,
        }
    }

    /// Create from a horizontal field of view (radians).
    pub fn from_hfov(width: usize, height: usize, hfov: f64) -> Self {
        let focal = (width as f64 / 2.0) / (hfov / 2.0).tan();
        Self::new(width, height, focal)
    }

    pub fn with_distortion(mut self, distortion: BrownDistortion) -> Self {
        self.distortion = Some(distortion);
        self
    }

    /// Project a camera-space point to pixel coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane. The result
    /// may lie outside the image bounds; callers clip.
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        if point.z <= 0.0 {
            return None;
        }
        let mut normalized = DVec2::new(point.x / point.z, point.y / point.z);
        if let Some(distortion) = &self.distortion {
            normalized = distortion.distort(normalized);
        }
        Some(DVec2::new(
            self.fx * normalized.x + self.cx,
            self.fy * normalized.y + self.cy,
        ))
    }
}
