//! Light sources.

use std::f32::consts::PI;

use crate::image::Spectrum;

/// An isotropic point emitter.
///
/// Intensity is spectral radiant intensity in W/sr; irradiance at distance r
/// falls off as intensity / r^2.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub intensity: Spectrum,
}

impl PointLight {
    pub fn new(intensity: Spectrum) -> Self {
        Self { intensity }
    }

    /// Build from total radiated power in watts.
    pub fn from_power(power: Spectrum) -> Self {
        Self {
            intensity: power / (4.0 * PI),
        }
    }
}
