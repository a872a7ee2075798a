//! Image containers and texture sampling.
//!
//! `Image<P>` is the single pixel container used for material textures and
//! frame buffer channels alike. Pixel types that support linear blending get
//! bilinear sampling; integer channels (mesh ids) get plain access only.

use std::path::Path;

use glam::Vec3;
use thiserror::Error;

/// Spectral value carried through the shading pipeline: linear RGB.
pub type Spectrum = Vec3;

/// Errors from texture file loading.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("failed to load image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Pixel types that support linear blending.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec3::lerp(self, other, t)
    }
}

/// A fixed-resolution pixel grid, row-major from the top-left.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P> {
    width: usize,
    height: usize,
    data: Vec<P>,
}

impl<P: Copy> Image<P> {
    /// Create an image with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: P) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// A 1x1 image holding a single value, used for unset texture slots.
    pub fn constant(value: P) -> Self {
        Self::filled(1, 1, value)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> P {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: P) {
        self.data[y * self.width + x] = value;
    }

    /// Reset every pixel to `value`.
    pub fn fill(&mut self, value: P) {
        self.data.fill(value);
    }

    pub fn pixels(&self) -> &[P] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [P] {
        &mut self.data
    }
}

impl<P: Lerp> Image<P> {
    /// Bilinear sample at texture coordinates.
    ///
    /// UVs wrap; (0, 0) is the bottom-left corner, matching mesh UV
    /// conventions, so v is flipped against image rows.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> P {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = (1.0 - v) * (self.height as f32 - 1.0);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let top = self.get(x0, y0).lerp(self.get(x1, y0), fx);
        let bottom = self.get(x0, y1).lerp(self.get(x1, y1), fx);
        top.lerp(bottom, fy)
    }
}

impl Image<Spectrum> {
    /// Load a color texture, converting 8-bit sRGB to linear.
    pub fn open_rgb(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let decoded = image::open(path)?.to_rgb8();
        let (width, height) = decoded.dimensions();
        let data = decoded
            .pixels()
            .map(|p| {
                Vec3::new(
                    srgb_to_linear(p.0[0] as f32 / 255.0),
                    srgb_to_linear(p.0[1] as f32 / 255.0),
                    srgb_to_linear(p.0[2] as f32 / 255.0),
                )
            })
            .collect();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            data,
        })
    }
}

impl Image<f32> {
    /// Load a single-channel data texture (roughness, metallic). No sRGB
    /// conversion: data maps are stored linearly.
    pub fn open_gray(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let decoded = image::open(path)?.to_luma8();
        let (width, height) = decoded.dimensions();
        let data = decoded.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            data,
        })
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
