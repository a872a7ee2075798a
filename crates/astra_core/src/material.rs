//! Surface materials and shading parameters.

use std::sync::Arc;

use glam::Vec3;

use crate::image::{Image, Spectrum};

/// Which BSDF a material shades with.
///
/// BSDFs themselves are stateless; a single instance per model is shared
/// across every material in the scene, so materials carry only this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingModel {
    /// Perfectly diffuse.
    Lambert,
    /// GGX microfacet with metallic-roughness parameterization.
    GgxMicrofacet,
}

/// Shading parameters evaluated from the material textures at one UV.
///
/// Built on the stack per fragment and passed by reference to BSDF calls;
/// never stored.
#[derive(Clone, Copy, Debug)]
pub struct ShadingParams {
    /// Base color / albedo, texture times factor.
    pub base_color: Spectrum,

    /// Perceptual roughness in [0, 1]. Squared internally by microfacet
    /// BSDFs.
    pub roughness: f32,

    /// Metallic factor in [0, 1]. 0 = dielectric, 1 = conductor.
    pub metallic: f32,

    /// Opacity in [0, 1]. 1 = fully opaque.
    pub opacity: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            base_color: Spectrum::ONE,
            roughness: 0.5,
            metallic: 0.0,
            opacity: 1.0,
        }
    }
}

/// A surface material: shared texture images, scalar factors, and the
/// shading model tag.
///
/// Every texture slot is always populated; unset slots hold a shared 1x1
/// neutral image, so texture evaluation never branches on presence. Factors
/// multiply the sampled texture values.
#[derive(Clone, Debug)]
pub struct Material {
    pub shading: ShadingModel,

    base_color_texture: Arc<Image<Spectrum>>,
    metallic_texture: Arc<Image<f32>>,
    roughness_texture: Arc<Image<f32>>,
    normal_texture: Arc<Image<Vec3>>,
    emissive_texture: Arc<Image<Spectrum>>,

    pub base_color_factor: Spectrum,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: Spectrum,
    pub normal_scale: f32,
}

impl Material {
    /// Create a material with neutral 1x1 textures and default factors.
    pub fn new(shading: ShadingModel) -> Self {
        Self {
            shading,
            base_color_texture: Arc::new(Image::constant(Spectrum::ONE)),
            metallic_texture: Arc::new(Image::constant(1.0)),
            roughness_texture: Arc::new(Image::constant(1.0)),
            // Unperturbed tangent-space normal.
            normal_texture: Arc::new(Image::constant(Vec3::new(0.5, 0.5, 1.0))),
            emissive_texture: Arc::new(Image::constant(Spectrum::ONE)),
            base_color_factor: Spectrum::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.5,
            emissive_factor: Spectrum::ZERO,
            normal_scale: 1.0,
        }
    }

    pub fn with_base_color(mut self, color: Spectrum) -> Self {
        self.base_color_factor = color;
        self
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic_factor = metallic.clamp(0.0, 1.0);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness_factor = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_emissive(mut self, emissive: Spectrum) -> Self {
        self.emissive_factor = emissive;
        self
    }

    pub fn with_base_color_texture(mut self, texture: Arc<Image<Spectrum>>) -> Self {
        self.base_color_texture = texture;
        self
    }

    pub fn with_metallic_texture(mut self, texture: Arc<Image<f32>>) -> Self {
        self.metallic_texture = texture;
        self
    }

    pub fn with_roughness_texture(mut self, texture: Arc<Image<f32>>) -> Self {
        self.roughness_texture = texture;
        self
    }

    pub fn with_normal_texture(mut self, texture: Arc<Image<Vec3>>, scale: f32) -> Self {
        self.normal_texture = texture;
        self.normal_scale = scale;
        self
    }

    pub fn with_emissive_texture(mut self, texture: Arc<Image<Spectrum>>) -> Self {
        self.emissive_texture = texture;
        self
    }

    /// Evaluate the textures at a UV coordinate.
    pub fn shading_params(&self, u: f32, v: f32) -> ShadingParams {
        ShadingParams {
            base_color: self.base_color_texture.sample_bilinear(u, v) * self.base_color_factor,
            roughness: (self.roughness_texture.sample_bilinear(u, v) * self.roughness_factor)
                .clamp(0.0, 1.0),
            metallic: (self.metallic_texture.sample_bilinear(u, v) * self.metallic_factor)
                .clamp(0.0, 1.0),
            opacity: 1.0,
        }
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive_factor.length_squared() > 0.0
    }

    /// Emitted radiance at a UV coordinate.
    pub fn emitted(&self, u: f32, v: f32) -> Spectrum {
        self.emissive_texture.sample_bilinear(u, v) * self.emissive_factor
    }

    /// Tangent-space shading normal from the normal map, decoded from the
    /// [0, 1] texture encoding and scaled in x/y by `normal_scale`.
    pub fn tangent_space_normal(&self, u: f32, v: f32) -> Vec3 {
        let encoded = self.normal_texture.sample_bilinear(u, v);
        let n = encoded * 2.0 - Vec3::ONE;
        Vec3::new(n.x * self.normal_scale, n.y * self.normal_scale, n.z).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let mat = Material::new(ShadingModel::Lambert);
        let params = mat.shading_params(0.3, 0.7);
        assert_eq!(params.base_color, Spectrum::ONE);
        assert!((params.roughness - 0.5).abs() < 1e-6);
        assert_eq!(params.metallic, 0.0);
        assert!(!mat.is_emissive());
    }

    #[test]
    fn test_factors_multiply_textures() {
        let mat = Material::new(ShadingModel::GgxMicrofacet)
            .with_base_color(Spectrum::new(0.5, 0.25, 1.0))
            .with_metallic(1.0)
            .with_roughness(0.8);
        let params = mat.shading_params(0.0, 0.0);
        assert_eq!(params.base_color, Spectrum::new(0.5, 0.25, 1.0));
        assert_eq!(params.metallic, 1.0);
        assert!((params.roughness - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_textured_base_color() {
        let texture = Arc::new(Image::constant(Spectrum::new(0.2, 0.4, 0.6)));
        let mat = Material::new(ShadingModel::Lambert).with_base_color_texture(texture);
        let params = mat.shading_params(0.5, 0.5);
        assert!((params.base_color - Spectrum::new(0.2, 0.4, 0.6)).length() < 1e-6);
    }

    #[test]
    fn test_emissive() {
        let mat = Material::new(ShadingModel::Lambert).with_emissive(Spectrum::splat(3.0));
        assert!(mat.is_emissive());
        assert!((mat.emitted(0.0, 0.0) - Spectrum::splat(3.0)).length() < 1e-6);
    }

    #[test]
    fn test_default_normal_map_is_unperturbed() {
        let mat = Material::new(ShadingModel::Lambert);
        let n = mat.tangent_space_normal(0.1, 0.9);
        assert!((n - Vec3::Z).length() < 1e-6);
    }
}
