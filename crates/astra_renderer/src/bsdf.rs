//! BSDF models and the surface interaction they evaluate against.
//!
//! All directions are unit vectors in world space; the [`Interaction`]
//! supplies the shading tangent frame. BSDFs are stateless: spatially
//! varying inputs arrive through [`ShadingParams`], so a single instance per
//! model is shared across every material in the scene.

use std::f32::consts::PI;

use astra_core::material::{ShadingModel, ShadingParams};
use astra_core::Spectrum;
use glam::Vec3;

use crate::sampling::{
    cosine_hemisphere, ggx_d, ggx_vndf_pdf, ggx_vndf_sample, local_to_world, orthonormal_basis,
    reflect, smith_g1, world_to_local,
};

/// Roughness floor preventing the specular lobe from collapsing to a delta.
const MIN_ROUGHNESS: f32 = 0.01;

/// Surface interaction at a shaded point.
#[derive(Clone, Copy, Debug)]
pub struct Interaction {
    /// Intersection point in world space
    pub position: Vec3,
    /// Geometric (face) normal
    pub normal_g: Vec3,
    /// Shading normal (interpolated, possibly normal-mapped)
    pub normal_s: Vec3,
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Outgoing direction (towards the camera)
    pub wo: Vec3,
}

impl Interaction {
    /// Tangent frame around the shading normal: (tangent, bitangent, normal).
    pub fn tangent_frame(&self) -> (Vec3, Vec3, Vec3) {
        let (tangent, bitangent) = orthonormal_basis(self.normal_s);
        (tangent, bitangent, self.normal_s)
    }
}

/// Result of importance-sampling a BSDF.
///
/// `value` is pre-weighted: f(wo, wi) * |cos(theta_i)| / pdf. The caller
/// accumulates `value * Li` directly without re-deriving the pdf.
#[derive(Clone, Copy, Debug)]
pub struct BsdfSample {
    pub wi: Vec3,
    pub value: Spectrum,
    pub pdf: f32,
}

impl BsdfSample {
    pub const INVALID: Self = Self {
        wi: Vec3::ZERO,
        value: Spectrum::ZERO,
        pdf: 0.0,
    };

    pub fn is_valid(&self) -> bool {
        self.pdf > 0.0
    }
}

/// Local light-reflection model at a surface point.
pub trait Bsdf: Send + Sync {
    /// Evaluate f(wo, wi). Does NOT include the cosine foreshortening term.
    fn eval(&self, wo: Vec3, wi: Vec3, isect: &Interaction, params: &ShadingParams) -> Spectrum;

    /// Importance-sample an incoming direction.
    fn sample(
        &self,
        wo: Vec3,
        isect: &Interaction,
        params: &ShadingParams,
        u1: f32,
        u2: f32,
    ) -> BsdfSample;

    /// Probability density of sampling `wi` given `wo`, consistent with
    /// `sample()`. Solid angle measure.
    fn pdf(&self, wo: Vec3, wi: Vec3, isect: &Interaction, params: &ShadingParams) -> f32;
}

/// The shared BSDF instance for a shading model.
pub fn bsdf_for(model: ShadingModel) -> &'static dyn Bsdf {
    static LAMBERT: LambertBsdf = LambertBsdf;
    static GGX: GgxBsdf = GgxBsdf;
    match model {
        ShadingModel::Lambert => &LAMBERT,
        ShadingModel::GgxMicrofacet => &GGX,
    }
}

/// Lambertian (perfectly diffuse) BSDF: f = base_color / pi.
pub struct LambertBsdf;

impl Bsdf for LambertBsdf {
    fn eval(&self, wo: Vec3, wi: Vec3, isect: &Interaction, params: &ShadingParams) -> Spectrum {
        let n = isect.normal_s;
        if n.dot(wo) <= 0.0 || n.dot(wi) <= 0.0 {
            return Spectrum::ZERO;
        }
        params.base_color / PI
    }

    fn sample(
        &self,
        wo: Vec3,
        isect: &Interaction,
        params: &ShadingParams,
        u1: f32,
        u2: f32,
    ) -> BsdfSample {
        let (tangent, bitangent, normal) = isect.tangent_frame();
        if normal.dot(wo) <= 0.0 {
            return BsdfSample::INVALID;
        }
        let hemisphere = cosine_hemisphere(u1, u2);
        if hemisphere.pdf <= 0.0 {
            return BsdfSample::INVALID;
        }
        // f * cos / pdf = (base/pi) * cos / (cos/pi) = base, exactly.
        BsdfSample {
            wi: local_to_world(hemisphere.direction, tangent, bitangent, normal),
            value: params.base_color,
            pdf: hemisphere.pdf,
        }
    }

    fn pdf(&self, wo: Vec3, wi: Vec3, isect: &Interaction, _params: &ShadingParams) -> f32 {
        let n = isect.normal_s;
        let cos_i = n.dot(wi);
        if n.dot(wo) <= 0.0 || cos_i <= 0.0 {
            return 0.0;
        }
        cos_i / PI
    }
}

/// GGX microfacet BSDF with metallic-roughness parameterization.
///
/// f(wo, wi) = D(h) * F(wo, h) * G(wo, wi) / (4 |cos_o| |cos_i|)
///           + (1 - metallic) * base_color / pi
///
/// D is Trowbridge-Reitz with alpha = roughness^2, G the Smith product of
/// two single-direction terms, F the Schlick approximation with
/// f0 = lerp(0.04, base_color, metallic). Sampling mixes a VNDF specular
/// lobe with a cosine diffuse lobe via one-sample MIS.
pub struct GgxBsdf;

impl GgxBsdf {
    fn alpha(params: &ShadingParams) -> f32 {
        let roughness = params.roughness.max(MIN_ROUGHNESS);
        roughness * roughness
    }

    fn fresnel_f0(params: &ShadingParams) -> Spectrum {
        Spectrum::splat(0.04).lerp(params.base_color, params.metallic)
    }

    fn schlick_fresnel(f0: Spectrum, cos_theta: f32) -> Spectrum {
        let x = (1.0 - cos_theta).clamp(0.0, 1.0);
        let x2 = x * x;
        f0 + (Spectrum::ONE - f0) * (x2 * x2 * x)
    }

    /// Probability of picking the specular lobe in the one-sample MIS.
    fn specular_weight(params: &ShadingParams) -> f32 {
        0.5 * (1.0 + params.metallic)
    }
}

impl Bsdf for GgxBsdf {
    fn eval(&self, wo: Vec3, wi: Vec3, isect: &Interaction, params: &ShadingParams) -> Spectrum {
        let n = isect.normal_s;
        let cos_o = n.dot(wo);
        let cos_i = n.dot(wi);
        if cos_o <= 0.0 || cos_i <= 0.0 {
            return Spectrum::ZERO;
        }

        let half = wo + wi;
        if half.length_squared() <= 1e-12 {
            return Spectrum::ZERO;
        }
        let half = half.normalize();

        let alpha = Self::alpha(params);
        let alpha2 = alpha * alpha;
        let d = ggx_d(n.dot(half).max(0.0), alpha2);
        let g = smith_g1(cos_o, alpha2) * smith_g1(cos_i, alpha2);
        let f = Self::schlick_fresnel(Self::fresnel_f0(params), wo.dot(half).max(0.0));

        let specular = f * (d * g / (4.0 * cos_o * cos_i).max(1e-8));
        let diffuse = params.base_color * ((1.0 - params.metallic) / PI);
        specular + diffuse
    }

    fn sample(
        &self,
        wo: Vec3,
        isect: &Interaction,
        params: &ShadingParams,
        u1: f32,
        u2: f32,
    ) -> BsdfSample {
        let (tangent, bitangent, normal) = isect.tangent_frame();
        let wo_local = world_to_local(wo, tangent, bitangent, normal);
        if wo_local.z <= 0.0 {
            return BsdfSample::INVALID;
        }

        let alpha = Self::alpha(params);
        let spec_weight = Self::specular_weight(params);

        // One-sample MIS: reuse u1 to pick the lobe, then rescale it.
        let wi_local = if u1 < spec_weight {
            let u1 = u1 / spec_weight;
            let half = ggx_vndf_sample(wo_local, alpha, u1, u2);
            let wi = reflect(-wo_local, half);
            if wi.z <= 0.0 {
                return BsdfSample::INVALID;
            }
            wi
        } else {
            let u1 = (u1 - spec_weight) / (1.0 - spec_weight);
            cosine_hemisphere(u1, u2).direction
        };

        let wi = local_to_world(wi_local, tangent, bitangent, normal);
        let pdf = self.pdf(wo, wi, isect, params);
        if pdf <= 1e-8 {
            return BsdfSample::INVALID;
        }
        let cos_i = normal.dot(wi).max(0.0);
        BsdfSample {
            wi,
            value: self.eval(wo, wi, isect, params) * (cos_i / pdf),
            pdf,
        }
    }

    fn pdf(&self, wo: Vec3, wi: Vec3, isect: &Interaction, params: &ShadingParams) -> f32 {
        let (tangent, bitangent, normal) = isect.tangent_frame();
        let wo_local = world_to_local(wo, tangent, bitangent, normal);
        let wi_local = world_to_local(wi, tangent, bitangent, normal);
        if wo_local.z <= 0.0 || wi_local.z <= 0.0 {
            return 0.0;
        }

        let half = wo_local + wi_local;
        if half.length_squared() <= 1e-12 {
            return 0.0;
        }
        let half = half.normalize();

        let alpha = Self::alpha(params);
        let spec_weight = Self::specular_weight(params);

        // Half-vector pdf converted to solid angle via the reflection
        // Jacobian 1 / (4 wo.h).
        let wo_dot_h = wo_local.dot(half).max(1e-8);
        let pdf_specular = ggx_vndf_pdf(wo_local, half, alpha) / (4.0 * wo_dot_h);
        let pdf_diffuse = wi_local.z / PI;

        spec_weight * pdf_specular + (1.0 - spec_weight) * pdf_diffuse
    }
}
