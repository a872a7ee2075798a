//! Hemisphere and microfacet sampling in the local shading frame.
//!
//! Local convention: +Z is the shading normal, +X the tangent, +Y the
//! bitangent. All inputs `u1`, `u2` are uniform random numbers in [0, 1).

use std::f32::consts::PI;

use glam::Vec3;

/// Result of a hemisphere sampling operation.
#[derive(Clone, Copy, Debug)]
pub struct HemisphereSample {
    /// Sampled direction in local space (+Z = normal)
    pub direction: Vec3,
    /// Probability density of the sample (solid angle measure)
    pub pdf: f32,
}

/// Cosine-weighted hemisphere sampling (Malley's method).
/// PDF = cos(theta) / pi
pub fn cosine_hemisphere(u1: f32, u2: f32) -> HemisphereSample {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let z = (1.0 - u1).max(0.0).sqrt();
    HemisphereSample {
        direction: Vec3::new(r * phi.cos(), r * phi.sin(), z),
        pdf: z / PI,
    }
}

/// GGX (Trowbridge-Reitz) normal distribution.
pub fn ggx_d(n_dot_h: f32, alpha2: f32) -> f32 {
    let denom = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * denom * denom).max(1e-12)
}

/// Smith single-direction masking term: 2 / (1 + sqrt(1 + a^2 tan^2)).
pub fn smith_g1(cos_theta: f32, alpha2: f32) -> f32 {
    let cos2 = cos_theta * cos_theta;
    if cos2 <= 0.0 {
        return 0.0;
    }
    let tan2 = (1.0 - cos2) / cos2;
    2.0 / (1.0 + (1.0 + alpha2 * tan2).sqrt())
}

/// Sample a visible GGX microfacet normal (Heitz 2018).
///
/// Significantly lower variance than sampling D(h) directly, especially at
/// grazing angles. `wo` must lie in the upper hemisphere.
pub fn ggx_vndf_sample(wo: Vec3, alpha: f32, u1: f32, u2: f32) -> Vec3 {
    // Stretch the view direction into the hemisphere configuration.
    let vh = Vec3::new(alpha * wo.x, alpha * wo.y, wo.z).normalize();

    // Orthonormal basis around vh.
    let len2 = vh.x * vh.x + vh.y * vh.y;
    let t1 = if len2 > 1e-7 {
        Vec3::new(-vh.y, vh.x, 0.0) / len2.sqrt()
    } else {
        Vec3::X
    };
    let t2 = vh.cross(t1);

    // Sample a disk, warped toward the projected hemisphere.
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let p1 = r * phi.cos();
    let mut p2 = r * phi.sin();
    let s = 0.5 * (1.0 + vh.z);
    p2 = (1.0 - s) * (1.0 - p1 * p1).max(0.0).sqrt() + s * p2;

    let nh = p1 * t1 + p2 * t2 + (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt() * vh;

    // Unstretch back to the ellipsoid configuration.
    Vec3::new(alpha * nh.x, alpha * nh.y, nh.z.max(0.0)).normalize()
}

/// PDF of `ggx_vndf_sample` with respect to the half-vector solid angle:
/// D(h) * G1(wo) * max(0, wo.h) / wo.z.
pub fn ggx_vndf_pdf(wo: Vec3, h: Vec3, alpha: f32) -> f32 {
    let alpha2 = alpha * alpha;
    let d = ggx_d(h.z, alpha2);
    let g1 = smith_g1(wo.z, alpha2);
    d * g1 * wo.dot(h).max(0.0) / wo.z.abs().max(1e-8)
}

/// Reflect `v` about a normal `n`.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Build an orthonormal basis from a unit normal (branchless).
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}

/// Transform a direction from the local shading frame to world space.
pub fn local_to_world(local: Vec3, tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Vec3 {
    tangent * local.x + bitangent * local.y + normal * local.z
}

/// Transform a direction from world space to the local shading frame.
pub fn world_to_local(world: Vec3, tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Vec3 {
    Vec3::new(world.dot(tangent), world.dot(bitangent), world.dot(normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_cosine_hemisphere_properties() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = cosine_hemisphere(rng.gen(), rng.gen());
            assert!((s.direction.length() - 1.0).abs() < 1e-5);
            assert!(s.direction.z >= 0.0);
            assert!((s.pdf - s.direction.z / PI).abs() < 1e-6);
        }
    }

    #[test]
    fn test_smith_g1_bounds() {
        // Head-on view is never shadowed.
        assert!((smith_g1(1.0, 0.25) - 1.0).abs() < 1e-6);
        // Grazing view is fully shadowed.
        assert_eq!(smith_g1(0.0, 0.25), 0.0);
        let g = smith_g1(0.5, 0.25);
        assert!(g > 0.0 && g < 1.0);
    }

    #[test]
    fn test_vndf_samples_upper_hemisphere() {
        let mut rng = StdRng::seed_from_u64(11);
        let wo = Vec3::new(0.4, -0.2, 0.8).normalize();
        for _ in 0..100 {
            let h = ggx_vndf_sample(wo, 0.3, rng.gen(), rng.gen());
            assert!((h.length() - 1.0).abs() < 1e-5);
            assert!(h.z >= 0.0);
            assert!(ggx_vndf_pdf(wo, h, 0.3) > 0.0);
        }
    }

    #[test]
    fn test_vndf_smooth_surface_returns_normal() {
        let wo = Vec3::new(0.3, 0.1, 0.95).normalize();
        let h = ggx_vndf_sample(wo, 1e-4, 0.4, 0.6);
        assert!((h - Vec3::Z).length() < 1e-2);
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(v, Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_orthonormal_basis() {
        for n in [
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.6, -0.48, 0.64),
        ] {
            let (t, b) = orthonormal_basis(n);
            assert!(t.dot(n).abs() < 1e-6);
            assert!(b.dot(n).abs() < 1e-6);
            assert!(t.dot(b).abs() < 1e-6);
            assert!((t.length() - 1.0).abs() < 1e-6);
            assert!((b.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_local_world_round_trip() {
        let n = Vec3::new(0.6, -0.48, 0.64);
        let (t, b) = orthonormal_basis(n);
        let d = Vec3::new(0.3, -0.9, 0.32).normalize();
        let local = world_to_local(d, t, b, n);
        let back = local_to_world(local, t, b, n);
        assert!((back - d).length() < 1e-5);
    }
}
