//! Z-buffer triangle rasterizer with direct point-light accumulation.
//!
//! One pass per frame: every instance triangle is projected through the
//! camera model, covered pixels are depth-tested with perspective-correct
//! interpolation, and the surviving fragment is shaded by summing every
//! point light with no occlusion testing. Single bounce, no shadow rays,
//! no indirect transport.

use astra_core::view::{SceneView, ViewInstance};
use astra_core::Spectrum;
use astra_math::Transform;
use glam::{DVec2, DVec3, Vec3};
use log::debug;

use crate::bsdf::{bsdf_for, Interaction};
use crate::framebuffer::FrameBuffer;

/// Rasterizing renderer for mesh geometry.
#[derive(Default)]
pub struct RasterRenderer;

impl RasterRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a scene view into the frame buffer.
    ///
    /// The depth channel is required for the z-test and is enabled if
    /// missing; all other channels are written only while enabled. The frame
    /// buffer is not cleared here: callers own the clear so that multiple
    /// views can composite.
    pub fn render(&self, view: &SceneView, frame_buffer: &mut FrameBuffer) {
        frame_buffer.enable_depth();
        debug!(
            "rasterizing {} instances under {} lights into {}x{}",
            view.instances.len(),
            view.lights.len(),
            frame_buffer.width(),
            frame_buffer.height(),
        );
        let camera_from_world = view.camera.world.inverse();
        for instance in &view.instances {
            self.rasterize_instance(view, instance, &camera_from_world, frame_buffer);
        }
    }

    fn rasterize_instance(
        &self,
        view: &SceneView,
        instance: &ViewInstance,
        camera_from_world: &Transform,
        frame_buffer: &mut FrameBuffer,
    ) {
        let mesh = &instance.mesh;
        let camera_position = view.camera.world.translation;
        let width = frame_buffer.width();
        let height = frame_buffer.height();

        for triangle in mesh.indices.chunks_exact(3) {
            let idx = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];

            // Transform the triangle into world and camera space.
            let world: [DVec3; 3] = idx.map(|i| {
                instance
                    .world
                    .apply_to_point(mesh.positions[i].as_dvec3())
            });
            let camera: [DVec3; 3] = world.map(|p| camera_from_world.apply_to_point(p));

            // Project all three vertices; triangles crossing the camera
            // plane are dropped rather than clipped.
            let mut screen = [DVec2::ZERO; 3];
            let mut clipped = false;
            for (s, c) in screen.iter_mut().zip(camera.iter()) {
                match view.camera.model.project(*c) {
                    Some(p) => *s = p,
                    None => {
                        clipped = true;
                        break;
                    }
                }
            }
            if clipped {
                continue;
            }

            let area = edge(screen[0], screen[1], screen[2]);
            if area.abs() < 1e-12 {
                continue;
            }

            // Geometric normal and per-vertex shading normals in world
            // space. Normals transform by the inverse-transpose of the
            // linear part.
            let normal_g = (world[1] - world[0])
                .cross(world[2] - world[0])
                .normalize()
                .as_vec3();
            let normals: [Vec3; 3] = match &mesh.normals {
                Some(normals) => idx.map(|i| {
                    instance
                        .world
                        .apply_to_normal(normals[i].as_dvec3())
                        .normalize()
                        .as_vec3()
                }),
                None => [normal_g; 3],
            };
            let uvs: [[f32; 2]; 3] = match &mesh.uvs {
                Some(uvs) => idx.map(|i| uvs[i]),
                None => [[0.0, 0.0]; 3],
            };

            // Integer pixel bounding box, clamped to the image.
            let min_x = screen.iter().map(|s| s.x).fold(f64::INFINITY, f64::min);
            let max_x = screen.iter().map(|s| s.x).fold(f64::NEG_INFINITY, f64::max);
            let min_y = screen.iter().map(|s| s.y).fold(f64::INFINITY, f64::min);
            let max_y = screen.iter().map(|s| s.y).fold(f64::NEG_INFINITY, f64::max);
            if max_x < 0.0 || max_y < 0.0 || min_x >= width as f64 || min_y >= height as f64 {
                continue;
            }
            let x0 = min_x.floor().max(0.0) as usize;
            let x1 = (max_x.ceil() as usize).min(width - 1);
            let y0 = min_y.floor().max(0.0) as usize;
            let y1 = (max_y.ceil() as usize).min(height - 1);

            for y in y0..=y1 {
                for x in x0..=x1 {
                    let pixel = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);

                    // Barycentric coverage. Dividing by the signed area
                    // handles both windings; coordinates exactly on a shared
                    // edge are accepted for both adjacent triangles (no
                    // tie-break rule).
                    let l0 = edge(screen[1], screen[2], pixel) / area;
                    let l1 = edge(screen[2], screen[0], pixel) / area;
                    let l2 = edge(screen[0], screen[1], pixel) / area;
                    if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 {
                        continue;
                    }

                    // Perspective-correct depth.
                    let inv_z = l0 / camera[0].z + l1 / camera[1].z + l2 / camera[2].z;
                    if inv_z <= 0.0 {
                        continue;
                    }
                    let z = 1.0 / inv_z;

                    let depth = frame_buffer
                        .depth_mut()
                        .expect("depth channel enabled in render()");
                    if z as f32 >= depth.get(x, y) {
                        continue;
                    }
                    depth.set(x, y, z as f32);

                    // Perspective-correct attribute weights.
                    let w0 = (l0 / camera[0].z) * z;
                    let w1 = (l1 / camera[1].z) * z;
                    let w2 = (l2 / camera[2].z) * z;

                    let position = world[0] * w0 + world[1] * w1 + world[2] * w2;
                    let normal = (normals[0] * w0 as f32
                        + normals[1] * w1 as f32
                        + normals[2] * w2 as f32)
                        .normalize_or_zero();
                    let u = uvs[0][0] * w0 as f32 + uvs[1][0] * w1 as f32 + uvs[2][0] * w2 as f32;
                    let v = uvs[0][1] * w0 as f32 + uvs[1][1] * w1 as f32 + uvs[2][1] * w2 as f32;

                    let shaded = self.shade_fragment(
                        view,
                        instance,
                        position,
                        normal_g,
                        normal,
                        [u, v],
                        camera_position,
                    );

                    if let Some(channel) = frame_buffer.received_power_mut() {
                        channel.set(x, y, shaded.received_power);
                    }
                    if let Some(channel) = frame_buffer.radiance_mut() {
                        channel.set(x, y, shaded.radiance);
                    }
                    if let Some(channel) = frame_buffer.mesh_id_mut() {
                        channel.set(x, y, instance.node.index());
                    }
                    if let Some(channel) = frame_buffer.normal_world_mut() {
                        channel.set(x, y, shaded.normal);
                    }
                    if let Some(channel) = frame_buffer.normal_camera_mut() {
                        let camera_normal =
                            (camera_from_world.rotation * shaded.normal.as_dvec3()).as_vec3();
                        channel.set(x, y, camera_normal);
                    }
                }
            }
        }
    }

    /// Accumulate direct lighting at a fragment over every point light.
    #[allow(clippy::too_many_arguments)]
    fn shade_fragment(
        &self,
        view: &SceneView,
        instance: &ViewInstance,
        position: DVec3,
        normal_g: Vec3,
        normal: Vec3,
        uv: [f32; 2],
        camera_position: DVec3,
    ) -> ShadedFragment {
        let material = &instance.material;

        // Perturb the interpolated normal by the material's normal map in
        // the tangent frame around it.
        let tangent_normal = material.tangent_space_normal(uv[0], uv[1]);
        let (tangent, bitangent) = crate::sampling::orthonormal_basis(normal);
        let normal_s = (tangent * tangent_normal.x
            + bitangent * tangent_normal.y
            + normal * tangent_normal.z)
            .normalize_or_zero();

        let wo = (camera_position - position).normalize().as_vec3();
        let isect = Interaction {
            position: position.as_vec3(),
            normal_g,
            normal_s,
            uv,
            wo,
        };
        let params = material.shading_params(uv[0], uv[1]);
        let bsdf = bsdf_for(material.shading);

        let mut received_power = Spectrum::ZERO;
        let mut radiance = material.emitted(uv[0], uv[1]);
        for light in &view.lights {
            let to_light = light.position - position;
            let distance_squared = to_light.length_squared();
            if distance_squared <= 0.0 {
                continue;
            }
            let wi = (to_light / distance_squared.sqrt()).as_vec3();
            let irradiance = light.intensity / distance_squared as f32;
            let cos_theta = normal_s.dot(wi).max(0.0);
            received_power += irradiance * cos_theta;
            radiance += irradiance * bsdf.eval(wo, wi, &isect, &params) * cos_theta;
        }

        ShadedFragment {
            received_power,
            radiance,
            normal: normal_s,
        }
    }
}

struct ShadedFragment {
    received_power: Spectrum,
    radiance: Spectrum,
    normal: Vec3,
}

fn edge(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    (b - a).perp_dot(p - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_core::{
        CameraModel, FixedEphemeris, Material, Mesh, PointLight, Scene, ShadingModel, Time,
    };
    use std::f32::consts::PI;
    use std::sync::Arc;

    /// A unit-scale triangle at depth 5 facing the camera, lit by a point
    /// light colocated with the camera at the origin.
    fn triangle_scene(material: Material, intensity: Spectrum) -> (Scene, astra_core::NodeId) {
        let ephemeris = Arc::new(FixedEphemeris::new("J2000"));
        let mut scene = Scene::with_root(ephemeris, Time::from_et(0.0), "SSB", "J2000");
        let root = scene.root();

        let mesh = Arc::new(Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 5.0),
                Vec3::new(1.0, -1.0, 5.0),
                Vec3::new(0.0, 1.0, 5.0),
            ],
            vec![0, 1, 2],
            Some(vec![Vec3::NEG_Z; 3]),
        ));
        scene
            .new_instance(root, mesh, Arc::new(material))
            .unwrap();
        scene
            .new_point_light(root, PointLight::new(intensity))
            .unwrap();
        let camera = scene
            .new_camera(root, CameraModel::new(64, 64, 64.0))
            .unwrap();
        (scene, camera)
    }

    #[test]
    fn test_single_triangle_end_to_end() {
        let intensity = Spectrum::splat(100.0);
        let (scene, camera) =
            triangle_scene(Material::new(ShadingModel::Lambert), intensity);
        let view = scene.view(camera).unwrap();

        let mut fb = FrameBuffer::new(64, 64);
        fb.enable_mesh_id();
        RasterRenderer::new().render(&view, &mut fb);

        // The projected centroid lands at the image center.
        let (cx, cy) = (32, 32);
        let depth = fb.depth().unwrap().get(cx, cy);
        assert!(
            (depth - 5.0).abs() < 1e-3,
            "expected depth 5, got {depth}"
        );

        // Received power is Li * cos(theta) with Li = I / r^2; at the
        // center pixel r ~ 5 and cos(theta) ~ 1.
        let power = fb.received_power().unwrap().get(cx, cy);
        let expected = intensity.x / 25.0;
        assert!(
            (power.x - expected).abs() / expected < 0.01,
            "expected power ~{expected}, got {}",
            power.x
        );

        // Instance node id is recorded for covered pixels.
        assert_ne!(fb.mesh_id().unwrap().get(cx, cy), 0);

        // Pixels outside the projected bounding box keep the clear values.
        for (x, y) in [(0, 0), (63, 63), (5, 60)] {
            assert_eq!(fb.depth().unwrap().get(x, y), f32::INFINITY);
            assert_eq!(fb.received_power().unwrap().get(x, y), Spectrum::ZERO);
            assert_eq!(fb.mesh_id().unwrap().get(x, y), 0);
        }
    }

    #[test]
    fn test_radiance_applies_lambert_brdf() {
        let intensity = Spectrum::splat(50.0);
        let albedo = Spectrum::new(0.8, 0.4, 0.2);
        let material = Material::new(ShadingModel::Lambert).with_base_color(albedo);
        let (scene, camera) = triangle_scene(material, intensity);
        let view = scene.view(camera).unwrap();

        let mut fb = FrameBuffer::new(64, 64);
        RasterRenderer::new().render(&view, &mut fb);

        let radiance = fb.radiance().unwrap().get(32, 32);
        let expected = (intensity / 25.0) * albedo / PI;
        assert!(
            (radiance - expected).length() / expected.length() < 0.02,
            "expected {expected:?}, got {radiance:?}"
        );
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let ephemeris = Arc::new(FixedEphemeris::new("J2000"));
        let mut scene = Scene::with_root(ephemeris, Time::from_et(0.0), "SSB", "J2000");
        let root = scene.root();
        let material = Arc::new(Material::new(ShadingModel::Lambert));

        // Two full-frame quads at different depths.
        for depth in [10.0f32, 4.0] {
            let mesh = Arc::new(Mesh::new(
                vec![
                    Vec3::new(-10.0, -10.0, depth),
                    Vec3::new(10.0, -10.0, depth),
                    Vec3::new(0.0, 10.0, depth),
                ],
                vec![0, 1, 2],
                Some(vec![Vec3::NEG_Z; 3]),
            ));
            scene
                .new_instance(root, mesh, Arc::clone(&material))
                .unwrap();
        }
        scene
            .new_point_light(root, PointLight::new(Spectrum::ONE))
            .unwrap();
        let camera = scene
            .new_camera(root, CameraModel::new(32, 32, 32.0))
            .unwrap();

        let view = scene.view(camera).unwrap();
        let mut fb = FrameBuffer::new(32, 32);
        RasterRenderer::new().render(&view, &mut fb);
        assert!((fb.depth().unwrap().get(16, 16) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_normal_channels() {
        let (scene, camera) = triangle_scene(
            Material::new(ShadingModel::Lambert),
            Spectrum::ONE,
        );
        let view = scene.view(camera).unwrap();

        let mut fb = FrameBuffer::new(64, 64);
        fb.enable_normal_world();
        fb.enable_normal_camera();
        RasterRenderer::new().render(&view, &mut fb);

        let n = fb.normal_world().unwrap().get(32, 32);
        assert!((n - Vec3::NEG_Z).length() < 1e-4);
        // Identity camera pose: camera-space normal matches world space.
        let nc = fb.normal_camera().unwrap().get(32, 32);
        assert!((nc - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_behind_camera_geometry_dropped() {
        let ephemeris = Arc::new(FixedEphemeris::new("J2000"));
        let mut scene = Scene::with_root(ephemeris, Time::from_et(0.0), "SSB", "J2000");
        let root = scene.root();
        let mesh = Arc::new(Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, -5.0),
                Vec3::new(1.0, -1.0, -5.0),
                Vec3::new(0.0, 1.0, -5.0),
            ],
            vec![0, 1, 2],
            Some(vec![Vec3::Z; 3]),
        ));
        scene
            .new_instance(root, mesh, Arc::new(Material::new(ShadingModel::Lambert)))
            .unwrap();
        let camera = scene
            .new_camera(root, CameraModel::new(16, 16, 16.0))
            .unwrap();

        let view = scene.view(camera).unwrap();
        let mut fb = FrameBuffer::new(16, 16);
        RasterRenderer::new().render(&view, &mut fb);
        assert!(fb
            .depth()
            .unwrap()
            .pixels()
            .iter()
            .all(|&d| d == f32::INFINITY));
    }
}
