//! Render a small asteroid-flyby style scene and save the sensor response.
//!
//! Builds a table-backed ephemeris, parents an octahedron "asteroid" to a
//! body track, renders it from a chase camera, runs the sensor readout, and
//! writes a PNG.

use std::sync::Arc;

use anyhow::Result;
use astra_core::{
    CameraModel, FixedEphemeris, Material, Mesh, PointLight, Scene, ShadingModel, Spectrum, Time,
};
use astra_math::{DVec3, Vec3};
use astra_renderer::{FrameBuffer, RasterRenderer, SensorConfig, SensorModel, SimpleSensor};

fn octahedron(radius: f32) -> Mesh {
    let positions = vec![
        Vec3::new(radius, 0.0, 0.0),
        Vec3::new(-radius, 0.0, 0.0),
        Vec3::new(0.0, radius, 0.0),
        Vec3::new(0.0, -radius, 0.0),
        Vec3::new(0.0, 0.0, radius),
        Vec3::new(0.0, 0.0, -radius),
    ];
    let indices = vec![
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, 2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
    ];
    let mut mesh = Mesh::new(positions, indices, None);
    mesh.compute_normals();
    mesh
}

fn main() -> Result<()> {
    env_logger::init();

    let ephemeris = Arc::new(
        FixedEphemeris::new("J2000")
            .with_body("SSB", DVec3::ZERO, DVec3::ZERO)
            .with_body("SUN", DVec3::ZERO, DVec3::ZERO)
            .with_body(
                "ASTEROID",
                DVec3::new(0.0, 0.0, 400.0),
                DVec3::new(2.0, 0.0, 0.0),
            ),
    );
    let mut scene = Scene::with_root(ephemeris, Time::from_et(0.0), "SSB", "J2000");
    let root = scene.root();

    // The asteroid tracks its ephemeris body; the camera and sun stay put.
    let asteroid = scene.new_frame(root)?;
    scene.set_spice_origin(asteroid, "ASTEROID")?;
    let material = Arc::new(
        Material::new(ShadingModel::GgxMicrofacet)
            .with_base_color(Spectrum::new(0.55, 0.5, 0.45))
            .with_roughness(0.9),
    );
    scene.new_instance(asteroid, Arc::new(octahedron(60.0)), material)?;

    // Intensity tuned to land mid-range in the sensor's full well at the
    // 50 ms exposure below.
    let sun = scene.new_point_light(root, PointLight::new(Spectrum::splat(2.0e-7)))?;
    scene.set_position(sun, DVec3::new(500.0, 800.0, -200.0))?;

    let camera = scene.new_camera(root, CameraModel::new(512, 512, 600.0))?;

    let mut frame_buffer = FrameBuffer::new(512, 512);
    let renderer = RasterRenderer::new();
    let sensor = SimpleSensor::new(SensorConfig::default());

    // Advance time, then lock the scene for the duration of the frame.
    scene.set_time(Time::from_et(20.0))?;
    let guard = scene.render_guard();
    let view = guard.view(camera)?;
    renderer.render(&view, &mut frame_buffer);
    drop(guard);

    sensor.readout(&mut frame_buffer, 0.05, Some(1234))?;

    let response = frame_buffer.response().expect("readout enables response");
    let mut out = image::RgbImage::new(512, 512);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let value = response.get(x as usize, y as usize);
        *pixel = image::Rgb([
            (value.x * 255.0) as u8,
            (value.y * 255.0) as u8,
            (value.z * 255.0) as u8,
        ]);
    }
    out.save("render_demo.png")?;
    println!("wrote render_demo.png");
    Ok(())
}
