//! Multi-channel frame buffer.
//!
//! Channels are independently enabled: disabling drops the backing image,
//! enabling allocates it filled with the channel's default value. `clear()`
//! resets every enabled channel to its default.

use astra_core::{Image, Spectrum};
use glam::Vec3;

/// Default depth for uncovered pixels.
pub const DEPTH_CLEAR: f32 = f32::INFINITY;

/// Mesh-id value for uncovered pixels. Node ids never collide with it: the
/// scene root (id 0) is a frame node, never an instance.
pub const MESH_ID_CLEAR: u32 = 0;

/// A fixed-resolution set of optional render channels.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    depth: Option<Image<f32>>,
    mesh_id: Option<Image<u32>>,
    normal_camera: Option<Image<Vec3>>,
    normal_world: Option<Image<Vec3>>,
    received_power: Option<Image<Spectrum>>,
    radiance: Option<Image<Spectrum>>,
    response: Option<Image<Spectrum>>,
}

impl FrameBuffer {
    /// Create a frame buffer with the depth, received-power, and radiance
    /// channels enabled; the other channels are opt-in.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depth: Some(Image::filled(width, height, DEPTH_CLEAR)),
            mesh_id: None,
            normal_camera: None,
            normal_world: None,
            received_power: Some(Image::filled(width, height, Spectrum::ZERO)),
            radiance: Some(Image::filled(width, height, Spectrum::ZERO)),
            response: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every enabled channel to its default value.
    pub fn clear(&mut self) {
        if let Some(c) = &mut self.depth {
            c.fill(DEPTH_CLEAR);
        }
        if let Some(c) = &mut self.mesh_id {
            c.fill(MESH_ID_CLEAR);
        }
        if let Some(c) = &mut self.normal_camera {
            c.fill(Vec3::ZERO);
        }
        if let Some(c) = &mut self.normal_world {
            c.fill(Vec3::ZERO);
        }
        if let Some(c) = &mut self.received_power {
            c.fill(Spectrum::ZERO);
        }
        if let Some(c) = &mut self.radiance {
            c.fill(Spectrum::ZERO);
        }
        if let Some(c) = &mut self.response {
            c.fill(Spectrum::ZERO);
        }
    }

    pub fn enable_depth(&mut self) {
        if self.depth.is_none() {
            self.depth = Some(Image::filled(self.width, self.height, DEPTH_CLEAR));
        }
    }

    pub fn disable_depth(&mut self) {
        self.depth = None;
    }

    pub fn depth(&self) -> Option<&Image<f32>> {
        self.depth.as_ref()
    }

    pub fn depth_mut(&mut self) -> Option<&mut Image<f32>> {
        self.depth.as_mut()
    }

    pub fn enable_mesh_id(&mut self) {
        if self.mesh_id.is_none() {
            self.mesh_id = Some(Image::filled(self.width, self.height, MESH_ID_CLEAR));
        }
    }

    pub fn disable_mesh_id(&mut self) {
        self.mesh_id = None;
    }

    pub fn mesh_id(&self) -> Option<&Image<u32>> {
        self.mesh_id.as_ref()
    }

    pub fn mesh_id_mut(&mut self) -> Option<&mut Image<u32>> {
        self.mesh_id.as_mut()
    }

    pub fn enable_normal_camera(&mut self) {
        if self.normal_camera.is_none() {
            self.normal_camera = Some(Image::filled(self.width, self.height, Vec3::ZERO));
        }
    }

    pub fn disable_normal_camera(&mut self) {
        self.normal_camera = None;
    }

    pub fn normal_camera(&self) -> Option<&Image<Vec3>> {
        self.normal_camera.as_ref()
    }

    pub fn normal_camera_mut(&mut self) -> Option<&mut Image<Vec3>> {
        self.normal_camera.as_mut()
    }

    pub fn enable_normal_world(&mut self) {
        if self.normal_world.is_none() {
            self.normal_world = Some(Image::filled(self.width, self.height, Vec3::ZERO));
        }
    }

    pub fn disable_normal_world(&mut self) {
        self.normal_world = None;
    }

    pub fn normal_world(&self) -> Option<&Image<Vec3>> {
        self.normal_world.as_ref()
    }

    pub fn normal_world_mut(&mut self) -> Option<&mut Image<Vec3>> {
        self.normal_world.as_mut()
    }

    pub fn enable_received_power(&mut self) {
        if self.received_power.is_none() {
            self.received_power = Some(Image::filled(self.width, self.height, Spectrum::ZERO));
        }
    }

    pub fn disable_received_power(&mut self) {
        self.received_power = None;
    }

    pub fn received_power(&self) -> Option<&Image<Spectrum>> {
        self.received_power.as_ref()
    }

    pub fn received_power_mut(&mut self) -> Option<&mut Image<Spectrum>> {
        self.received_power.as_mut()
    }

    pub fn enable_radiance(&mut self) {
        if self.radiance.is_none() {
            self.radiance = Some(Image::filled(self.width, self.height, Spectrum::ZERO));
        }
    }

    pub fn disable_radiance(&mut self) {
        self.radiance = None;
    }

    pub fn radiance(&self) -> Option<&Image<Spectrum>> {
        self.radiance.as_ref()
    }

    pub fn radiance_mut(&mut self) -> Option<&mut Image<Spectrum>> {
        self.radiance.as_mut()
    }

    pub fn enable_response(&mut self) {
        if self.response.is_none() {
            self.response = Some(Image::filled(self.width, self.height, Spectrum::ZERO));
        }
    }

    pub fn disable_response(&mut self) {
        self.response = None;
    }

    pub fn response(&self) -> Option<&Image<Spectrum>> {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> Option<&mut Image<Spectrum>> {
        self.response.as_mut()
    }
}
