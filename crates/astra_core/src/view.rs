//! Flattened render snapshots of the scene graph.

use std::sync::Arc;

use astra_math::{Aabb, Transform};
use glam::DVec3;
use log::debug;

use crate::camera::CameraModel;
use crate::error::SceneError;
use crate::image::Spectrum;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::{NodeId, NodePayload, Scene};

/// A renderable instance with its resolved world transform.
pub struct ViewInstance {
    pub node: NodeId,
    pub mesh: Arc<Mesh>,
    pub material: Arc<Material>,
    pub world: Transform,
}

/// A point light with its resolved world position.
pub struct ViewLight {
    pub position: DVec3,
    pub intensity: Spectrum,
}

/// The camera with its resolved world pose (camera-to-world).
pub struct ViewCamera {
    pub model: CameraModel,
    pub world: Transform,
}

/// Everything a renderer needs for one frame, resolved into the scene root
/// frame. Snapshots borrow nothing from the scene: meshes and materials are
/// shared `Arc`s and transforms are copied, so a view stays valid while the
/// host keeps mutating the scene afterwards.
pub struct SceneView {
    pub instances: Vec<ViewInstance>,
    pub lights: Vec<ViewLight>,
    pub camera: ViewCamera,
}

impl Scene {
    /// Flatten the scene into a render snapshot for the given camera node.
    pub fn view(&self, camera: NodeId) -> Result<SceneView, SceneError> {
        let model = match self.payload(camera)? {
            NodePayload::Camera(model) => model.clone(),
            _ => return Err(SceneError::NotACamera { node: camera }),
        };
        let camera_world = self.global_transform(camera)?;

        let mut instances = Vec::new();
        let mut lights = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            stack.extend_from_slice(self.children(id)?);
            match self.payload(id)? {
                NodePayload::Instance { mesh, material } => instances.push(ViewInstance {
                    node: id,
                    mesh: Arc::clone(mesh),
                    material: Arc::clone(material),
                    world: self.global_transform(id)?,
                }),
                NodePayload::Light(light) => lights.push(ViewLight {
                    position: self.global_position(id)?,
                    intensity: light.intensity,
                }),
                NodePayload::Frame | NodePayload::Camera(_) => {}
            }
        }
        debug!(
            "scene view: {} instances, {} lights",
            instances.len(),
            lights.len()
        );
        Ok(SceneView {
            instances,
            lights,
            camera: ViewCamera {
                model,
                world: camera_world,
            },
        })
    }
}

impl SceneView {
    /// World-space bounding box of all instanced geometry.
    pub fn world_bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for instance in &self.instances {
            if instance.mesh.bounds.is_empty() {
                continue;
            }
            for corner in instance.mesh.bounds.corners() {
                let world = instance.world.apply_to_point(corner.as_dvec3());
                bounds.grow(world.as_vec3());
            }
        }
        bounds
    }
}
