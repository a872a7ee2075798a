//! Scene graph with ephemeris- and manually-driven transforms.
//!
//! Nodes live in an arena owned by the [`Scene`] and are addressed by stable
//! [`NodeId`]s; parent/child links are id fields, never pointers. Each node
//! tracks, independently for its translational and rotational degrees of
//! freedom, whether the transform is set by hand or resolved from the
//! ephemeris service. The source tags are the single source of truth; the
//! `spice_origin`/`spice_frame` strings are payload that is only meaningful
//! while the corresponding tag says `Ephemeris`.
//!
//! An ephemeris-driven subtree must stay rooted under ephemeris-driven
//! ancestors: binding a node to the ephemeris requires the parent's matching
//! axis to already be ephemeris-driven, and switching a node back to manual
//! placement is rejected while any descendant still depends on the
//! ephemeris through it.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use astra_math::{DVec3, Rotation, Transform};
use log::debug;

use crate::camera::CameraModel;
use crate::ephemeris::Ephemeris;
use crate::error::SceneError;
use crate::light::PointLight;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::time::Time;

pub const DEFAULT_ROOT_ORIGIN: &str = "SOLAR SYSTEM BARYCENTER";
pub const DEFAULT_ROOT_FRAME: &str = "J2000";

type Result<T> = std::result::Result<T, SceneError>;

/// Stable identifier of a node within its scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a node's transform component comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformSource {
    /// Set by the host through the scene API.
    Manual,
    /// Resolved from the ephemeris service on demand.
    Ephemeris,
}

/// A translational or rotational degree of freedom; the two are tracked
/// independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DofAxis {
    Position,
    Rotation,
}

impl fmt::Display for DofAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DofAxis::Position => write!(f, "position"),
            DofAxis::Rotation => write!(f, "rotation"),
        }
    }
}

/// What a node contributes to rendering beyond its transform.
pub enum NodePayload {
    /// Pure coordinate frame; groups children.
    Frame,
    /// Renderable geometry with a material.
    Instance {
        mesh: Arc<Mesh>,
        material: Arc<Material>,
    },
    /// Point light source.
    Light(PointLight),
    /// Camera intrinsics; the node transform is the camera pose.
    Camera(CameraModel),
}

impl NodePayload {
    fn type_name(&self) -> &'static str {
        match self {
            NodePayload::Frame => "frame",
            NodePayload::Instance { .. } => "instance",
            NodePayload::Light(_) => "light",
            NodePayload::Camera(_) => "camera",
        }
    }
}

struct Node {
    local: Transform,
    global: Transform,
    position_source: TransformSource,
    rotation_source: TransformSource,
    spice_origin: String,
    spice_frame: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    payload: NodePayload,
}

/// The scene: node arena, ephemeris binding, current time, and the render
/// lock state.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    ephemeris: Arc<dyn Ephemeris>,
    time: Time,
    locked: bool,
    root_origin: String,
    root_frame: String,
}

impl Scene {
    /// Create a scene rooted at the default inertial origin and frame.
    pub fn new(ephemeris: Arc<dyn Ephemeris>, time: Time) -> Self {
        Self::with_root(ephemeris, time, DEFAULT_ROOT_ORIGIN, DEFAULT_ROOT_FRAME)
    }

    /// Create a scene rooted at a chosen ephemeris origin and frame.
    ///
    /// The root node is ephemeris-driven on both axes and defines the scene
    /// frame: its global transform is the identity by construction.
    pub fn with_root(
        ephemeris: Arc<dyn Ephemeris>,
        time: Time,
        root_origin: &str,
        root_frame: &str,
    ) -> Self {
        let root = Node {
            local: Transform::IDENTITY,
            global: Transform::IDENTITY,
            position_source: TransformSource::Ephemeris,
            rotation_source: TransformSource::Ephemeris,
            spice_origin: root_origin.to_string(),
            spice_frame: root_frame.to_string(),
            parent: None,
            children: Vec::new(),
            payload: NodePayload::Frame,
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
            ephemeris,
            time,
            locked: false,
            root_origin: root_origin.to_string(),
            root_frame: root_frame.to_string(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn root_origin(&self) -> &str {
        &self.root_origin
    }

    pub fn root_frame(&self) -> &str {
        &self.root_frame
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(SceneError::UnknownNode { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode { node: id })
    }

    // ----------------------------------------------------------------- //
    // Node creation and removal
    // ----------------------------------------------------------------- //

    /// Create a child frame node. New nodes start with both axes manual and
    /// an identity local transform.
    pub fn new_frame(&mut self, parent: NodeId) -> Result<NodeId> {
        self.insert_node(parent, NodePayload::Frame)
    }

    /// Create a renderable instance of a mesh with a material.
    pub fn new_instance(
        &mut self,
        parent: NodeId,
        mesh: Arc<Mesh>,
        material: Arc<Material>,
    ) -> Result<NodeId> {
        self.insert_node(parent, NodePayload::Instance { mesh, material })
    }

    /// Create a point light node.
    pub fn new_point_light(&mut self, parent: NodeId, light: PointLight) -> Result<NodeId> {
        self.insert_node(parent, NodePayload::Light(light))
    }

    /// Create a camera node.
    pub fn new_camera(&mut self, parent: NodeId, model: CameraModel) -> Result<NodeId> {
        self.insert_node(parent, NodePayload::Camera(model))
    }

    fn insert_node(&mut self, parent: NodeId, payload: NodePayload) -> Result<NodeId> {
        self.ensure_unlocked(parent, "create child of")?;
        let parent_global = self.node(parent)?.global;
        let id = NodeId(self.nodes.len() as u32);
        debug!("scene: new {} node {id} under {parent}", payload.type_name());
        self.nodes.push(Some(Node {
            local: Transform::IDENTITY,
            global: parent_global,
            position_source: TransformSource::Manual,
            rotation_source: TransformSource::Manual,
            spice_origin: String::new(),
            spice_frame: String::new(),
            parent: Some(parent),
            children: Vec::new(),
            payload,
        }));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Remove a node and its whole subtree. The root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.ensure_unlocked(id, "remove")?;
        let Some(parent) = self.node(id)?.parent else {
            return Err(SceneError::CannotRemoveRoot);
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes[current.0 as usize].take() {
                debug!("scene: removed {} node {current}", node.payload.type_name());
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn payload(&self, id: NodeId) -> Result<&NodePayload> {
        Ok(&self.node(id)?.payload)
    }

    // ----------------------------------------------------------------- //
    // Transform sources
    // ----------------------------------------------------------------- //

    pub fn position_source(&self, id: NodeId) -> Result<TransformSource> {
        Ok(self.node(id)?.position_source)
    }

    pub fn rotation_source(&self, id: NodeId) -> Result<TransformSource> {
        Ok(self.node(id)?.rotation_source)
    }

    /// The ephemeris body driving this node's position, if it is
    /// ephemeris-driven.
    pub fn spice_origin(&self, id: NodeId) -> Result<Option<&str>> {
        let node = self.node(id)?;
        Ok(match node.position_source {
            TransformSource::Ephemeris => Some(node.spice_origin.as_str()),
            TransformSource::Manual => None,
        })
    }

    /// The ephemeris frame driving this node's rotation, if it is
    /// ephemeris-driven.
    pub fn spice_frame(&self, id: NodeId) -> Result<Option<&str>> {
        let node = self.node(id)?;
        Ok(match node.rotation_source {
            TransformSource::Ephemeris => Some(node.spice_frame.as_str()),
            TransformSource::Manual => None,
        })
    }

    /// Bind the node's position to an ephemeris body.
    ///
    /// Requires the parent's position to already be ephemeris-driven (the
    /// chain up to the root must stay inertial), or the node to be the root.
    pub fn set_spice_origin(&mut self, id: NodeId, origin: &str) -> Result<()> {
        self.ensure_unlocked(id, "set_spice_origin on")?;
        self.ensure_ephemeris_parent(id, DofAxis::Position)?;
        let node = self.node_mut(id)?;
        node.position_source = TransformSource::Ephemeris;
        node.spice_origin = origin.to_string();
        node.local.translation = DVec3::ZERO;
        node.local.velocity = DVec3::ZERO;
        self.update_subtree(id)
    }

    /// Bind the node's rotation to an ephemeris frame.
    pub fn set_spice_frame(&mut self, id: NodeId, frame: &str) -> Result<()> {
        self.ensure_unlocked(id, "set_spice_frame on")?;
        self.ensure_ephemeris_parent(id, DofAxis::Rotation)?;
        let node = self.node_mut(id)?;
        node.rotation_source = TransformSource::Ephemeris;
        node.spice_frame = frame.to_string();
        node.local.rotation = Rotation::IDENTITY;
        node.local.angular_velocity = DVec3::ZERO;
        self.update_subtree(id)
    }

    /// Bind both axes at once.
    pub fn set_spice(&mut self, id: NodeId, origin: &str, frame: &str) -> Result<()> {
        self.set_spice_origin(id, origin)?;
        self.set_spice_frame(id, frame)
    }

    fn ensure_ephemeris_parent(&self, id: NodeId, axis: DofAxis) -> Result<()> {
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Ok(()); // the root may always bind to the ephemeris
        };
        let parent_node = self.node(parent)?;
        let parent_source = match axis {
            DofAxis::Position => parent_node.position_source,
            DofAxis::Rotation => parent_node.rotation_source,
        };
        if parent_source != TransformSource::Ephemeris {
            return Err(SceneError::EphemerisUnderManualParent {
                node: id,
                parent,
                axis,
            });
        }
        Ok(())
    }

    /// First strict descendant whose given axis is ephemeris-driven, if any.
    fn ephemeris_descendant(&self, id: NodeId, axis: DofAxis) -> Result<Option<NodeId>> {
        let mut stack: Vec<NodeId> = self.node(id)?.children.clone();
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            let source = match axis {
                DofAxis::Position => node.position_source,
                DofAxis::Rotation => node.rotation_source,
            };
            if source == TransformSource::Ephemeris {
                return Ok(Some(current));
            }
            stack.extend_from_slice(&node.children);
        }
        Ok(None)
    }

    // ----------------------------------------------------------------- //
    // Manual transform setters
    // ----------------------------------------------------------------- //

    /// Place the node manually relative to its parent.
    ///
    /// Switches the position source to manual. Rejected while any descendant
    /// position is still ephemeris-driven, since that subtree must stay
    /// rooted under ephemeris-driven ancestors.
    pub fn set_position(&mut self, id: NodeId, position: DVec3) -> Result<()> {
        self.ensure_unlocked(id, "set_position on")?;
        if let Some(descendant) = self.ephemeris_descendant(id, DofAxis::Position)? {
            return Err(SceneError::ManualOverEphemerisDescendant {
                node: id,
                descendant,
                axis: DofAxis::Position,
            });
        }
        let node = self.node_mut(id)?;
        node.position_source = TransformSource::Manual;
        node.spice_origin.clear();
        node.local.translation = position;
        self.update_subtree(id)
    }

    /// Orient the node manually relative to its parent.
    pub fn set_rotation(&mut self, id: NodeId, rotation: Rotation) -> Result<()> {
        self.ensure_unlocked(id, "set_rotation on")?;
        if let Some(descendant) = self.ephemeris_descendant(id, DofAxis::Rotation)? {
            return Err(SceneError::ManualOverEphemerisDescendant {
                node: id,
                descendant,
                axis: DofAxis::Rotation,
            });
        }
        let node = self.node_mut(id)?;
        node.rotation_source = TransformSource::Manual;
        node.spice_frame.clear();
        node.local.rotation = rotation;
        self.update_subtree(id)
    }

    /// Scale is always a manual, local property.
    pub fn set_scale(&mut self, id: NodeId, scale: DVec3) -> Result<()> {
        self.ensure_unlocked(id, "set_scale on")?;
        if scale.x == 0.0 || scale.y == 0.0 || scale.z == 0.0 {
            return Err(SceneError::ZeroScale { node: id });
        }
        self.node_mut(id)?.local.scale = scale;
        self.update_subtree(id)
    }

    /// Set the node's velocity relative to its parent. Rejected while the
    /// position is ephemeris-driven: the velocity then comes from the
    /// ephemeris query, not from the host.
    pub fn set_velocity(&mut self, id: NodeId, velocity: DVec3) -> Result<()> {
        self.ensure_unlocked(id, "set_velocity on")?;
        if self.node(id)?.position_source == TransformSource::Ephemeris {
            return Err(SceneError::RateFromEphemeris {
                node: id,
                axis: DofAxis::Position,
            });
        }
        self.node_mut(id)?.local.velocity = velocity;
        self.update_subtree(id)
    }

    /// Set the node's angular velocity relative to its parent. Rejected
    /// while the rotation is ephemeris-driven.
    pub fn set_angular_velocity(&mut self, id: NodeId, angular_velocity: DVec3) -> Result<()> {
        self.ensure_unlocked(id, "set_angular_velocity on")?;
        if self.node(id)?.rotation_source == TransformSource::Ephemeris {
            return Err(SceneError::RateFromEphemeris {
                node: id,
                axis: DofAxis::Rotation,
            });
        }
        self.node_mut(id)?.local.angular_velocity = angular_velocity;
        self.update_subtree(id)
    }

    // ----------------------------------------------------------------- //
    // Transform resolution
    // ----------------------------------------------------------------- //

    pub fn local_transform(&self, id: NodeId) -> Result<Transform> {
        Ok(self.node(id)?.local)
    }

    /// The node's transform expressed in the scene root frame.
    pub fn global_transform(&self, id: NodeId) -> Result<Transform> {
        Ok(self.node(id)?.global)
    }

    pub fn global_position(&self, id: NodeId) -> Result<DVec3> {
        Ok(self.node(id)?.global.translation)
    }

    pub fn global_rotation(&self, id: NodeId) -> Result<Rotation> {
        Ok(self.node(id)?.global.rotation)
    }

    /// Advance the scene to a new time, re-resolving every ephemeris-driven
    /// axis and recomposing manual descendants.
    pub fn set_time(&mut self, time: Time) -> Result<()> {
        let root = self.root;
        self.ensure_unlocked(root, "set_time on")?;
        debug!("scene: advancing to et {}", time.et());
        self.time = time;
        self.update_subtree(root)
    }

    fn update_subtree(&mut self, id: NodeId) -> Result<()> {
        self.update_global(id)?;
        let children = self.node(id)?.children.clone();
        for child in children {
            self.update_subtree(child)?;
        }
        Ok(())
    }

    /// Recompute one node's cached global transform from its parent and its
    /// sources. The root defines the scene frame and never queries.
    fn update_global(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        let parent_global = match parent {
            Some(p) => self.node(p)?.global,
            None => Transform::IDENTITY,
        };
        let mut global = parent_global * self.node(id)?.local;
        if parent.is_some() {
            let node = self.node(id)?;
            if node.position_source == TransformSource::Ephemeris {
                let state = self.ephemeris.state(
                    &node.spice_origin,
                    self.time,
                    &self.root_frame,
                    &self.root_origin,
                )?;
                global.translation = state.position;
                global.velocity = state.velocity;
            }
            let node = self.node(id)?;
            if node.rotation_source == TransformSource::Ephemeris {
                let (rotation, rate) =
                    self.ephemeris
                        .rotation_and_rate(&node.spice_frame, &self.root_frame, self.time)?;
                global.rotation = rotation;
                global.angular_velocity = rate;
            }
        }
        self.node_mut(id)?.global = global;
        Ok(())
    }

    // ----------------------------------------------------------------- //
    // Cross-frame queries
    // ----------------------------------------------------------------- //

    /// Nearest node on the path to the root (including `id` itself) whose
    /// given axis is ephemeris-driven.
    fn nearest_ephemeris_ancestor(&self, id: NodeId, axis: DofAxis) -> Result<NodeId> {
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c)?;
            let source = match axis {
                DofAxis::Position => node.position_source,
                DofAxis::Rotation => node.rotation_source,
            };
            if source == TransformSource::Ephemeris {
                return Ok(c);
            }
            current = node.parent;
        }
        // Unreachable while the root is ephemeris-driven.
        Err(SceneError::NoEphemerisAncestor { node: id, axis })
    }

    /// The node's position relative to an arbitrary ephemeris observer,
    /// expressed in an arbitrary ephemeris frame.
    ///
    /// Resolves through the nearest ephemeris-driven ancestor: its body
    /// state is queried directly in the target frame, and the manual offset
    /// accumulated below it is rotated from the scene root frame into the
    /// target frame.
    pub fn position_in_frame(&self, id: NodeId, observer: &str, frame: &str) -> Result<DVec3> {
        let anchor = self.nearest_ephemeris_ancestor(id, DofAxis::Position)?;
        let anchor_node = self.node(anchor)?;
        let state = self
            .ephemeris
            .state(&anchor_node.spice_origin, self.time, frame, observer)?;
        let offset = self.node(id)?.global.translation - anchor_node.global.translation;
        if offset == DVec3::ZERO {
            return Ok(state.position);
        }
        let into_target = self.ephemeris.rotation(&self.root_frame, frame, self.time)?;
        Ok(state.position + into_target * offset)
    }

    /// The node's orientation expressed in an arbitrary ephemeris frame.
    pub fn rotation_in_frame(&self, id: NodeId, frame: &str) -> Result<Rotation> {
        let anchor = self.nearest_ephemeris_ancestor(id, DofAxis::Rotation)?;
        let anchor_node = self.node(anchor)?;
        let anchor_in_target =
            self.ephemeris
                .rotation(&anchor_node.spice_frame, frame, self.time)?;
        // Manual rotation accumulated between the anchor and this node.
        let relative = anchor_node.global.rotation.inverse() * self.node(id)?.global.rotation;
        Ok(anchor_in_target * relative)
    }

    // ----------------------------------------------------------------- //
    // Render locking
    // ----------------------------------------------------------------- //

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock the scene against mutation for the duration of a render.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Lock the scene and return a guard that unlocks it when dropped,
    /// including on early returns and panics.
    pub fn render_guard(&mut self) -> RenderGuard<'_> {
        self.locked = true;
        RenderGuard { scene: self }
    }

    fn ensure_unlocked(&self, node: NodeId, operation: &'static str) -> Result<()> {
        if self.locked {
            return Err(SceneError::SceneLocked { node, operation });
        }
        Ok(())
    }
}

/// Scoped render lock. Dereferences to the scene for read access.
pub struct RenderGuard<'a> {
    scene: &'a mut Scene,
}

impl Deref for RenderGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        self.scene
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.scene.locked = false;
    }
}
