//! astra core - scene model for ephemeris-driven spacecraft imaging.
//!
//! This crate provides:
//!
//! - **Scene graph**: [`scene::Scene`] with per-axis manual/ephemeris
//!   transform sources and cross-frame queries
//! - **Ephemeris boundary**: the [`ephemeris::Ephemeris`] trait consumed by
//!   the scene graph
//! - **Assets**: meshes, textures, materials, lights, camera models
//! - **Render snapshots**: [`view::SceneView`] consumed by renderers

pub mod camera;
pub mod ephemeris;
pub mod error;
pub mod image;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod time;
pub mod view;

// Re-export commonly used types
pub use camera::{BrownDistortion, CameraModel};
pub use ephemeris::{BodyState, Ephemeris, EphemerisError, FixedEphemeris};
pub use error::SceneError;
pub use image::{Image, ImageError, Spectrum};
pub use light::PointLight;
pub use material::{Material, ShadingModel, ShadingParams};
pub use mesh::Mesh;
pub use scene::{
    DofAxis, NodeId, NodePayload, RenderGuard, Scene, TransformSource, DEFAULT_ROOT_FRAME,
    DEFAULT_ROOT_ORIGIN,
};
pub use time::Time;
pub use view::{SceneView, ViewCamera, ViewInstance, ViewLight};
