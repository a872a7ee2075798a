//! astra renderer - CPU rasterization and sensor simulation.
//!
//! Consumes [`astra_core`] scene views and produces multi-channel frames:
//!
//! - **BSDFs**: Lambert and GGX microfacet shading with importance sampling
//! - **Rasterizer**: z-buffer triangle pipeline with direct point lighting
//! - **Frame buffer**: independently enabled render channels
//! - **Sensor**: photon/electron readout with shot noise, read noise, and
//!   ADC quantization

mod bsdf;
mod framebuffer;
mod rasterizer;
mod sampling;
mod sensor;

pub use bsdf::{bsdf_for, Bsdf, BsdfSample, GgxBsdf, Interaction, LambertBsdf};
pub use framebuffer::{FrameBuffer, DEPTH_CLEAR, MESH_ID_CLEAR};
pub use rasterizer::RasterRenderer;
pub use sampling::{
    cosine_hemisphere, ggx_vndf_pdf, ggx_vndf_sample, orthonormal_basis, HemisphereSample,
};
pub use sensor::{SensorConfig, SensorError, SensorModel, SimpleSensor};

/// Re-export the core scene types renderer hosts always need
pub use astra_core::{Scene, SceneView, Spectrum};
