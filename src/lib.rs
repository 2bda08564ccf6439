//! Globe lighting for a 3D viewer: a Phong-like per-fragment model with an
//! up-vector rim term and a sky-gradient overlay.
//!
//! The crate carries the shading logic twice from one set of constants: as
//! plain CPU functions over `glam` types, and as a WGSL program with the
//! `wgpu` pipeline plumbing to run it. Device creation, scene traversal and
//! camera math stay with the host renderer.

pub mod config;
pub mod fragment;
pub mod params;
pub mod preview;
pub mod render;
pub mod shader;
pub mod transform;
pub mod vertex;

pub use config::{GradientRamp, KeyLight, ShadingConfig, ShadingModel};
pub use fragment::{shade, Fragment};
pub use params::DrawParams;
pub use preview::{render_preview, PreviewOptions};
pub use render::{shader_source, ShadingPipeline};
pub use shader::GlobeShader;
pub use transform::{TransformError, Transforms};
pub use vertex::{transform_vertex, Vertex, VertexOutput};
