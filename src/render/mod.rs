pub mod pipeline;
pub mod wgsl;

pub use pipeline::{
    DrawBinding, DrawUniforms, GpuVertex, PipelineOptions, ShadingPipeline, FLAG_GRADIENT,
    FLAG_LIGHTING,
};
pub use wgsl::shader_source;
