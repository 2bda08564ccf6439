use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::{shade, transform_vertex, DrawParams, Fragment, ShadingConfig, Vertex, VertexOutput};

/// CPU evaluation of the globe shader pair.
///
/// Mirrors the WGSL program built by [`crate::render::shader_source`] for the
/// same configuration, so hosts without a GPU (and tests) can shade
/// individual vertices and fragments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobeShader {
    config: ShadingConfig,
}

impl GlobeShader {
    pub fn new(config: ShadingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShadingConfig {
        &self.config
    }

    pub fn vertex(&self, vertex: &Vertex, params: &DrawParams) -> VertexOutput {
        transform_vertex(vertex, &params.transforms)
    }

    pub fn fragment(&self, fragment: &Fragment, params: &DrawParams) -> Vec4 {
        shade(&self.config, fragment, params)
    }
}
