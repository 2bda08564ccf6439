use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::config::WORLD_UP;
use crate::Transforms;

/// Object-space vertex attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Homogeneous position.
    pub position: Vec4,
    /// Normal; only `xyz` is read.
    pub normal: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.extend(1.0),
            normal: normal.extend(0.0),
        }
    }
}

/// Values the vertex stage hands to the rasterizer for interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub eye_position: Vec3,
    pub eye_normal: Vec3,
    /// Object-space normal, passed through untouched.
    pub globe_normal: Vec3,
    pub eye_up: Vec3,
    /// Unit vector from the eye towards the vertex.
    pub eye_vector: Vec3,
}

/// Runs the vertex stage for one vertex.
pub fn transform_vertex(vertex: &Vertex, transforms: &Transforms) -> VertexOutput {
    let eye = transforms.model_view * vertex.position;
    let eye_position = eye.truncate();
    let globe_normal = vertex.normal.truncate();
    VertexOutput {
        clip_position: transforms.mvp * vertex.position,
        eye_position,
        eye_normal: (transforms.normal_matrix * globe_normal).normalize_or_zero(),
        globe_normal,
        eye_up: (transforms.normal_matrix * WORLD_UP).normalize_or_zero(),
        eye_vector: eye_position.normalize_or_zero(),
    }
}
