use std::num::NonZeroU64;

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::Mat3;
use log::debug;
use wgpu::util::DeviceExt;

use super::wgsl::shader_source;
use crate::{DrawParams, ShadingConfig, Vertex};

/// Bit set in [`DrawUniforms::flags`] when lighting is enabled.
pub const FLAG_LIGHTING: u32 = 1;
/// Bit set in [`DrawUniforms::flags`] when the sky gradient is enabled.
pub const FLAG_GRADIENT: u32 = 1 << 1;

/// Vertex layout consumed by `vs_main`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub vertex: [f32; 4],
    pub normal: [f32; 4],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(vertex: &Vertex) -> Self {
        Self {
            vertex: vertex.position.into(),
            normal: vertex.normal.into(),
        }
    }
}

/// Uniform block matching `DrawUniforms` in the WGSL program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model_view: [[f32; 4]; 4],
    pub mvp: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
    pub color: [f32; 4],
    pub resolution: [f32; 2],
    pub specular: f32,
    pub flags: u32,
}

impl From<&DrawParams> for DrawUniforms {
    fn from(params: &DrawParams) -> Self {
        let mut flags = 0;
        if params.lighting {
            flags |= FLAG_LIGHTING;
        }
        if params.gradient {
            flags |= FLAG_GRADIENT;
        }
        Self {
            model_view: params.transforms.model_view.to_cols_array_2d(),
            mvp: params.transforms.mvp.to_cols_array_2d(),
            normal_matrix: mat3_to_3x4(params.transforms.normal_matrix),
            color: params.color.into(),
            resolution: params.resolution.into(),
            specular: params.specular,
            flags,
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

/// Fixed-function state of the shading pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PipelineOptions {
    /// Winding that the rasterizer reports as front-facing.
    pub front_face: wgpu::FrontFace,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            front_face: wgpu::FrontFace::Ccw,
            depth_format: Some(wgpu::TextureFormat::Depth24Plus),
            sample_count: 1,
        }
    }
}

/// Uniform buffer and bind group for one draw.
pub struct DrawBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DrawBinding {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Render pipeline running the globe shader pair.
///
/// Faces are never culled: back faces of a cut-away globe are shaded with
/// their normals flipped towards the viewer.
pub struct ShadingPipeline {
    pipeline: wgpu::RenderPipeline,
    draw_layout: wgpu::BindGroupLayout,
}

impl ShadingPipeline {
    pub fn new(
        device: &wgpu::Device,
        config: &ShadingConfig,
        color_format: wgpu::TextureFormat,
        options: &PipelineOptions,
    ) -> Self {
        let source = shader_source(config);
        debug!(
            "creating shading pipeline ({color_format:?}, {:?}, {} byte program)",
            options.front_face,
            source.len()
        );
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("globe-shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-draw-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<DrawUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-pipeline-layout"),
            bind_group_layouts: &[&draw_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("globe-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: options.front_face,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: options.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: options.sample_count.max(1),
                ..Default::default()
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            draw_layout,
        }
    }

    /// Uploads the uniforms of one draw and binds them to the pipeline layout.
    pub fn bind_draw(&self, device: &wgpu::Device, params: &DrawParams) -> DrawBinding {
        let uniforms = DrawUniforms::from(params);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe-draw-uniforms"),
            contents: bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-draw-bind-group"),
            layout: &self.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        DrawBinding { buffer, bind_group }
    }

    /// Rewrites the uniforms of an existing binding for the next frame.
    pub fn update_draw(&self, queue: &wgpu::Queue, binding: &DrawBinding, params: &DrawParams) {
        queue.write_buffer(&binding.buffer, 0, bytes_of(&DrawUniforms::from(params)));
    }

    /// Uploads vertices in the layout `vs_main` expects.
    pub fn create_vertex_buffer(&self, device: &wgpu::Device, vertices: &[Vertex]) -> wgpu::Buffer {
        let vertices: Vec<GpuVertex> = vertices.iter().map(GpuVertex::from).collect();
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        })
    }

    /// Records a non-indexed draw into a pass the host has already begun.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        binding: &DrawBinding,
        vertices: &wgpu::Buffer,
        vertex_count: u32,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &binding.bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }

    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transforms;
    use glam::{Mat4, Vec2, Vec3, Vec4};
    use std::mem::{offset_of, size_of};

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(size_of::<DrawUniforms>(), 208);
        assert_eq!(offset_of!(DrawUniforms, mvp), 64);
        assert_eq!(offset_of!(DrawUniforms, normal_matrix), 128);
        assert_eq!(offset_of!(DrawUniforms, color), 176);
        assert_eq!(offset_of!(DrawUniforms, resolution), 192);
        assert_eq!(offset_of!(DrawUniforms, specular), 200);
        assert_eq!(offset_of!(DrawUniforms, flags), 204);
        assert_eq!(size_of::<GpuVertex>(), 32);
    }

    #[test]
    fn flags_encode_lighting_and_gradient() {
        let params = DrawParams::default();
        assert_eq!(DrawUniforms::from(&params).flags, FLAG_LIGHTING);
        let params = params.with_lighting(false).with_gradient(true);
        assert_eq!(DrawUniforms::from(&params).flags, FLAG_GRADIENT);
        let params = params.with_lighting(true);
        assert_eq!(
            DrawUniforms::from(&params).flags,
            FLAG_LIGHTING | FLAG_GRADIENT
        );
    }

    #[test]
    fn uniforms_carry_params() {
        let transforms = Transforms::new(
            Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)),
            Mat4::IDENTITY,
        )
        .unwrap();
        let params = DrawParams::new(
            Vec4::new(0.1, 0.2, 0.3, 0.4),
            transforms,
            Vec2::new(640.0, 480.0),
        )
        .with_specular(0.7);
        let uniforms = DrawUniforms::from(&params);
        assert_eq!(uniforms.color, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert_eq!(uniforms.specular, 0.7);
        assert_eq!(uniforms.normal_matrix[0], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(uniforms.model_view[0], [2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn gpu_vertex_keeps_homogeneous_components() {
        let vertex = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y);
        let gpu = GpuVertex::from(&vertex);
        assert_eq!(gpu.vertex, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(gpu.normal, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(GpuVertex::layout().array_stride, 32);
    }
}
