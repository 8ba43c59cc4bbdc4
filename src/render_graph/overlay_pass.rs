//! Screen-space pass drawing the [`OverlayLayer`] onto the display.
//!
//! Nodes become two triangles each, in overlay draw order. Solid nodes use
//! the vertex color; eye quads sample their eye's target. The pass loads what
//! is already on the display and has no depth attachment.

use std::collections::HashMap;

use super::engine::DisplaySize;
use crate::gpu::GpuContext;
use crate::overlay::{OVERLAY_DEPTH, OverlayFill, OverlayLayer};
use crate::rig::{Eye, EyePair};
use crate::ui::{Color, Rect};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    /// Pixel position, origin top-left.
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniforms {
    view_proj: [[f32; 4]; 4],
    depth: [f32; 4],
}

/// A contiguous run of vertices drawn with one fill kind.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OverlayBatch {
    pub fill: BatchFill,
    pub vertices: std::ops::Range<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BatchFill {
    Solid,
    Eye(Eye),
}

fn quad(rect: Rect, color: Color) -> [Vertex2d; 6] {
    let color = color.to_array();
    let v = |x: f32, y: f32, u: f32, w: f32| Vertex2d {
        position: [x, y],
        uv: [u, w],
        color,
    };
    let tl = v(rect.x, rect.y, 0.0, 0.0);
    let tr = v(rect.right(), rect.y, 1.0, 0.0);
    let br = v(rect.right(), rect.bottom(), 1.0, 1.0);
    let bl = v(rect.x, rect.bottom(), 0.0, 1.0);
    [tl, bl, br, br, tr, tl]
}

/// Triangulate the overlay in draw order, merging neighbours with the same fill.
pub(crate) fn build_batches(overlay: &OverlayLayer) -> (Vec<Vertex2d>, Vec<OverlayBatch>) {
    let mut vertices = Vec::new();
    let mut batches: Vec<OverlayBatch> = Vec::new();

    for node in overlay.root().draw_order() {
        if node.rect.width <= 0.0 || node.rect.height <= 0.0 {
            continue;
        }
        let (fill, color) = match node.fill {
            OverlayFill::Solid(color) => (BatchFill::Solid, color),
            OverlayFill::EyeTexture(eye) => (BatchFill::Eye(eye), Color::WHITE),
        };

        let start = vertices.len() as u32;
        vertices.extend_from_slice(&quad(node.rect, color));
        let end = vertices.len() as u32;

        match batches.last_mut() {
            Some(last) if last.fill == fill && fill == BatchFill::Solid => last.vertices.end = end,
            _ => batches.push(OverlayBatch {
                fill,
                vertices: start..end,
            }),
        }
    }
    (vertices, batches)
}

struct OverlayPipelines {
    solid: wgpu::RenderPipeline,
    textured: wgpu::RenderPipeline,
}

pub struct OverlayPass {
    shader: wgpu::ShaderModule,
    solid_layout: wgpu::PipelineLayout,
    textured_layout: wgpu::PipelineLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    pipelines: HashMap<wgpu::TextureFormat, OverlayPipelines>,
    vertex_buffer: Option<wgpu::Buffer>,
}

impl OverlayPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/overlay.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Uniforms"),
            size: std::mem::size_of::<OverlayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Solid Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Textured Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Overlay Eye Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            shader,
            solid_layout,
            textured_layout,
            texture_layout,
            uniform_buffer,
            uniform_bind_group,
            sampler,
            pipelines: HashMap::new(),
            vertex_buffer: None,
        }
    }

    fn create_pipeline(
        &self,
        gpu: &GpuContext,
        format: wgpu::TextureFormat,
        layout: &wgpu::PipelineLayout,
        fragment: &str,
    ) -> wgpu::RenderPipeline {
        gpu.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Overlay Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn ensure_pipelines(&mut self, gpu: &GpuContext, format: wgpu::TextureFormat) {
        if self.pipelines.contains_key(&format) {
            return;
        }
        log::debug!("creating overlay pipelines for {format:?}");
        let pipelines = OverlayPipelines {
            solid: self.create_pipeline(gpu, format, &self.solid_layout, "fs_solid"),
            textured: self.create_pipeline(gpu, format, &self.textured_layout, "fs_textured"),
        };
        self.pipelines.insert(format, pipelines);
    }

    fn upload_vertices(&mut self, gpu: &GpuContext, vertices: &[Vertex2d]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = bytes.len() as u64;
        let too_small = self
            .vertex_buffer
            .as_ref()
            .is_none_or(|buffer| buffer.size() < needed);
        if too_small {
            self.vertex_buffer = Some(gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Overlay Vertices"),
                size: needed.next_power_of_two().max(1024),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if let Some(buffer) = &self.vertex_buffer {
            gpu.queue.write_buffer(buffer, 0, bytes);
        }
    }

    fn eye_bind_group(&self, gpu: &GpuContext, view: &wgpu::TextureView) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Eye Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Encode the overlay onto `target`.
    ///
    /// `clear` is only set when nothing else has touched the display this
    /// frame; the overlay itself never asks for a clear.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        clear: Option<Color>,
        overlay: &OverlayLayer,
        viewport: DisplaySize,
        eye_views: EyePair<&wgpu::TextureView>,
    ) {
        let (vertices, batches) = build_batches(overlay);

        let uniforms = OverlayUniforms {
            view_proj: overlay.camera().view_projection(viewport).to_cols_array_2d(),
            depth: [OVERLAY_DEPTH, 0.0, 0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        self.ensure_pipelines(gpu, format);
        if !vertices.is_empty() {
            self.upload_vertices(gpu, &vertices);
        }
        let eye_groups = eye_views.map(|view| self.eye_bind_group(gpu, view));

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let (Some(pipelines), Some(vertex_buffer)) =
            (self.pipelines.get(&format), self.vertex_buffer.as_ref())
        else {
            return;
        };
        if batches.is_empty() {
            return;
        }

        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        for batch in batches {
            match batch.fill {
                BatchFill::Solid => render_pass.set_pipeline(&pipelines.solid),
                BatchFill::Eye(eye) => {
                    render_pass.set_pipeline(&pipelines.textured);
                    render_pass.set_bind_group(1, eye_groups.get(eye), &[]);
                }
            }
            render_pass.draw(batch.vertices, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayNode;

    #[test]
    fn eye_quads_become_separate_batches() {
        let mut overlay = OverlayLayer::new();
        overlay.layout(DisplaySize::new(1024, 768));
        overlay
            .root_mut()
            .add(OverlayNode::solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::RED));
        overlay
            .root_mut()
            .add(OverlayNode::solid(Rect::new(20.0, 0.0, 10.0, 10.0), Color::WHITE));

        let (vertices, batches) = build_batches(&overlay);
        assert_eq!(vertices.len(), 4 * 6);
        assert_eq!(
            batches,
            vec![
                OverlayBatch {
                    fill: BatchFill::Solid,
                    vertices: 0..12
                },
                OverlayBatch {
                    fill: BatchFill::Eye(Eye::Left),
                    vertices: 12..18
                },
                OverlayBatch {
                    fill: BatchFill::Eye(Eye::Right),
                    vertices: 18..24
                },
            ]
        );
    }

    #[test]
    fn eye_quad_maps_full_texture() {
        let mut overlay = OverlayLayer::new();
        overlay.layout(DisplaySize::new(800, 600));

        let (vertices, _) = build_batches(&overlay);
        let right = &vertices[6..12];
        let xs: Vec<f32> = right.iter().map(|v| v.position[0]).collect();
        assert!(xs.iter().all(|&x| x == 400.0 || x == 800.0));
        assert_eq!(right[0].uv, [0.0, 0.0]);
        assert_eq!(right[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn unlaid_overlay_draws_nothing() {
        let (vertices, batches) = build_batches(&OverlayLayer::new());
        assert!(vertices.is_empty());
        assert!(batches.is_empty());
    }
}
