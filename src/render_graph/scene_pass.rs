//! Depth-tested pass drawing the [`MainScene`].
//!
//! Bind groups:
//! - **Group 0**: camera uniforms, one slot per scene render in a frame
//! - **Group 1**: model uniforms, one buffer per scene object
//!
//! The same pass draws into eye targets and the display, so pipelines are
//! created on demand for each color format they meet.

use std::collections::HashMap;

use super::engine::DisplaySize;
use super::render_target::DEPTH_FORMAT;
use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::scene::MainScene;
use crate::ui::Color;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
    override_color: [f32; 4],
    flags: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniforms {
    model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
}

/// A uniform buffer with its bind group.
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(gpu: &GpuContext, layout: &wgpu::BindGroupLayout, size: u64, label: &str) -> Self {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Where a scene render lands and whether it starts from a cleared target.
pub(crate) struct SceneAttachments<'v> {
    pub color: &'v wgpu::TextureView,
    pub depth: &'v wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub clear: Option<Color>,
}

pub struct ScenePass {
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    camera_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    camera_slots: Vec<UniformSlot>,
    meshes: Vec<Mesh>,
    objects: Vec<UniformSlot>,
}

fn uniform_layout(gpu: &GpuContext, label: &str) -> wgpu::BindGroupLayout {
    gpu.device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
}

impl ScenePass {
    pub fn new(gpu: &GpuContext) -> Self {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
            });

        let camera_layout = uniform_layout(gpu, "Scene Camera Bind Group Layout");
        let model_layout = uniform_layout(gpu, "Scene Model Bind Group Layout");

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&camera_layout, &model_layout],
                push_constant_ranges: &[],
            });

        Self {
            shader,
            pipeline_layout,
            camera_layout,
            model_layout,
            pipelines: HashMap::new(),
            camera_slots: Vec::new(),
            meshes: Vec::new(),
            objects: Vec::new(),
        }
    }

    fn ensure_pipeline(&mut self, gpu: &GpuContext, format: wgpu::TextureFormat) {
        if self.pipelines.contains_key(&format) {
            return;
        }
        log::debug!("creating scene pipeline for {format:?}");
        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        self.pipelines.insert(format, pipeline);
    }

    /// Upload new meshes and refresh per-object uniforms.
    ///
    /// Meshes are immutable once uploaded; only meshes added since the last
    /// sync are sent to the GPU.
    pub fn sync(&mut self, gpu: &GpuContext, scene: &MainScene) {
        for data in &scene.meshes()[self.meshes.len().min(scene.meshes().len())..] {
            self.meshes.push(Mesh::upload(gpu, data));
        }
        while self.objects.len() < scene.objects().len() {
            self.objects.push(UniformSlot::new(
                gpu,
                &self.model_layout,
                std::mem::size_of::<ModelUniforms>() as u64,
                "Scene Model Uniforms",
            ));
        }

        for (slot, object) in self.objects.iter().zip(scene.objects()) {
            let model = object.transform.matrix();
            let uniforms = ModelUniforms {
                model: model.to_cols_array_2d(),
                normal_matrix: model.inverse().transpose().to_cols_array_2d(),
                color: object.color.to_array(),
            };
            gpu.queue
                .write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }
    }

    /// Write camera uniforms into slot `slot`, growing the slot list as needed.
    ///
    /// Every scene render in a frame needs its own slot: all writes land
    /// before the single submit, so a shared buffer would leave every pass
    /// with the last camera.
    pub(crate) fn write_camera(
        &mut self,
        gpu: &GpuContext,
        slot: usize,
        camera: &Camera,
        viewport: DisplaySize,
        override_color: Option<Color>,
    ) {
        while self.camera_slots.len() <= slot {
            self.camera_slots.push(UniformSlot::new(
                gpu,
                &self.camera_layout,
                std::mem::size_of::<CameraUniforms>() as u64,
                "Scene Camera Uniforms",
            ));
        }
        let uniforms = CameraUniforms {
            view_proj: camera.view_projection(viewport).to_cols_array_2d(),
            position: camera.position.extend(1.0).to_array(),
            override_color: override_color.unwrap_or(Color::WHITE).to_array(),
            flags: [
                if override_color.is_some() { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ],
        };
        gpu.queue.write_buffer(
            &self.camera_slots[slot].buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );
    }

    /// Encode one render of the scene with the camera in `slot`.
    pub(crate) fn draw(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        attachments: SceneAttachments<'_>,
        slot: usize,
        scene: &MainScene,
    ) {
        self.ensure_pipeline(gpu, attachments.format);
        let (Some(pipeline), Some(camera)) = (
            self.pipelines.get(&attachments.format),
            self.camera_slots.get(slot),
        ) else {
            return;
        };

        let (color_load, depth_load) = match attachments.clear {
            Some(color) => (wgpu::LoadOp::Clear(color.to_wgpu()), wgpu::LoadOp::Clear(1.0)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachments.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: attachments.depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &camera.bind_group, &[]);

        for (object, model) in scene.objects().iter().zip(&self.objects) {
            let Some(mesh) = self.meshes.get(object.mesh.0) else {
                continue;
            };
            render_pass.set_bind_group(1, &model.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
