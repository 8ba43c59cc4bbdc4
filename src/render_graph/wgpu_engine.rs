//! The wgpu implementation of [`RenderEngine`].
//!
//! [`Renderer`] owns the long-lived passes. Each frame it hands out a
//! [`WgpuFrame`] that records every call into one command encoder and submits
//! it on [`WgpuFrame::finish`].
//!
//! Clears are deferred: a clear marks the bound target, and the next scene
//! render on it starts with a clear load op. A marked target that is never
//! drawn to gets a clear-only pass when it is unbound or the frame ends. The
//! surface texture starts each frame undefined, so the display is cleared on
//! first use.

use super::engine::{DisplaySize, RenderEngine};
use super::overlay_pass::OverlayPass;
use super::render_target::{RenderTarget, create_depth_view};
use super::scene_pass::{SceneAttachments, ScenePass};
use crate::camera::Camera;
use crate::error::{StereoError, StereoResult};
use crate::gpu::GpuContext;
use crate::overlay::OverlayLayer;
use crate::rig::{Eye, EyePair};
use crate::scene::MainScene;
use crate::ui::Color;

/// GPU state that outlives a single frame.
pub struct Renderer {
    scene_pass: ScenePass,
    overlay_pass: OverlayPass,
    display_depth: Option<(DisplaySize, wgpu::TextureView)>,
    override_material: Option<Color>,
}

/// Outcome of [`Renderer::begin_frame`].
pub enum FrameStatus<'a> {
    Ready(WgpuFrame<'a>),
    /// The surface was unavailable this frame (lost, outdated or timed out).
    Skipped,
}

impl Renderer {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            scene_pass: ScenePass::new(gpu),
            overlay_pass: OverlayPass::new(gpu),
            display_depth: None,
            override_material: None,
        }
    }

    /// Flat color that replaces every material in the eye renders.
    ///
    /// The compositor drops the override before the main view is drawn.
    pub fn set_override_material(&mut self, color: Option<Color>) {
        self.override_material = color;
    }

    fn display_depth(&mut self, gpu: &GpuContext) -> wgpu::TextureView {
        let size = gpu.display_size();
        match &self.display_depth {
            Some((current, view)) if *current == size => view.clone(),
            _ => {
                let view = create_depth_view(gpu, "Display", size);
                self.display_depth = Some((size, view.clone()));
                view
            }
        }
    }

    /// Acquire the next surface texture and start recording a frame.
    ///
    /// Lost or outdated surfaces are reconfigured and the frame is skipped.
    pub fn begin_frame<'a>(
        &'a mut self,
        gpu: &'a GpuContext,
        scene: &'a MainScene,
    ) -> StereoResult<FrameStatus<'a>> {
        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring surface texture, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(err) => return Err(StereoError::Surface(err)),
        };

        self.scene_pass.sync(gpu, scene);

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let display = BoundTarget {
            color: surface_view.clone(),
            depth: self.display_depth(gpu),
            format: gpu.surface_format(),
            size: gpu.display_size(),
            eye: None,
        };
        let encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Stereo Frame Encoder"),
            });

        let override_material = self.override_material;
        Ok(FrameStatus::Ready(WgpuFrame {
            gpu,
            renderer: self,
            scene,
            encoder,
            surface_texture,
            display: display.clone(),
            bound: display,
            auto_clear: true,
            pending_clear: false,
            display_fresh: true,
            override_material,
            camera_slot: 0,
        }))
    }
}

/// Views of whatever is currently bound.
#[derive(Clone)]
struct BoundTarget {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    format: wgpu::TextureFormat,
    size: DisplaySize,
    /// `None` for the display.
    eye: Option<Eye>,
}

impl BoundTarget {
    fn is_display(&self) -> bool {
        self.eye.is_none()
    }
}

/// One frame of GPU work.
pub struct WgpuFrame<'a> {
    gpu: &'a GpuContext,
    renderer: &'a mut Renderer,
    scene: &'a MainScene,
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    display: BoundTarget,
    bound: BoundTarget,
    auto_clear: bool,
    pending_clear: bool,
    display_fresh: bool,
    override_material: Option<Color>,
    camera_slot: usize,
}

impl WgpuFrame<'_> {
    /// Take the pending clear for the bound target, if any.
    fn take_clear(&mut self) -> Option<Color> {
        let first_display_use = self.bound.is_display() && self.display_fresh;
        if self.bound.is_display() {
            self.display_fresh = false;
        }
        if std::mem::take(&mut self.pending_clear) || first_display_use {
            Some(self.scene.background())
        } else {
            None
        }
    }

    /// Encode a clear-only pass if the bound target still owes one.
    fn flush_clear(&mut self) {
        let Some(color) = self.take_clear() else {
            return;
        };
        let _clear_pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stereo Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.bound.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.bound.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
    }

    /// Submit the recorded work and present the surface texture.
    pub fn finish(mut self) {
        self.flush_clear();
        if self.display_fresh {
            self.bound = self.display.clone();
            self.flush_clear();
        }
        self.gpu.queue.submit(std::iter::once(self.encoder.finish()));
        self.surface_texture.present();
    }
}

impl RenderEngine for WgpuFrame<'_> {
    type Target = RenderTarget;

    fn display_size(&self) -> DisplaySize {
        self.gpu.display_size()
    }

    fn create_target(&mut self, eye: Eye, size: DisplaySize) -> RenderTarget {
        RenderTarget::new(self.gpu, eye, size)
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        self.flush_clear();
        self.bound = match target {
            Some(target) => BoundTarget {
                color: target.view.clone(),
                depth: target.depth_view.clone(),
                format: target.format(),
                size: target.size(),
                eye: Some(target.eye()),
            },
            None => self.display.clone(),
        };
        self.pending_clear = self.auto_clear;
    }

    fn clear(&mut self) {
        self.pending_clear = true;
    }

    fn clear_override_material(&mut self) {
        self.override_material = None;
    }

    fn render_scene(&mut self, camera: &Camera) {
        let slot = self.camera_slot;
        self.camera_slot += 1;
        let clear = self.take_clear();

        let renderer = &mut *self.renderer;
        renderer.scene_pass.write_camera(
            self.gpu,
            slot,
            camera,
            self.bound.size,
            self.override_material,
        );
        renderer.scene_pass.draw(
            self.gpu,
            &mut self.encoder,
            SceneAttachments {
                color: &self.bound.color,
                depth: &self.bound.depth,
                format: self.bound.format,
                clear,
            },
            slot,
            self.scene,
        );
    }

    fn render_overlay(&mut self, overlay: &OverlayLayer, eye_targets: EyePair<&RenderTarget>) {
        // The overlay always lands on the display, whatever is bound.
        if !self.bound.is_display() {
            self.flush_clear();
            self.bound = self.display.clone();
            self.pending_clear = false;
        }
        let clear = self.take_clear();

        self.renderer.overlay_pass.draw(
            self.gpu,
            &mut self.encoder,
            &self.display.color,
            self.display.format,
            clear,
            overlay,
            self.display.size,
            eye_targets.map(|target| &target.view),
        );
    }
}
