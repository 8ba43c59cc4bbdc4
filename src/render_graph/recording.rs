//! A headless [`RenderEngine`] that records what it is asked to do.
//!
//! Useful for checking the frame protocol without a GPU.

use glam::Vec3;

use super::engine::{DisplaySize, RenderEngine};
use crate::camera::Camera;
use crate::overlay::OverlayLayer;
use crate::rig::{Eye, EyePair};
use crate::ui::Rect;

/// A fake off-screen target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingTarget {
    pub eye: Eye,
    pub size: DisplaySize,
    /// Unique per allocation.
    pub id: u64,
}

/// What a recorded bind pointed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    Display,
    Target(Eye),
}

/// One call made on a [`RecordingEngine`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    SetAutoClear(bool),
    Bind(Binding),
    Clear,
    ClearOverrideMaterial,
    /// A scene render, with the position of the camera used.
    RenderScene(Vec3),
    /// An overlay render, with the eye quad rects and the sampled target sizes.
    RenderOverlay {
        quads: EyePair<Option<Rect>>,
        targets: EyePair<DisplaySize>,
    },
}

pub struct RecordingEngine {
    display: DisplaySize,
    auto_clear: bool,
    bound: Binding,
    ops: Vec<RenderOp>,
    allocations: usize,
    next_id: u64,
}

impl RecordingEngine {
    pub fn new(display: DisplaySize) -> Self {
        Self {
            display,
            auto_clear: true,
            bound: Binding::Display,
            ops: Vec::new(),
            allocations: 0,
            next_id: 0,
        }
    }

    /// Change the reported display size.
    pub fn resize(&mut self, display: DisplaySize) {
        self.display = display;
    }

    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    /// Return the recorded ops and start a fresh log.
    pub fn take_ops(&mut self) -> Vec<RenderOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of targets created so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// What is currently bound.
    pub fn bound(&self) -> Binding {
        self.bound
    }
}

impl RenderEngine for RecordingEngine {
    type Target = RecordingTarget;

    fn display_size(&self) -> DisplaySize {
        self.display
    }

    fn create_target(&mut self, eye: Eye, size: DisplaySize) -> RecordingTarget {
        self.allocations += 1;
        self.next_id += 1;
        RecordingTarget {
            eye,
            size,
            id: self.next_id,
        }
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
        self.ops.push(RenderOp::SetAutoClear(enabled));
    }

    fn set_render_target(&mut self, target: Option<&RecordingTarget>) {
        self.bound = match target {
            Some(target) => Binding::Target(target.eye),
            None => Binding::Display,
        };
        self.ops.push(RenderOp::Bind(self.bound));
        if self.auto_clear {
            self.ops.push(RenderOp::Clear);
        }
    }

    fn clear(&mut self) {
        self.ops.push(RenderOp::Clear);
    }

    fn clear_override_material(&mut self) {
        self.ops.push(RenderOp::ClearOverrideMaterial);
    }

    fn render_scene(&mut self, camera: &Camera) {
        self.ops.push(RenderOp::RenderScene(camera.position));
    }

    fn render_overlay(&mut self, overlay: &OverlayLayer, eye_targets: EyePair<&RecordingTarget>) {
        let quads = EyePair::from_fn(|eye| overlay.eye_quad(eye).map(|node| node.rect));
        self.ops.push(RenderOp::RenderOverlay {
            quads,
            targets: eye_targets.map(|target| target.size),
        });
    }
}
