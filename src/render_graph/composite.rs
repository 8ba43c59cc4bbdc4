//! Per-frame stereo compositing.

use super::engine::{DisplaySize, RenderEngine};
use super::render_target::FrameBufferPool;
use crate::camera::Camera;
use crate::overlay::OverlayLayer;
use crate::rig::{Eye, StereoCameraRig};

/// Renders both eyes off-screen, then the main view and the overlay on the display.
///
/// Each frame runs the same sequence of engine calls:
///
/// ```text
/// auto-clear off
/// bind left   -> clear -> scene(left eye)
/// bind right  -> clear -> scene(right eye)
/// clear material override
/// bind display -> scene(main camera)
/// overlay (eye quads sample the two targets)
/// auto-clear on
/// ```
///
/// While the rig is unattached the eye targets are still bound and cleared,
/// but nothing is drawn into them.
pub struct CompositeRenderer<T> {
    pool: FrameBufferPool<T>,
    overlay: OverlayLayer,
}

impl<T> Default for CompositeRenderer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompositeRenderer<T> {
    pub fn new() -> Self {
        Self::with_overlay(OverlayLayer::new())
    }

    pub fn with_overlay(overlay: OverlayLayer) -> Self {
        Self {
            pool: FrameBufferPool::new(),
            overlay,
        }
    }

    pub fn pool(&self) -> &FrameBufferPool<T> {
        &self.pool
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OverlayLayer {
        &mut self.overlay
    }

    /// Bring targets and eye quads up to date with the display.
    ///
    /// Returns the display size, or `None` if there is nothing to draw to.
    pub fn prepare<E>(&mut self, engine: &mut E) -> Option<DisplaySize>
    where
        E: RenderEngine<Target = T>,
    {
        let display = engine.display_size();
        if display.is_empty() {
            return None;
        }
        self.pool.ensure_size(engine);
        self.overlay.layout(display);
        Some(display)
    }

    /// Run one frame. Skipped when the display has zero area.
    pub fn render_frame<E>(&mut self, engine: &mut E, rig: &StereoCameraRig, main_camera: &Camera)
    where
        E: RenderEngine<Target = T>,
    {
        if self.prepare(engine).is_none() {
            log::trace!("display has zero area, skipping frame");
            return;
        }

        engine.set_auto_clear(false);

        for eye in Eye::BOTH {
            let Some(target) = self.pool.target_for(eye, engine) else {
                continue;
            };
            engine.set_render_target(Some(target));
            engine.clear();
            if let Some(camera) = rig.eye_camera(eye) {
                engine.render_scene(&camera);
            }
        }

        engine.clear_override_material();
        engine.set_render_target(None);
        engine.render_scene(main_camera);

        if let Some(targets) = self.pool.targets() {
            engine.render_overlay(&self.overlay, targets);
        }

        engine.set_auto_clear(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_graph::recording::{Binding, RecordingEngine, RenderOp};
    use glam::Vec3;

    fn attached_rig() -> StereoCameraRig {
        let mut rig = StereoCameraRig::new(10.0, Vec3::ZERO);
        rig.attach(Some(Camera::new()), Some(Camera::new())).unwrap();
        rig
    }

    #[test]
    fn frame_follows_the_protocol() {
        let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
        let mut compositor = CompositeRenderer::new();
        let main = Camera::new().at([0.0, 5.0, 20.0]);

        compositor.render_frame(&mut engine, &attached_rig(), &main);

        let ops = engine.take_ops();
        assert_eq!(ops.len(), 12);
        assert_eq!(
            &ops[..10],
            &[
                RenderOp::SetAutoClear(false),
                RenderOp::Bind(Binding::Target(Eye::Left)),
                RenderOp::Clear,
                RenderOp::RenderScene(Vec3::new(-5.0, 0.0, 0.0)),
                RenderOp::Bind(Binding::Target(Eye::Right)),
                RenderOp::Clear,
                RenderOp::RenderScene(Vec3::new(5.0, 0.0, 0.0)),
                RenderOp::ClearOverrideMaterial,
                RenderOp::Bind(Binding::Display),
                RenderOp::RenderScene(Vec3::new(0.0, 5.0, 20.0)),
            ]
        );
        assert!(matches!(ops[10], RenderOp::RenderOverlay { .. }));
        assert_eq!(ops[11], RenderOp::SetAutoClear(true));
        assert!(engine.auto_clear());
    }

    #[test]
    fn unattached_rig_clears_eye_targets_without_rendering() {
        let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
        let mut compositor = CompositeRenderer::new();
        let rig = StereoCameraRig::new(10.0, Vec3::ZERO);

        compositor.render_frame(&mut engine, &rig, &Camera::new());

        let scene_renders = engine
            .ops()
            .iter()
            .filter(|op| matches!(op, RenderOp::RenderScene(_)))
            .count();
        assert_eq!(scene_renders, 1);
        assert_eq!(engine.ops()[2], RenderOp::Clear);
        assert_eq!(engine.ops()[4], RenderOp::Clear);
    }

    #[test]
    fn zero_area_display_skips_the_frame() {
        let mut engine = RecordingEngine::new(DisplaySize::new(0, 600));
        let mut compositor: CompositeRenderer<_> = CompositeRenderer::new();

        compositor.render_frame(&mut engine, &attached_rig(), &Camera::new());

        assert!(engine.ops().is_empty());
        assert_eq!(engine.allocations(), 0);
    }
}
