//! The contract the compositor needs from a rendering engine.

use crate::camera::Camera;
use crate::overlay::OverlayLayer;
use crate::rig::{Eye, EyePair};

/// Display dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Returns 1.0 for a zero height.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// A zero-area display (e.g. a minimized window) cannot be rendered to.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rendering operations used by [`CompositeRenderer`](super::CompositeRenderer).
///
/// `set_render_target(None)` binds the display. Clearing happens only through
/// [`clear`](Self::clear) while auto-clear is off; with auto-clear on, binding
/// a target clears it.
pub trait RenderEngine {
    /// An off-screen color buffer owned by a [`FrameBufferPool`](super::FrameBufferPool).
    type Target;

    /// The current drawable size of the display.
    fn display_size(&self) -> DisplaySize;

    /// Allocate a fresh off-screen color target.
    fn create_target(&mut self, eye: Eye, size: DisplaySize) -> Self::Target;

    fn auto_clear(&self) -> bool;

    fn set_auto_clear(&mut self, enabled: bool);

    /// Bind an off-screen target, or the display for `None`.
    fn set_render_target(&mut self, target: Option<&Self::Target>);

    /// Clear the bound target's color and depth.
    fn clear(&mut self);

    /// Drop any material override so the next scene pass draws real materials.
    fn clear_override_material(&mut self);

    /// Draw the main scene into the bound target from `camera`.
    fn render_scene(&mut self, camera: &Camera);

    /// Draw the overlay onto the display with the overlay's own camera.
    ///
    /// Eye quads sample from `eye_targets`. Never clears.
    fn render_overlay(&mut self, overlay: &OverlayLayer, eye_targets: EyePair<&Self::Target>);
}
