//! Screen-space overlay drawn on top of the main view.
//!
//! The overlay is a separate 2D scene with its own root and its own
//! orthographic camera. It never takes part in the main scene pass and never
//! clears the display before drawing. The compositor places one quad per eye
//! here, each textured with that eye's off-screen target:
//!
//! ```text
//! 0            w/2            w
//! ┌─────────────┬─────────────┐
//! │    left     │    right    │  h
//! └─────────────┴─────────────┘
//! ```

use crate::camera::Camera;
use crate::render_graph::DisplaySize;
use crate::rig::{Eye, EyePair};
use crate::ui::{Color, Rect};

/// Layer of ordinary overlay content.
///
/// The eye quads cover the whole display, so anything on this layer is only
/// visible where they don't draw (for example before the first layout).
pub const DEFAULT_LAYER: i32 = 0;

/// Layer of the eye quads, above default overlay content.
pub const EYE_QUAD_LAYER: i32 = 100;

/// Layer of HUD content drawn on top of the eye quads.
pub const HUD_LAYER: i32 = 200;

/// Near and far planes of the overlay camera.
pub const OVERLAY_NEAR: f32 = 0.0001;
pub const OVERLAY_FAR: f32 = 1.0;

/// Depth at which overlay nodes sit in front of the overlay camera.
pub const OVERLAY_DEPTH: f32 = -0.1;

/// How an overlay node is filled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayFill {
    Solid(Color),
    /// Sample the off-screen target of an eye.
    EyeTexture(Eye),
}

/// A rectangle on the overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayNode {
    pub rect: Rect,
    pub fill: OverlayFill,
    pub layer: i32,
}

impl OverlayNode {
    /// A solid node on [`DEFAULT_LAYER`], underneath the eye quads.
    pub fn solid(rect: Rect, color: Color) -> Self {
        Self {
            rect,
            fill: OverlayFill::Solid(color),
            layer: DEFAULT_LAYER,
        }
    }

    /// A solid node on [`HUD_LAYER`], visible above both eye views.
    pub fn hud(rect: Rect, color: Color) -> Self {
        Self::solid(rect, color).on_layer(HUD_LAYER)
    }

    pub fn on_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }
}

/// Handle to a node in an [`OverlayScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayNodeId(usize);

/// The overlay's root: an ordered collection of nodes.
#[derive(Clone, Debug, Default)]
pub struct OverlayScene {
    nodes: Vec<OverlayNode>,
}

impl OverlayScene {
    pub fn add(&mut self, node: OverlayNode) -> OverlayNodeId {
        self.nodes.push(node);
        OverlayNodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: OverlayNodeId) -> Option<&OverlayNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: OverlayNodeId) -> Option<&mut OverlayNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in draw order: ascending layer, insertion order within a layer.
    pub fn draw_order(&self) -> Vec<&OverlayNode> {
        let mut ordered: Vec<&OverlayNode> = self.nodes.iter().collect();
        ordered.sort_by_key(|node| node.layer);
        ordered
    }
}

/// Side-by-side placement of the eye quads for a display.
///
/// Each quad is half the display wide and full height. The right quad starts
/// exactly where the left one ends.
pub fn eye_quad_rects(size: DisplaySize) -> EyePair<Rect> {
    let width = size.width as f32;
    let height = size.height as f32;
    let half = width * 0.5;
    EyePair::new(
        Rect::new(0.0, 0.0, half, height),
        Rect::new(half, 0.0, width - half, height),
    )
}

/// The overlay scene, its camera and the two eye quads.
pub struct OverlayLayer {
    root: OverlayScene,
    camera: Camera,
    eye_quads: EyePair<OverlayNodeId>,
    laid_out_for: Option<DisplaySize>,
}

impl Default for OverlayLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayLayer {
    /// An overlay holding the two (not yet laid out) eye quads.
    pub fn new() -> Self {
        let mut root = OverlayScene::default();
        let eye_quads = EyePair::from_fn(|eye| {
            root.add(OverlayNode {
                rect: Rect::new(0.0, 0.0, 0.0, 0.0),
                fill: OverlayFill::EyeTexture(eye),
                layer: EYE_QUAD_LAYER,
            })
        });
        Self {
            root,
            camera: Camera::orthographic(OVERLAY_NEAR, OVERLAY_FAR),
            eye_quads,
            laid_out_for: None,
        }
    }

    pub fn root(&self) -> &OverlayScene {
        &self.root
    }

    /// Mutable access for adding content.
    ///
    /// Nodes stay hidden behind the eye quads unless they are above
    /// [`EYE_QUAD_LAYER`]; use [`OverlayNode::hud`] for HUD content.
    pub fn root_mut(&mut self) -> &mut OverlayScene {
        &mut self.root
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn eye_quad(&self, eye: Eye) -> Option<&OverlayNode> {
        self.root.get(*self.eye_quads.get(eye))
    }

    /// Whether the eye quads were laid out for a different display size.
    pub fn needs_layout(&self, size: DisplaySize) -> bool {
        self.laid_out_for != Some(size)
    }

    /// Place the eye quads for `size`. Returns `true` if anything moved.
    pub fn layout(&mut self, size: DisplaySize) -> bool {
        if !self.needs_layout(size) {
            return false;
        }
        let rects = eye_quad_rects(size);
        for eye in Eye::BOTH {
            if let Some(node) = self.root.get_mut(*self.eye_quads.get(eye)) {
                node.rect = *rects.get(eye);
            }
        }
        self.laid_out_for = Some(size);
        log::debug!("eye quads laid out for {}x{}", size.width, size.height);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn quads_split_the_display_in_half() {
        let mut overlay = OverlayLayer::new();
        overlay.layout(DisplaySize::new(1024, 768));

        let left = overlay.eye_quad(Eye::Left).unwrap().rect;
        let right = overlay.eye_quad(Eye::Right).unwrap().rect;
        assert_eq!(left.size(), Vec2::new(512.0, 768.0));
        assert_eq!(right.size(), Vec2::new(512.0, 768.0));
        assert_eq!(left.center(), Vec2::new(256.0, 384.0));
        assert_eq!(right.center(), Vec2::new(768.0, 384.0));
        assert_eq!(left.right(), right.x);
    }

    #[test]
    fn odd_widths_leave_no_gap() {
        let rects = eye_quad_rects(DisplaySize::new(801, 600));
        assert_eq!(rects.left.right(), rects.right.x);
        assert_eq!(rects.right.right(), 801.0);
        assert_eq!(rects.left.width, 400.5);
    }

    #[test]
    fn layout_is_skipped_when_size_unchanged() {
        let mut overlay = OverlayLayer::new();
        let size = DisplaySize::new(800, 600);
        assert!(overlay.needs_layout(size));
        assert!(overlay.layout(size));
        assert!(!overlay.needs_layout(size));
        assert!(!overlay.layout(size));
        assert!(overlay.needs_layout(DisplaySize::new(1024, 768)));
    }

    #[test]
    fn hud_nodes_draw_above_eye_quads() {
        let mut overlay = OverlayLayer::new();
        let badge = overlay
            .root_mut()
            .add(OverlayNode::hud(Rect::new(8.0, 8.0, 64.0, 16.0), Color::RED));
        let backdrop = overlay
            .root_mut()
            .add(OverlayNode::solid(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE));

        let order = overlay.root().draw_order();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], overlay.root().get(backdrop).unwrap());
        assert_eq!(order[1].fill, OverlayFill::EyeTexture(Eye::Left));
        assert_eq!(order[2].fill, OverlayFill::EyeTexture(Eye::Right));
        assert_eq!(order[3], overlay.root().get(badge).unwrap());
        assert_eq!(order[3].layer, HUD_LAYER);
    }

    #[test]
    fn camera_is_orthographic() {
        let overlay = OverlayLayer::new();
        assert_eq!(
            overlay.camera().projection,
            crate::camera::Projection::Orthographic {
                near: OVERLAY_NEAR,
                far: OVERLAY_FAR
            }
        );
    }
}
