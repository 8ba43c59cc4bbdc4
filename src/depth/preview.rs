use glam::{UVec2, Vec2};

use super::estimator::{DepthConfig, DepthEstimator, DepthMap, DepthResult};
use super::pixel::{resample_rgba8, rgba8_to_rgb565};
use crate::overlay::{OverlayFill, OverlayLayer, OverlayNode, OverlayNodeId};
use crate::render_graph::DisplaySize;
use crate::rig::{Eye, EyePair};
use crate::ui::{Color, Rect};

/// Horizontal fov in degrees for a vertical fov and aspect ratio.
pub fn horizontal_fov(vertical_degrees: f32, aspect: f32) -> f32 {
    let half = (vertical_degrees.to_radians() * 0.5).tan() * aspect;
    (2.0 * half.atan()).to_degrees()
}

/// Color of one depth cell: black at max depth, brighter green further away.
pub fn depth_color(map: &DepthMap, x: u32, y: u32) -> Color {
    match map.depth_at(x, y) {
        Some(depth) if depth < map.max_depth_mm => {
            Color::rgb(0.0, (depth / map.max_depth_mm).clamp(0.0, 1.0), 0.0)
        }
        _ => Color::rgb(0.0, 0.0, 0.0),
    }
}

/// A depth map of the two eye images, drawn as a grid of HUD cells.
pub struct DepthPreview {
    estimator: DepthEstimator,
    origin: Vec2,
    cell_px: f32,
    cells: Vec<OverlayNodeId>,
    visible: bool,
    last: Option<DepthMap>,
}

impl DepthPreview {
    /// Add one hidden HUD node per depth cell to `overlay`.
    pub fn attach(
        overlay: &mut OverlayLayer,
        config: DepthConfig,
        origin: Vec2,
        cell_px: f32,
    ) -> DepthResult<Self> {
        let estimator = DepthEstimator::new(config)?;
        let grid = config.cells();
        let root = overlay.root_mut();
        let hidden = OverlayNode::hud(Rect::new(0.0, 0.0, 0.0, 0.0), Color::rgb(0.0, 0.0, 0.0));
        let cells = (0..grid.x * grid.y).map(|_| root.add(hidden)).collect();
        Ok(Self {
            estimator,
            origin,
            cell_px,
            cells,
            visible: false,
            last: None,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn last_map(&self) -> Option<&DepthMap> {
        self.last.as_ref()
    }

    pub fn estimator(&self) -> &DepthEstimator {
        &self.estimator
    }

    /// Match the estimator's geometry to the eye cameras.
    pub fn retune(&mut self, baseline_mm: f32, fov_degrees: f32) -> DepthResult<()> {
        self.estimator.retune(baseline_mm, fov_degrees)
    }

    pub fn show(&mut self, overlay: &mut OverlayLayer) {
        self.visible = true;
        if let Some(map) = self.last.take() {
            self.paint(overlay, &map);
            self.last = Some(map);
        }
    }

    /// Collapse every cell to zero size.
    pub fn hide(&mut self, overlay: &mut OverlayLayer) {
        self.visible = false;
        let root = overlay.root_mut();
        for id in &self.cells {
            if let Some(node) = root.get_mut(*id) {
                node.rect = Rect::new(0.0, 0.0, 0.0, 0.0);
            }
        }
    }

    /// Estimate depth from a pair of RGBA8 eye images of size `source` and
    /// repaint the grid if visible.
    pub fn update_from_rgba(
        &mut self,
        overlay: &mut OverlayLayer,
        eyes: EyePair<&[u8]>,
        source: DisplaySize,
    ) -> DepthResult<&DepthMap> {
        let config = self.estimator.config();
        let from = UVec2::new(source.width, source.height);
        let to = UVec2::new(config.width, config.height);
        let frames = eyes.map(|rgba| rgba8_to_rgb565(&resample_rgba8(rgba, from, to)));

        let map = self
            .estimator
            .process_rgb565(frames.get(Eye::Left), frames.get(Eye::Right))?;
        if self.visible {
            self.paint(overlay, &map);
        }
        Ok(self.last.insert(map))
    }

    fn paint(&self, overlay: &mut OverlayLayer, map: &DepthMap) {
        let root = overlay.root_mut();
        for (i, id) in self.cells.iter().enumerate() {
            let Some(node) = root.get_mut(*id) else {
                continue;
            };
            let x = i as u32 % map.width;
            let y = i as u32 / map.width;
            node.rect = Rect::new(
                self.origin.x + x as f32 * self.cell_px,
                self.origin.y + y as f32 * self.cell_px,
                self.cell_px,
                self.cell_px,
            );
            node.fill = OverlayFill::Solid(depth_color(map, x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::HUD_LAYER;

    fn preview(overlay: &mut OverlayLayer) -> DepthPreview {
        let config = DepthConfig::new().size(8, 4).window(4);
        DepthPreview::attach(overlay, config, Vec2::new(20.0, 100.0), 5.0).unwrap()
    }

    fn visible_cells(overlay: &OverlayLayer) -> Vec<&OverlayNode> {
        overlay
            .root()
            .draw_order()
            .into_iter()
            .filter(|node| node.layer == HUD_LAYER && node.rect.width > 0.0)
            .collect()
    }

    #[test]
    fn horizontal_fov_widens_with_aspect() {
        assert!((horizontal_fov(90.0, 1.0) - 90.0).abs() < 1e-3);
        assert!(horizontal_fov(75.0, 16.0 / 9.0) > 75.0);
        assert!(horizontal_fov(75.0, 0.5) < 75.0);
    }

    #[test]
    fn cells_stay_hidden_until_shown() {
        let mut overlay = OverlayLayer::new();
        let mut preview = preview(&mut overlay);
        let gray = vec![128u8; 16 * 8 * 4];
        let eyes = EyePair::new(gray.as_slice(), gray.as_slice());

        preview
            .update_from_rgba(&mut overlay, eyes, DisplaySize::new(16, 8))
            .unwrap();
        assert!(visible_cells(&overlay).is_empty());

        preview.show(&mut overlay);
        let cells = visible_cells(&overlay);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].rect, Rect::new(20.0, 100.0, 5.0, 5.0));
        assert_eq!(cells[1].rect, Rect::new(25.0, 100.0, 5.0, 5.0));
        // Flat images have no disparity, so everything is at max depth.
        assert!(matches!(cells[0].fill, OverlayFill::Solid(c) if c == Color::rgb(0.0, 0.0, 0.0)));

        preview.hide(&mut overlay);
        assert!(visible_cells(&overlay).is_empty());
        assert!(preview.last_map().is_some());
    }

    #[test]
    fn nearer_blocks_are_darker() {
        let map = DepthMap {
            width: 2,
            height: 1,
            disparity: vec![4, 2],
            depth_mm: vec![250.0, 500.0],
            max_depth_mm: 1000.0,
        };
        assert_eq!(depth_color(&map, 0, 0), Color::rgb(0.0, 0.25, 0.0));
        assert_eq!(depth_color(&map, 1, 0), Color::rgb(0.0, 0.5, 0.0));
        assert_eq!(depth_color(&map, 2, 0), Color::rgb(0.0, 0.0, 0.0));
    }

    #[test]
    fn retune_keeps_the_grid() {
        let mut overlay = OverlayLayer::new();
        let mut preview = preview(&mut overlay);
        preview.retune(60.0, 90.0).unwrap();
        assert_eq!(preview.estimator().config().cells(), UVec2::new(2, 1));
        assert!(preview.retune(-1.0, 90.0).is_err());
        assert_eq!(preview.estimator().config().baseline_mm, 60.0);
    }
}
