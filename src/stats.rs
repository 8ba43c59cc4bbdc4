//! Frame timing and the on-screen FPS panel.

use std::collections::VecDeque;
use std::time::Instant;

use glam::Vec2;

use crate::overlay::{OverlayLayer, OverlayNode, OverlayNodeId};
use crate::ui::{Color, Rect};

/// Number of frames kept for the history graph and the average.
pub const STATS_HISTORY: usize = 60;

/// Frame times of the most recent frames.
#[derive(Clone, Debug, Default)]
pub struct FrameStats {
    last: Option<Instant>,
    dt: f32,
    history: VecDeque<f32>,
    frames: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a frame at `now`.
    pub fn record(&mut self, now: Instant) {
        if let Some(last) = self.last {
            self.dt = now.saturating_duration_since(last).as_secs_f32();
            if self.history.len() == STATS_HISTORY {
                self.history.pop_front();
            }
            self.history.push_back(self.dt);
        }
        self.last = Some(now);
        self.frames += 1;
    }

    /// Seconds between the last two frames.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Current frames per second.
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    /// Frames per second over the kept history.
    pub fn average_fps(&self) -> f32 {
        let total: f32 = self.history.iter().sum();
        if total > 0.0 {
            self.history.len() as f32 / total
        } else {
            0.0
        }
    }

    /// Frame times, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

const PANEL_BACKGROUND: Color = Color::rgba(0.0, 0.0, 0.13, 0.85);
const BAR_COLOR: Color = Color::rgb(0.0, 1.0, 1.0);
const BAR_WIDTH: f32 = 1.0;
const PADDING: f32 = 3.0;

/// A small FPS graph in the top-left corner of the overlay.
///
/// One bar per recorded frame, tallest at `max_fps`, newest on the right.
pub struct StatsPanel {
    origin: Vec2,
    graph_height: f32,
    max_fps: f32,
    background: OverlayNodeId,
    bars: Vec<OverlayNodeId>,
}

impl StatsPanel {
    /// Add the panel's nodes to `overlay` above the eye quads.
    pub fn attach(overlay: &mut OverlayLayer, origin: Vec2) -> Self {
        let graph_height = 30.0;
        let size = Vec2::new(
            STATS_HISTORY as f32 * BAR_WIDTH + 2.0 * PADDING,
            graph_height + 2.0 * PADDING,
        );
        let root = overlay.root_mut();
        let background = root.add(OverlayNode::hud(
            Rect::new(origin.x, origin.y, size.x, size.y),
            PANEL_BACKGROUND,
        ));
        let bars = (0..STATS_HISTORY)
            .map(|_| root.add(OverlayNode::hud(Rect::new(0.0, 0.0, 0.0, 0.0), BAR_COLOR)))
            .collect();
        Self {
            origin,
            graph_height,
            max_fps: 120.0,
            background,
            bars,
        }
    }

    pub fn max_fps(mut self, max_fps: f32) -> Self {
        self.max_fps = max_fps.max(1.0);
        self
    }

    pub fn background(&self) -> OverlayNodeId {
        self.background
    }

    /// Resize the bars to match `stats`.
    pub fn update(&self, overlay: &mut OverlayLayer, stats: &FrameStats) {
        let root = overlay.root_mut();
        let times: Vec<f32> = stats.history().collect();
        let skip = self.bars.len() - times.len().min(self.bars.len());
        let bottom = self.origin.y + PADDING + self.graph_height;

        for (slot, id) in self.bars.iter().enumerate() {
            let Some(node) = root.get_mut(*id) else {
                continue;
            };
            let height = slot
                .checked_sub(skip)
                .and_then(|i| times.get(i))
                .map(|&dt| {
                    let fps = if dt > 0.0 { 1.0 / dt } else { 0.0 };
                    (fps / self.max_fps).clamp(0.0, 1.0) * self.graph_height
                })
                .unwrap_or(0.0);
            let x = self.origin.x + PADDING + slot as f32 * BAR_WIDTH;
            node.rect = Rect::new(x, bottom - height, BAR_WIDTH, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{HUD_LAYER, OverlayFill};
    use std::time::Duration;

    #[test]
    fn fps_follows_frame_time() {
        let start = Instant::now();
        let mut stats = FrameStats::new();
        stats.record(start);
        assert_eq!(stats.fps(), 0.0);

        stats.record(start + Duration::from_millis(20));
        assert!((stats.fps() - 50.0).abs() < 0.01);

        stats.record(start + Duration::from_millis(30));
        assert!((stats.fps() - 100.0).abs() < 0.01);
        assert!((stats.average_fps() - 2.0 / 0.03).abs() < 0.01);
        assert_eq!(stats.frames(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let start = Instant::now();
        let mut stats = FrameStats::new();
        for i in 0..(STATS_HISTORY as u64 + 10) {
            stats.record(start + Duration::from_millis(16 * i));
        }
        assert_eq!(stats.history().len(), STATS_HISTORY);
    }

    #[test]
    fn bars_grow_from_the_right_on_the_hud_layer() {
        let mut overlay = OverlayLayer::new();
        let panel = StatsPanel::attach(&mut overlay, Vec2::new(10.0, 10.0)).max_fps(100.0);

        let start = Instant::now();
        let mut stats = FrameStats::new();
        stats.record(start);
        stats.record(start + Duration::from_millis(20));
        panel.update(&mut overlay, &stats);

        let hud: Vec<_> = overlay
            .root()
            .draw_order()
            .into_iter()
            .filter(|node| node.layer == HUD_LAYER)
            .collect();
        assert_eq!(hud.len(), STATS_HISTORY + 1);
        assert!(matches!(hud[0].fill, OverlayFill::Solid(_)));

        let last = hud[STATS_HISTORY];
        assert!((last.rect.height - 15.0).abs() < 1e-3);
        assert_eq!(last.rect.bottom(), 10.0 + PADDING + 30.0);
        assert_eq!(hud[1].rect.height, 0.0);
    }
}
