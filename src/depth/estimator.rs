use glam::UVec2;

use super::compare::{BlockComparer, SumOfAbsoluteDifferences};
use super::pixel::GrayFrame;
use crate::rig::{Eye, EyePair};

pub type DepthResult<T> = Result<T, DepthError>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DepthError {
    #[error("invalid depth configuration: {0}")]
    InvalidConfig(String),

    /// More bytes arrived for one eye than a frame holds. That eye's buffer
    /// was discarded.
    #[error("{eye:?} eye overflowed: {received} bytes for a {capacity}-byte frame")]
    FeedOverflow {
        eye: Eye,
        received: usize,
        capacity: usize,
    },

    #[error("frame has {got} pixels, expected {expected}")]
    FrameSize { expected: usize, got: usize },
}

/// Camera geometry and block size for [`DepthEstimator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthConfig {
    pub width: u32,
    pub height: u32,
    /// Side of the square block matched between the eyes, in pixels.
    pub window: u32,
    /// Distance between the two cameras in millimetres.
    pub baseline_mm: f32,
    /// Horizontal field of view of each camera in degrees.
    pub fov_degrees: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            window: 4,
            baseline_mm: 100.0,
            fov_degrees: 70.0,
        }
    }
}

impl DepthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    pub fn baseline_mm(mut self, baseline_mm: f32) -> Self {
        self.baseline_mm = baseline_mm;
        self
    }

    pub fn fov_degrees(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    pub fn validate(&self) -> DepthResult<()> {
        if self.window == 0 {
            return Err(DepthError::InvalidConfig("window must be non-zero".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(DepthError::InvalidConfig(format!(
                "frame size {}x{} has zero area",
                self.width, self.height
            )));
        }
        if self.width % self.window != 0 || self.height % self.window != 0 {
            return Err(DepthError::InvalidConfig(format!(
                "frame size {}x{} is not a multiple of window {}",
                self.width, self.height, self.window
            )));
        }
        if !(self.baseline_mm.is_finite() && self.baseline_mm > 0.0) {
            return Err(DepthError::InvalidConfig(format!(
                "baseline must be positive, got {}",
                self.baseline_mm
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(DepthError::InvalidConfig(format!(
                "fov must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        Ok(())
    }

    /// Focal length in pixels for the horizontal fov.
    pub fn focal_length_px(&self) -> f32 {
        (self.width as f32 * 0.5) / (self.fov_degrees.to_radians() * 0.5).tan()
    }

    /// Depth reported for blocks with no usable disparity.
    pub fn max_depth_mm(&self) -> f32 {
        self.focal_length_px() * self.baseline_mm
    }

    /// Number of blocks across and down.
    pub fn cells(&self) -> UVec2 {
        UVec2::new(self.width / self.window, self.height / self.window)
    }

    /// Bytes in one RGB565 frame.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }

    fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Per-block disparity and depth for one stereo pair.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    /// Blocks across.
    pub width: u32,
    /// Blocks down.
    pub height: u32,
    /// Horizontal shift in pixels, row-major.
    pub disparity: Vec<u32>,
    /// Depth in millimetres, row-major.
    pub depth_mm: Vec<f32>,
    pub max_depth_mm: f32,
}

impl DepthMap {
    pub fn disparity_at(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.disparity[i])
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth_mm[i])
    }

    /// Depth scaled to `0..=1`, `1` at max depth.
    pub fn normalized_depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.depth_at(x, y)
            .map(|d| (d / self.max_depth_mm).clamp(0.0, 1.0))
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }
}

/// Receives the intermediate results of each processed pair.
pub trait DepthObserver: Send {
    fn on_grayscale(&mut self, _eye: Eye, _frame: &GrayFrame) {}
    fn on_disparity(&mut self, _map: &DepthMap) {}
    fn on_depth(&mut self, _map: &DepthMap) {}
}

/// Block-matching depth from a pair of RGB565 camera frames.
///
/// Frames can arrive whole through [`process_rgb565`](Self::process_rgb565)
/// or in byte chunks per eye through [`feed`](Self::feed).
pub struct DepthEstimator {
    config: DepthConfig,
    comparer: Box<dyn BlockComparer>,
    observer: Option<Box<dyn DepthObserver>>,
    pending: EyePair<Vec<u8>>,
}

impl DepthEstimator {
    pub fn new(config: DepthConfig) -> DepthResult<Self> {
        config.validate()?;
        let capacity = config.frame_bytes();
        Ok(Self {
            config,
            comparer: Box::new(SumOfAbsoluteDifferences),
            observer: None,
            pending: EyePair::from_fn(|_| Vec::with_capacity(capacity)),
        })
    }

    pub fn with_comparer(mut self, comparer: impl BlockComparer + 'static) -> Self {
        self.comparer = Box::new(comparer);
        self
    }

    pub fn set_observer(&mut self, observer: impl DepthObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn config(&self) -> &DepthConfig {
        &self.config
    }

    /// Change the camera geometry. Block size and frame size stay fixed.
    pub fn retune(&mut self, baseline_mm: f32, fov_degrees: f32) -> DepthResult<()> {
        let config = DepthConfig {
            baseline_mm,
            fov_degrees,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Bytes buffered for `eye` so far.
    pub fn pending(&self, eye: Eye) -> usize {
        self.pending.get(eye).len()
    }

    /// Append little-endian RGB565 bytes for one eye.
    ///
    /// Returns the depth map once both eyes hold a full frame, after which both
    /// buffers start over.
    pub fn feed(&mut self, eye: Eye, bytes: &[u8]) -> DepthResult<Option<DepthMap>> {
        let capacity = self.config.frame_bytes();
        let buffer = self.pending.get_mut(eye);
        let received = buffer.len() + bytes.len();
        if received > capacity {
            buffer.clear();
            log::warn!("{eye:?} eye depth input overflowed ({received} > {capacity} bytes)");
            return Err(DepthError::FeedOverflow {
                eye,
                received,
                capacity,
            });
        }
        buffer.extend_from_slice(bytes);

        let full = Eye::BOTH
            .iter()
            .all(|&eye| self.pending.get(eye).len() == capacity);
        if !full {
            return Ok(None);
        }

        let frames = self.pending.as_ref().map(|bytes| {
            bytes
                .chunks_exact(2)
                .map(|px| u16::from_le_bytes([px[0], px[1]]))
                .collect::<Vec<_>>()
        });
        for eye in Eye::BOTH {
            self.pending.get_mut(eye).clear();
        }
        self.process_rgb565(frames.get(Eye::Left), frames.get(Eye::Right))
            .map(Some)
    }

    /// Compute the depth map for a full pair of RGB565 frames.
    pub fn process_rgb565(&mut self, left: &[u16], right: &[u16]) -> DepthResult<DepthMap> {
        let expected = self.config.pixels();
        for frame in [left, right] {
            if frame.len() != expected {
                return Err(DepthError::FrameSize {
                    expected,
                    got: frame.len(),
                });
            }
        }

        let DepthConfig { width, height, .. } = self.config;
        let left = GrayFrame::from_rgb565(width, height, left);
        let right = GrayFrame::from_rgb565(width, height, right);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_grayscale(Eye::Left, &left);
            observer.on_grayscale(Eye::Right, &right);
        }

        let cells = self.config.cells();
        let mut disparity = Vec::with_capacity((cells.x * cells.y) as usize);
        for cy in 0..cells.y {
            for cx in 0..cells.x {
                let at = UVec2::new(cx, cy) * self.config.window;
                disparity.push(self.disparity_search(&left, &right, at));
            }
        }

        let max_depth_mm = self.config.max_depth_mm();
        let mut map = DepthMap {
            width: cells.x,
            height: cells.y,
            depth_mm: vec![max_depth_mm; disparity.len()],
            disparity,
            max_depth_mm,
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.on_disparity(&map);
        }

        map.depth_mm = map
            .disparity
            .iter()
            .map(|&d| self.depth_from_disparity(d))
            .collect();
        if let Some(observer) = self.observer.as_mut() {
            observer.on_depth(&map);
        }
        Ok(map)
    }

    /// Shift that best matches the left block at `at` in the right frame.
    ///
    /// Candidates run leftwards from `at.x` to the frame edge. Ties keep the
    /// smaller shift.
    pub fn disparity_search(&self, left: &GrayFrame, right: &GrayFrame, at: UVec2) -> u32 {
        let window = self.config.window;
        let mut best_x = at.x;
        let mut best_score = u64::MAX;
        for x in (0..=at.x).rev() {
            let score = self
                .comparer
                .compare(left, right, at, UVec2::new(x, at.y), window);
            if score < best_score {
                best_score = score;
                best_x = x;
            }
        }
        at.x - best_x
    }

    /// Depth in millimetres for a disparity in pixels.
    pub fn depth_from_disparity(&self, disparity: u32) -> f32 {
        if disparity == 0 || disparity >= self.config.width {
            self.config.max_depth_mm()
        } else {
            self.config.focal_length_px() * self.config.baseline_mm / disparity as f32
        }
    }
}
