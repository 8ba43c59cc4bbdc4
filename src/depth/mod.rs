//! Block-matching depth estimation from a stereo image pair.
//!
//! Each eye image is reduced to RGB565, converted to grayscale and split into
//! square blocks. For every block of the left image the best matching block in
//! the right image is searched along the same row, to the left only. The
//! horizontal shift is the disparity, and depth follows from the focal length
//! and camera baseline.
//!
//! ```
//! use stereograph::depth::{DepthConfig, DepthEstimator};
//!
//! let config = DepthConfig::new().size(16, 8).window(4);
//! let mut estimator = DepthEstimator::new(config).unwrap();
//! let frame = vec![0u16; 16 * 8];
//! let map = estimator.process_rgb565(&frame, &frame).unwrap();
//! assert_eq!((map.width, map.height), (4, 2));
//! ```

mod compare;
mod estimator;
mod pixel;
mod preview;

pub use compare::{BlockComparer, SumOfAbsoluteDifferences};
pub use estimator::{
    DepthConfig, DepthError, DepthEstimator, DepthMap, DepthObserver, DepthResult,
};
pub use pixel::{GrayFrame, pack_rgb565, resample_rgba8, rgb565_luminance, rgba8_to_rgb565};
pub use preview::{DepthPreview, depth_color, horizontal_fov};
