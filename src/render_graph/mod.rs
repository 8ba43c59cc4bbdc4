//! Stereo render pipeline.
//!
//! The compositor drives any [`RenderEngine`]. Two engines ship with the crate:
//! [`WgpuFrame`] renders for real, one frame at a time, and
//! [`RecordingEngine`] only records the calls it receives.
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Left eye │──▶│Right eye │──▶│ Main view│──▶│ Overlay  │
//! │ (target) │   │ (target) │   │ (display)│   │ (display)│
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!       │              │                            ▲
//!       └──────────────┴──── sampled by eye quads ──┘
//! ```
//!
//! # Example
//!
//! ```
//! use stereograph::render_graph::{CompositeRenderer, DisplaySize, RecordingEngine};
//! use stereograph::{Camera, StereoCameraRig, Vec3};
//!
//! let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
//! let mut compositor = CompositeRenderer::new();
//! let rig = StereoCameraRig::new(10.0, Vec3::ZERO);
//!
//! compositor.render_frame(&mut engine, &rig, &Camera::new());
//! assert_eq!(engine.allocations(), 2);
//! ```

mod composite;
mod engine;
mod overlay_pass;
mod readback;
pub mod recording;
mod render_target;
mod scene_pass;
mod wgpu_engine;

pub use composite::CompositeRenderer;
pub use engine::{DisplaySize, RenderEngine};
pub use overlay_pass::OverlayPass;
pub use readback::{EyeReadback, padded_bytes_per_row, unpad_rows};
pub use recording::{RecordingEngine, RecordingTarget, RenderOp};
pub use render_target::{DEPTH_FORMAT, EYE_TARGET_FORMAT, FrameBufferPool, RenderTarget};
pub use scene_pass::ScenePass;
pub use wgpu_engine::{FrameStatus, Renderer, WgpuFrame};
