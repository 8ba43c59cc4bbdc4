//! # Stereograph
//!
//! **Side-by-side stereoscopic rendering on wgpu.**
//!
//! One scene is rendered from two horizontally offset eye cameras into two
//! off-screen targets. Both are then shown side by side on the display as
//! overlay quads, on top of the ordinary single-camera view.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stereograph::{AppConfig, StereoConfig, run};
//!
//! fn main() -> stereograph::StereoResult<()> {
//!     run(AppConfig::new().stereo(StereoConfig::new().baseline(6.0)))
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`StereoCameraRig`] carries the two eye cameras, half the baseline to
//!   either side of its origin.
//! - [`RigController`] attaches the cameras once they exist and moves the rig
//!   one step per key press.
//! - [`CompositeRenderer`] runs the per-frame sequence against any
//!   [`RenderEngine`](render_graph::RenderEngine).
//! - [`StereoContext`] owns all of the above for the render loop.
//! - [`OrbitControls`] turns mouse drags and scrolling into main camera motion.
//! - [`depth`] estimates per-block depth from the two eye images.

mod app;
mod camera;
mod config;
mod context;
mod controller;
pub mod depth;
mod error;
mod follow;
mod gpu;
mod input;
mod logging;
mod mesh;
mod orbit;
mod overlay;
pub mod render_graph;
mod rig;
pub mod scene;
mod stats;
mod ui;

pub use app::run;
pub use camera::{Camera, Projection};
pub use config::{AppConfig, StereoConfig};
pub use context::StereoContext;
pub use controller::{RigCommand, RigController};
pub use error::{StereoError, StereoResult};
pub use follow::{CameraFollow, RigidBodyHandle};
pub use gpu::GpuContext;
pub use input::Input;
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Mesh, MeshData, Transform, Vertex3d};
pub use orbit::OrbitControls;
pub use overlay::{
    DEFAULT_LAYER, EYE_QUAD_LAYER, HUD_LAYER, OverlayFill, OverlayLayer, OverlayNode, OverlayNodeId,
    OverlayScene, eye_quad_rects,
};
pub use render_graph::{CompositeRenderer, DisplaySize, FrameBufferPool};
pub use rig::{AttachOutcome, CameraPair, Eye, EyePair, StereoCameraRig};
pub use scene::{DemoScene, MainScene};
pub use stats::{FrameStats, STATS_HISTORY, StatsPanel};
pub use ui::{Color, Rect};

// Re-export glam math types for convenience
pub use glam::{Quat, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
