//! Window, event loop and the continuous stereo frame loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::AppConfig;
use crate::context::StereoContext;
use crate::depth::{DepthConfig, DepthPreview, horizontal_fov};
use crate::error::{StereoError, StereoResult};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::orbit::OrbitControls;
use crate::render_graph::{EyeReadback, FrameStatus, RenderTarget, Renderer};
use crate::rig::Eye;
use crate::scene::DemoScene;
use crate::stats::{FrameStats, StatsPanel};
use crate::ui::Color;

/// Tint drawn over both eyes while the eye debug view is on.
const EYE_DEBUG_TINT: Color = Color::rgb(0.9, 0.2, 0.6);

/// How often the eye targets are read back while the depth preview shows.
const DEPTH_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

const TITLE_INTERVAL: Duration = Duration::from_millis(500);

/// Depth preview grid: 48x27 blocks of 4 px, drawn 4 px per block.
const DEPTH_PREVIEW: DepthConfig = DepthConfig {
    width: 192,
    height: 108,
    window: 4,
    baseline_mm: 100.0,
    fov_degrees: 70.0,
};
const DEPTH_CELL_PX: f32 = 4.0;

/// Millimetres per scene unit of camera baseline.
const MM_PER_UNIT: f32 = 1000.0;

/// Open a window and render the demo scene in stereo until it is closed.
///
/// # Example
/// ```no_run
/// use stereograph::{AppConfig, StereoConfig};
///
/// stereograph::run(
///     AppConfig::new()
///         .title("Stereo")
///         .size(1280, 720)
///         .stereo(StereoConfig::new().baseline(6.0)),
/// )
/// .unwrap();
/// ```
pub fn run(config: AppConfig) -> StereoResult<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = StereoApp {
        state: AppState::Pending { config },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    demo: DemoScene,
    context: StereoContext<RenderTarget>,
    input: Input,
    orbit: OrbitControls,
    stats: FrameStats,
    stats_panel: Option<StatsPanel>,
    depth: Option<DepthPreview>,
    readback: EyeReadback,
    next_depth_sample: Instant,
    next_title: Instant,
    title: String,
    baseline: f32,
    eye_fov_degrees: f32,
    eye_debug: bool,
}

enum AppState {
    Pending { config: AppConfig },
    Running(Box<Running>),
}

struct StereoApp {
    state: AppState,
    error: Option<StereoError>,
}

impl StereoApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: StereoError) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig) -> StereoResult<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let renderer = Renderer::new(&gpu);

        let (cameras_tx, cameras_rx) = oneshot::channel();
        let mut context = StereoContext::new(&config.stereo, cameras_rx)?;
        let demo = DemoScene::build(&config.stereo, cameras_tx);

        let orbit = OrbitControls::from_camera(
            &config.stereo.main_camera(),
            config.stereo.main_camera_target,
        );
        let stats_panel = config
            .show_stats
            .then(|| StatsPanel::attach(context.overlay_mut(), Vec2::new(10.0, 10.0)));
        let mut depth = DepthPreview::attach(
            context.overlay_mut(),
            DEPTH_PREVIEW,
            Vec2::new(10.0, 60.0),
            DEPTH_CELL_PX,
        )?;
        if config.depth_preview {
            depth.show(context.overlay_mut());
        }

        log::info!(
            "stereo view ready: {}x{}, baseline {}",
            gpu.width(),
            gpu.height(),
            config.stereo.baseline
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            demo,
            context,
            input: Input::new(),
            orbit,
            stats: FrameStats::new(),
            stats_panel,
            depth: Some(depth),
            readback: EyeReadback::new(),
            next_depth_sample: Instant::now(),
            next_title: Instant::now(),
            title: config.title.clone(),
            baseline: config.stereo.baseline,
            eye_fov_degrees: config.stereo.eye_fov_degrees,
            eye_debug: false,
        })
    }

    fn redraw(&mut self) -> StereoResult<()> {
        let now = Instant::now();
        self.stats.record(now);

        for key in self.input.drain_presses() {
            match key {
                KeyCode::F1 => {
                    self.eye_debug = !self.eye_debug;
                    self.renderer
                        .set_override_material(self.eye_debug.then_some(EYE_DEBUG_TINT));
                    log::info!("eye debug tint {}", if self.eye_debug { "on" } else { "off" });
                }
                KeyCode::F2 => {
                    if let Some(depth) = self.depth.as_mut() {
                        let overlay = self.context.overlay_mut();
                        if depth.is_visible() {
                            depth.hide(overlay);
                        } else {
                            depth.show(overlay);
                        }
                        log::info!("depth preview {}", if depth.is_visible() { "on" } else { "off" });
                    }
                }
                _ => {
                    self.context.on_key_down(key);
                }
            }
        }

        if self.orbit.update(&self.input) {
            self.orbit.apply(self.context.main_camera_mut());
        }
        self.input.end_frame();

        self.context.tick(now);
        self.demo.track_rig(self.context.rig().position());
        if let Some(panel) = &self.stats_panel {
            panel.update(self.context.overlay_mut(), &self.stats);
        }

        match self.renderer.begin_frame(&self.gpu, &self.demo.scene)? {
            FrameStatus::Ready(mut frame) => {
                self.context.render_frame(&mut frame);
                frame.finish();
            }
            FrameStatus::Skipped => {}
        }

        self.sample_depth(now);
        if now >= self.next_title {
            self.next_title = now + TITLE_INTERVAL;
            self.window
                .set_title(&format!("{} | {:.0} fps", self.title, self.stats.average_fps()));
        }

        self.window.request_redraw();
        Ok(())
    }

    /// Refresh the depth preview from the eye targets, at most once per
    /// [`DEPTH_SAMPLE_INTERVAL`]. A failure turns the preview off for good.
    fn sample_depth(&mut self, now: Instant) {
        let visible = self.depth.as_ref().is_some_and(DepthPreview::is_visible);
        if !visible || now < self.next_depth_sample {
            return;
        }
        self.next_depth_sample = now + DEPTH_SAMPLE_INTERVAL;

        if let Err(err) = self.update_depth() {
            log::warn!("depth preview disabled: {err}");
            if let Some(mut depth) = self.depth.take() {
                depth.hide(self.context.overlay_mut());
            }
        }
    }

    fn update_depth(&mut self) -> StereoResult<()> {
        let Some(targets) = self.context.compositor().pool().targets() else {
            return Ok(());
        };
        let size = targets.get(Eye::Left).size();
        let pixels = self.readback.read(&self.gpu, targets)?;

        let Some(depth) = self.depth.as_mut() else {
            return Ok(());
        };
        let fov = horizontal_fov(self.eye_fov_degrees, size.aspect());
        depth.retune(self.baseline * MM_PER_UNIT, fov)?;
        let map = depth.update_from_rgba(
            self.context.overlay_mut(),
            pixels.as_ref().map(Vec::as_slice),
            size,
        )?;
        log::debug!(
            "depth map {}x{}, nearest {:.0} mm",
            map.width,
            map.height,
            map.depth_mm.iter().copied().fold(map.max_depth_mm, f32::min)
        );
        Ok(())
    }
}

impl ApplicationHandler for StereoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = &self.state else {
            return;
        };
        match Running::start(event_loop, config) {
            Ok(running) => {
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { .. } if running.input.key_down(KeyCode::Escape) => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = running.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }
}
