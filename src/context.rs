use std::time::Instant;

use futures::channel::oneshot;
use winit::keyboard::KeyCode;

use crate::camera::Camera;
use crate::config::StereoConfig;
use crate::controller::RigController;
use crate::error::StereoResult;
use crate::follow::{CameraFollow, RigidBodyHandle};
use crate::overlay::OverlayLayer;
use crate::render_graph::{CompositeRenderer, RenderEngine};
use crate::rig::{AttachOutcome, CameraPair, StereoCameraRig};

/// Everything the render loop needs for stereo output, owned in one place.
///
/// Generic over the engine's target type so the same context runs against
/// the GPU or a [`RecordingEngine`](crate::render_graph::RecordingEngine).
pub struct StereoContext<T> {
    rig: StereoCameraRig,
    controller: RigController,
    compositor: CompositeRenderer<T>,
    main_camera: Camera,
    follow: Option<CameraFollow>,
}

impl<T> StereoContext<T> {
    /// Build a context from a validated config.
    ///
    /// `cameras` resolves once the scene has created the eye cameras.
    pub fn new(
        config: &StereoConfig,
        cameras: oneshot::Receiver<CameraPair>,
    ) -> StereoResult<Self> {
        config.validate()?;
        Ok(Self {
            rig: config.build_rig(),
            controller: RigController::new(cameras, config.step, config.poll_interval),
            compositor: CompositeRenderer::new(),
            main_camera: config.main_camera(),
            follow: None,
        })
    }

    pub fn rig(&self) -> &StereoCameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut StereoCameraRig {
        &mut self.rig
    }

    pub fn compositor(&self) -> &CompositeRenderer<T> {
        &self.compositor
    }

    pub fn overlay(&self) -> &OverlayLayer {
        self.compositor.overlay()
    }

    pub fn overlay_mut(&mut self) -> &mut OverlayLayer {
        self.compositor.overlay_mut()
    }

    pub fn main_camera(&self) -> &Camera {
        &self.main_camera
    }

    pub fn main_camera_mut(&mut self) -> &mut Camera {
        &mut self.main_camera
    }

    pub fn is_attached(&self) -> bool {
        self.rig.is_attached()
    }

    /// Attach cameras directly, bypassing the readiness channel.
    pub fn attach(
        &mut self,
        left: Option<Camera>,
        right: Option<Camera>,
    ) -> StereoResult<AttachOutcome> {
        self.rig.attach(left, right)
    }

    /// Translate the rig along its local X and Z axes.
    pub fn move_rig(&mut self, dx: f32, dz: f32) {
        self.rig.move_local(dx, dz);
    }

    /// Apply a key press to the rig.
    pub fn on_key_down(&mut self, key: KeyCode) -> bool {
        self.controller.on_key_down(&mut self.rig, key)
    }

    /// Have the main camera track a physics body.
    pub fn set_follow_target(&mut self, body: Box<dyn RigidBodyHandle>) {
        self.follow = Some(CameraFollow::new(body));
    }

    pub fn follow_mut(&mut self) -> Option<&mut CameraFollow> {
        self.follow.as_mut()
    }

    /// Per-frame update: poll for cameras, then follow the body if any.
    pub fn tick(&mut self, now: Instant) {
        self.controller.tick(&mut self.rig, now);
        if let Some(follow) = &self.follow {
            follow.update(&mut self.main_camera);
        }
    }

    pub fn render_frame<E>(&mut self, engine: &mut E)
    where
        E: RenderEngine<Target = T>,
    {
        self.compositor.render_frame(engine, &self.rig, &self.main_camera);
    }
}
